//! Pagination and filter query construction for the contact list.
//!
//! The list operation runs two statements over the same predicate: a
//! `COUNT(*)` and the paged `SELECT`. Both are built from one
//! [`FilterClause`]; the count statement binds exactly
//! [`FilterClause::params`], while the paged statement binds those params
//! followed by `LIMIT` and `OFFSET`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

use crate::entities::dao::format_timestamp;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

const CONTACT_COLUMNS: &str =
    "id, name, email, message, ip_address, user_agent, created_at, updated_at";

/// A resolved page request. `page` and `limit` are always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Interpret raw query values. Missing, non-numeric or non-positive
    /// values fall back to the defaults; `cap` clamps `limit` when set.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>, cap: Option<u32>) -> Self {
        let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
        let mut limit = parse_positive(limit).unwrap_or(DEFAULT_LIMIT);
        if let Some(cap) = cap {
            limit = limit.min(cap.max(1));
        }
        Self { page, limit }
    }

    /// Rows to skip. Saturates at `i64::MAX` for huge page/limit pairs,
    /// which simply yields an empty page.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1).saturating_mul(i64::from(self.limit))
    }

    /// `ceil(total / limit)`.
    pub fn total_pages(&self, total: i64) -> i64 {
        let limit = i64::from(self.limit);
        (total.max(0) + limit - 1) / limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|v| v.trim().parse::<u32>().ok()).filter(|v| *v > 0)
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {param}: {value:?} (expected YYYY-MM-DD or an RFC 3339 timestamp)")]
pub struct InvalidDateFilter {
    pub param: &'static str,
    pub value: String,
}

/// Optional list filters, combined by conjunction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
    /// Exact match on the stored (normalized) email.
    pub email: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Start,
    End,
}

impl ContactFilter {
    /// Build a filter from raw query values. Blank values are ignored.
    pub fn from_raw(
        email: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Self, InvalidDateFilter> {
        Ok(Self {
            email: non_blank(email).map(str::to_owned),
            start: non_blank(start_date)
                .map(|v| parse_bound("startDate", v, Bound::Start))
                .transpose()?,
            end: non_blank(end_date)
                .map(|v| parse_bound("endDate", v, Bound::End))
                .transpose()?,
        })
    }

    pub fn clause(&self) -> FilterClause {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(email) = &self.email {
            params.push(email.clone());
            conditions.push(format!("email = ?{}", params.len()));
        }
        if let Some(start) = self.start {
            params.push(format_timestamp(start));
            conditions.push(format!("created_at >= ?{}", params.len()));
        }
        if let Some(end) = self.end {
            params.push(format_timestamp(end));
            conditions.push(format!("created_at <= ?{}", params.len()));
        }

        let sql = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        FilterClause { sql, params }
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bound(param: &'static str, raw: &str, bound: Bound) -> Result<DateTime<Utc>, InvalidDateFilter> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| InvalidDateFilter {
        param,
        value: raw.to_owned(),
    })?;
    // A bare end date covers the whole day.
    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN),
    };
    Ok(date.and_time(time).and_utc())
}

/// A `WHERE` fragment (possibly empty) and its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    /// Leading-space `WHERE ...` fragment, or empty.
    pub sql: String,
    /// Values for `?1..?n`, in order.
    pub params: Vec<String>,
}

impl FilterClause {
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM contacts{}", self.sql)
    }

    /// Paged select. `LIMIT` and `OFFSET` take the two positions after the
    /// filter params.
    pub fn page_sql(&self) -> String {
        let n = self.params.len();
        format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts{} \
             ORDER BY created_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
            self.sql,
            n + 1,
            n + 2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_lenient_parsing() {
        assert_eq!(PageRequest::from_raw(None, None, None), PageRequest { page: 1, limit: 10 });
        assert_eq!(
            PageRequest::from_raw(Some("abc"), Some("0"), None),
            PageRequest { page: 1, limit: 10 }
        );
        assert_eq!(
            PageRequest::from_raw(Some("-2"), Some(" 25 "), None),
            PageRequest { page: 1, limit: 25 }
        );
    }

    #[test]
    fn limit_is_unbounded_unless_capped() {
        assert_eq!(PageRequest::from_raw(None, Some("5000"), None).limit, 5000);
        assert_eq!(PageRequest::from_raw(None, Some("5000"), Some(100)).limit, 100);
        assert_eq!(PageRequest::from_raw(None, Some("7"), Some(100)).limit, 7);
    }

    #[test]
    fn offset_and_total_pages() {
        let page = PageRequest { page: 2, limit: 10 };
        assert_eq!(page.offset(), 10);
        assert_eq!(page.total_pages(12), 2);
        assert_eq!(page.total_pages(10), 1);
        assert_eq!(page.total_pages(0), 0);
    }

    #[test]
    fn offset_saturates_for_extreme_pages() {
        let page = PageRequest::from_raw(Some("4294967295"), Some("4294967295"), None);
        assert_eq!(page, PageRequest { page: u32::MAX, limit: u32::MAX });
        assert_eq!(page.offset(), i64::MAX);
        assert_eq!(page.total_pages(12), 1);
    }

    #[test]
    fn no_filters_means_no_where_clause() {
        let clause = ContactFilter::default().clause();
        assert!(clause.params.is_empty());
        assert_eq!(clause.count_sql(), "SELECT COUNT(*) FROM contacts");
        assert!(clause.page_sql().ends_with("LIMIT ?1 OFFSET ?2"));
    }

    #[test]
    fn count_query_binds_only_filter_params() {
        let filter =
            ContactFilter::from_raw(Some("a@b.co"), Some("2024-01-01"), Some("2024-01-31")).unwrap();
        let clause = filter.clause();

        assert_eq!(
            clause.params,
            vec![
                "a@b.co".to_owned(),
                "2024-01-01T00:00:00.000Z".to_owned(),
                "2024-01-31T23:59:59.999Z".to_owned(),
            ]
        );
        assert_eq!(
            clause.count_sql(),
            "SELECT COUNT(*) FROM contacts WHERE email = ?1 AND created_at >= ?2 AND created_at <= ?3"
        );
        assert!(clause.page_sql().ends_with("LIMIT ?4 OFFSET ?5"));
    }

    #[test]
    fn filters_are_independent() {
        let clause = ContactFilter::from_raw(None, None, Some("2024-02-01T12:00:00+02:00"))
            .unwrap()
            .clause();
        assert_eq!(clause.sql, " WHERE created_at <= ?1");
        assert_eq!(clause.params, vec!["2024-02-01T10:00:00.000Z".to_owned()]);
    }

    #[test]
    fn blank_filters_are_ignored() {
        let filter = ContactFilter::from_raw(Some("  "), Some(""), None).unwrap();
        assert_eq!(filter, ContactFilter::default());
    }

    #[test]
    fn bad_dates_are_rejected() {
        let err = ContactFilter::from_raw(None, Some("yesterday"), None).unwrap_err();
        assert_eq!(err.param, "startDate");
        let err = ContactFilter::from_raw(None, None, Some("2024-13-01")).unwrap_err();
        assert_eq!(err.param, "endDate");
    }
}
