use chrono::{DateTime, SecondsFormat, Utc};

/// A row in the `contacts` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated submission plus the request metadata stored alongside it.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub message: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Per-day aggregate returned by the metrics query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyContactMetric {
    /// Calendar date (UTC), `YYYY-MM-DD`.
    pub date: String,
    pub total_contacts: i64,
    pub unique_emails: i64,
    pub daily_count: i64,
}

/// Stored timestamp format: RFC 3339, UTC, millisecond precision, `Z`
/// suffix. Fixed width, so text order equals time order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap_or_else(|e: chrono::ParseError| {
        tracing::warn!(raw = %raw, error = %e, "failed to parse contact timestamp; using now");
        Utc::now()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_fixed_width_utc() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-09T07:05:00.000Z");
        assert_eq!(parse_timestamp("2024-03-09T07:05:00.000Z"), ts);
    }
}
