//! Contact store gateway.
//!
//! Sits between the HTTP handlers and [`ContactStore`]: runs validation
//! before any store interaction, enforces the delete credential, and maps
//! every store failure onto [`ServerError`] so raw driver errors never
//! reach a handler.

use chrono::{Duration, Utc};
use subtle::ConstantTimeEq;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::entities::query::{ContactFilter, PageRequest};
use crate::entities::{ContactRecord, ContactStore, DailyContactMetric, NewContact};
use crate::error::ServerError;
use crate::schemas::contact::{ContactCandidate, ListContactsQuery, Pagination};
use crate::validation;

/// Days covered by [`ContactGateway::metrics`].
pub const METRICS_WINDOW_DAYS: i64 = 30;

/// Request metadata persisted alongside a submission.
#[derive(Debug, Clone, Default)]
pub struct SubmissionMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContactPage {
    pub rows: Vec<ContactRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseHealth {
    Connected,
    Disconnected,
}

pub struct ContactGateway<'a, S> {
    store: &'a S,
    config: &'a Config,
}

impl<'a, S: ContactStore> ContactGateway<'a, S> {
    pub fn new(store: &'a S, config: &'a Config) -> Self {
        Self { store, config }
    }

    /// Validate and persist a submission.
    pub async fn create(
        &self,
        candidate: &ContactCandidate,
        meta: SubmissionMeta,
    ) -> Result<ContactRecord, ServerError> {
        let normalized = validation::validate(candidate).map_err(ServerError::Validation)?;
        let record = self
            .store
            .insert_contact(NewContact {
                name: normalized.name,
                email: normalized.email,
                message: normalized.message,
                ip_address: meta.ip_address,
                user_agent: meta.user_agent,
            })
            .await
            .map_err(|e| self.store_error("create", e))?;
        info!(contact_id = record.id, "contact created");
        Ok(record)
    }

    /// One page of contacts plus pagination totals.
    pub async fn list(&self, query: &ListContactsQuery) -> Result<ContactPage, ServerError> {
        let page = PageRequest::from_raw(
            query.page.as_deref(),
            query.limit.as_deref(),
            self.config.list_limit_cap,
        );
        let filter = ContactFilter::from_raw(
            query.email.as_deref(),
            query.start_date.as_deref(),
            query.end_date.as_deref(),
        )
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;

        let clause = filter.clause();
        let rows = self
            .store
            .list_contacts(&clause, page)
            .await
            .map_err(|e| self.store_error("list", e))?;
        let total = self
            .store
            .count_contacts(&clause)
            .await
            .map_err(|e| self.store_error("count", e))?;

        Ok(ContactPage {
            rows,
            pagination: Pagination {
                page: page.page,
                limit: page.limit,
                total,
                total_pages: page.total_pages(total),
            },
        })
    }

    pub async fn get(&self, raw_id: &str) -> Result<ContactRecord, ServerError> {
        let id = parse_id(raw_id)?;
        self.store
            .get_contact(id)
            .await
            .map_err(|e| self.store_error("get", e))?
            .ok_or_else(|| ServerError::NotFound("Contact not found".to_owned()))
    }

    /// Hard delete. In production the caller must present the admin key;
    /// the check happens before the store is touched.
    pub async fn delete(
        &self,
        raw_id: &str,
        credential: Option<&str>,
    ) -> Result<ContactRecord, ServerError> {
        if self.config.run_mode.is_production() && !self.credential_matches(credential) {
            warn!(contact_id = %raw_id, "delete rejected: missing or invalid admin key");
            return Err(ServerError::Unauthorized);
        }
        let id = parse_id(raw_id)?;
        let deleted = self
            .store
            .delete_contact(id)
            .await
            .map_err(|e| self.store_error("delete", e))?
            .ok_or_else(|| ServerError::NotFound("Contact not found".to_owned()))?;
        info!(contact_id = deleted.id, "contact deleted");
        Ok(deleted)
    }

    pub async fn health(&self) -> DatabaseHealth {
        match self.store.ping().await {
            Ok(()) => DatabaseHealth::Connected,
            Err(e) => {
                error!(error = %e, "health check failed");
                DatabaseHealth::Disconnected
            }
        }
    }

    /// Daily counts for the trailing [`METRICS_WINDOW_DAYS`] days.
    pub async fn metrics(&self) -> Result<Vec<DailyContactMetric>, ServerError> {
        let since = Utc::now() - Duration::days(METRICS_WINDOW_DAYS);
        self.store
            .daily_metrics(since)
            .await
            .map_err(|e| self.store_error("metrics", e))
    }

    fn credential_matches(&self, credential: Option<&str>) -> bool {
        match (self.config.admin_api_key.as_deref(), credential) {
            (Some(expected), Some(provided)) => {
                expected.as_bytes().ct_eq(provided.as_bytes()).into()
            }
            _ => false,
        }
    }

    fn store_error(&self, operation: &'static str, err: sqlx::Error) -> ServerError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                warn!(operation, error = %err, "uniqueness violation");
                return ServerError::Conflict("Contact already exists".to_owned());
            }
        }
        error!(operation, error = %err, "store operation failed");
        ServerError::StoreUnavailable {
            detail: self
                .config
                .run_mode
                .is_development()
                .then(|| err.to_string()),
        }
    }
}

fn parse_id(raw: &str) -> Result<i64, ServerError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ServerError::BadRequest("Invalid contact id".to_owned()))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::DateTime;

    use super::*;
    use crate::config::RunMode;
    use crate::entities::dao::format_timestamp;
    use crate::entities::query::FilterClause;
    use crate::entities::SqliteStore;

    /// Counts calls and fails every store operation.
    #[derive(Default)]
    struct RecordingStore {
        calls: AtomicUsize,
    }

    impl RecordingStore {
        fn touched(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn fail<T>(&self) -> Result<T, sqlx::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(sqlx::Error::PoolTimedOut)
        }
    }

    impl ContactStore for RecordingStore {
        async fn insert_contact(&self, _: NewContact) -> Result<ContactRecord, sqlx::Error> {
            self.fail()
        }
        async fn count_contacts(&self, _: &FilterClause) -> Result<i64, sqlx::Error> {
            self.fail()
        }
        async fn list_contacts(
            &self,
            _: &FilterClause,
            _: PageRequest,
        ) -> Result<Vec<ContactRecord>, sqlx::Error> {
            self.fail()
        }
        async fn get_contact(&self, _: i64) -> Result<Option<ContactRecord>, sqlx::Error> {
            self.fail()
        }
        async fn delete_contact(&self, _: i64) -> Result<Option<ContactRecord>, sqlx::Error> {
            self.fail()
        }
        async fn ping(&self) -> Result<(), sqlx::Error> {
            self.fail()
        }
        async fn daily_metrics(
            &self,
            _: DateTime<Utc>,
        ) -> Result<Vec<DailyContactMetric>, sqlx::Error> {
            self.fail()
        }
    }

    fn candidate(name: &str, email: &str, message: &str) -> ContactCandidate {
        ContactCandidate {
            name: Some(name.into()),
            email: Some(email.into()),
            message: Some(message.into()),
        }
    }

    fn production(admin_key: Option<&str>) -> Config {
        Config {
            run_mode: RunMode::Production,
            admin_api_key: admin_key.map(str::to_owned),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_same_fields() {
        let store = SqliteStore::in_memory().await;
        let config = Config::default();
        let gateway = ContactGateway::new(&store, &config);

        let created = gateway
            .create(&candidate("Ada", "  Foo@EXAMPLE.com ", "Hello, I have a question."), SubmissionMeta::default())
            .await
            .unwrap();
        assert_eq!(created.email, "foo@example.com");

        let fetched = gateway.get(&created.id.to_string()).await.unwrap();
        assert_eq!(fetched.name, created.name);
        assert_eq!(fetched.email, "foo@example.com");
        assert_eq!(fetched.message, created.message);
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn invalid_submission_never_reaches_store() {
        let store = RecordingStore::default();
        let config = Config::default();
        let gateway = ContactGateway::new(&store, &config);

        let err = gateway
            .create(&candidate("J", "bad", "short"), SubmissionMeta::default())
            .await
            .unwrap_err();
        match err {
            ServerError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(store.touched(), 0);
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let store = SqliteStore::in_memory().await;
        let config = Config::default();
        let gateway = ContactGateway::new(&store, &config);

        let mut ids = Vec::new();
        for i in 0..12 {
            let rec = gateway
                .create(
                    &candidate(&format!("Person {i}"), &format!("p{i}@example.com"), "A message of decent length"),
                    SubmissionMeta::default(),
                )
                .await
                .unwrap();
            sqlx::query("UPDATE contacts SET created_at = ?1 WHERE id = ?2")
                .bind(format!("2024-01-{:02}T08:00:00.000Z", i + 1))
                .bind(rec.id)
                .execute(store.pool())
                .await
                .unwrap();
            ids.push(rec.id);
        }

        let query = ListContactsQuery {
            page: Some("2".into()),
            limit: Some("10".into()),
            ..Default::default()
        };
        let page = gateway.list(&query).await.unwrap();
        assert_eq!(page.pagination.total, 12);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.pagination.page, 2);
        let got: Vec<i64> = page.rows.iter().map(|r| r.id).collect();
        assert_eq!(got, vec![ids[1], ids[0]]);
        assert!(page.rows[0].created_at > page.rows[1].created_at);
    }

    #[tokio::test]
    async fn list_rejects_unparseable_dates() {
        let store = RecordingStore::default();
        let config = Config::default();
        let gateway = ContactGateway::new(&store, &config);
        let query = ListContactsQuery { start_date: Some("soon".into()), ..Default::default() };

        assert!(matches!(gateway.list(&query).await, Err(ServerError::BadRequest(_))));
        assert_eq!(store.touched(), 0);
    }

    #[tokio::test]
    async fn list_filters_by_exact_email() {
        let store = SqliteStore::in_memory().await;
        let config = Config::default();
        let gateway = ContactGateway::new(&store, &config);
        for email in ["a@x.io", "b@x.io", "A@X.io"] {
            gateway
                .create(&candidate("Someone", email, "A message of decent length"), SubmissionMeta::default())
                .await
                .unwrap();
        }

        let query = ListContactsQuery { email: Some("a@x.io".into()), ..Default::default() };
        let page = gateway.list(&query).await.unwrap();
        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.pagination.total_pages, 1);
        assert!(page.rows.iter().all(|r| r.email == "a@x.io"));
    }

    #[tokio::test]
    async fn delete_missing_id_is_not_found_twice() {
        let store = SqliteStore::in_memory().await;
        let config = Config::default();
        let gateway = ContactGateway::new(&store, &config);

        let created = gateway
            .create(&candidate("Ada", "ada@example.com", "Please remove me later"), SubmissionMeta::default())
            .await
            .unwrap();
        let id = created.id.to_string();

        let deleted = gateway.delete(&id, None).await.unwrap();
        assert_eq!(deleted.email, "ada@example.com");
        assert!(matches!(gateway.delete(&id, None).await, Err(ServerError::NotFound(_))));
        assert!(matches!(gateway.delete(&id, None).await, Err(ServerError::NotFound(_))));
        assert!(matches!(gateway.delete("999", None).await, Err(ServerError::NotFound(_))));
    }

    #[tokio::test]
    async fn production_delete_requires_admin_key_before_store() {
        let store = RecordingStore::default();
        let config = production(Some("s3cret"));
        let gateway = ContactGateway::new(&store, &config);

        assert!(matches!(gateway.delete("1", None).await, Err(ServerError::Unauthorized)));
        assert!(matches!(gateway.delete("1", Some("wrong")).await, Err(ServerError::Unauthorized)));
        assert_eq!(store.touched(), 0);

        // Correct key reaches the store.
        let _ = gateway.delete("1", Some("s3cret")).await;
        assert_eq!(store.touched(), 1);
    }

    #[tokio::test]
    async fn admin_key_must_match_exactly() {
        let store = RecordingStore::default();
        let config = production(Some("s3cret"));
        let gateway = ContactGateway::new(&store, &config);

        for wrong in ["s3cre", "s3crett", "S3CRET", ""] {
            assert!(matches!(gateway.delete("1", Some(wrong)).await, Err(ServerError::Unauthorized)), "{wrong}");
        }
        assert_eq!(store.touched(), 0);
    }

    #[tokio::test]
    async fn uniqueness_violation_maps_to_conflict() {
        let store = SqliteStore::in_memory().await;
        sqlx::query("CREATE UNIQUE INDEX contacts_email_unique ON contacts(email)")
            .execute(store.pool())
            .await
            .unwrap();
        let config = Config::default();
        let gateway = ContactGateway::new(&store, &config);
        let submission = candidate("Ada", "ada@example.com", "A message of decent length");

        gateway.create(&submission, SubmissionMeta::default()).await.unwrap();
        match gateway.create(&submission, SubmissionMeta::default()).await {
            Err(err @ ServerError::Conflict(_)) => {
                assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn production_without_configured_key_rejects_every_delete() {
        let store = RecordingStore::default();
        let config = production(None);
        let gateway = ContactGateway::new(&store, &config);

        assert!(matches!(gateway.delete("1", Some("")).await, Err(ServerError::Unauthorized)));
        assert_eq!(store.touched(), 0);
    }

    #[tokio::test]
    async fn store_failures_hide_detail_outside_development() {
        let store = RecordingStore::default();

        let dev = Config::default();
        match ContactGateway::new(&store, &dev).get("1").await {
            Err(ServerError::StoreUnavailable { detail }) => assert!(detail.is_some()),
            other => panic!("unexpected {other:?}"),
        }

        let prod = production(Some("k"));
        match ContactGateway::new(&store, &prod).get("1").await {
            Err(ServerError::StoreUnavailable { detail }) => assert!(detail.is_none()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_ids_are_bad_requests() {
        let store = RecordingStore::default();
        let config = Config::default();
        let gateway = ContactGateway::new(&store, &config);
        for raw in ["abc", "0", "-4", "1.5"] {
            assert!(matches!(gateway.get(raw).await, Err(ServerError::BadRequest(_))), "{raw}");
        }
        assert_eq!(store.touched(), 0);
    }

    #[tokio::test]
    async fn health_reports_store_state() {
        let store = SqliteStore::in_memory().await;
        let config = Config::default();
        assert_eq!(ContactGateway::new(&store, &config).health().await, DatabaseHealth::Connected);

        let broken = RecordingStore::default();
        assert!(matches!(
            ContactGateway::new(&broken, &config).health().await,
            DatabaseHealth::Disconnected
        ));
    }

    #[tokio::test]
    async fn metrics_cover_trailing_window_only() {
        let store = SqliteStore::in_memory().await;
        let config = Config::default();
        let gateway = ContactGateway::new(&store, &config);

        let recent = gateway
            .create(&candidate("Ada", "ada@example.com", "A message of decent length"), SubmissionMeta::default())
            .await
            .unwrap();
        let old = gateway
            .create(&candidate("Bob", "bob@example.com", "A message of decent length"), SubmissionMeta::default())
            .await
            .unwrap();
        sqlx::query("UPDATE contacts SET created_at = ?1 WHERE id = ?2")
            .bind(format_timestamp(Utc::now() - Duration::days(METRICS_WINDOW_DAYS + 5)))
            .bind(old.id)
            .execute(store.pool())
            .await
            .unwrap();

        let metrics = gateway.metrics().await.unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].date, recent.created_at.format("%Y-%m-%d").to_string());
        assert_eq!(metrics[0].daily_count, 1);
    }
}
