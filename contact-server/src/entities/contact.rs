use std::future::Future;

use chrono::{DateTime, Utc};

use crate::entities::dao::{
    ContactRecord, DailyContactMetric, NewContact, format_timestamp, parse_timestamp,
};
use crate::entities::query::{FilterClause, PageRequest};
use crate::entities::SqliteStore;

pub trait ContactStore: Send + Sync + 'static {
    /// Insert a contact; the store assigns `id`, `created_at` and `updated_at`.
    fn insert_contact(
        &self,
        contact: NewContact,
    ) -> impl Future<Output = Result<ContactRecord, sqlx::Error>> + Send;

    /// Number of rows matching `clause`. Binds exactly `clause.params`.
    fn count_contacts(
        &self,
        clause: &FilterClause,
    ) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;

    /// One page of rows matching `clause`, newest first.
    fn list_contacts(
        &self,
        clause: &FilterClause,
        page: PageRequest,
    ) -> impl Future<Output = Result<Vec<ContactRecord>, sqlx::Error>> + Send;

    fn get_contact(&self, id: i64) -> impl Future<Output = Result<Option<ContactRecord>, sqlx::Error>> + Send;

    /// Hard delete. Returns the removed row, or `None` if nothing matched.
    fn delete_contact(&self, id: i64) -> impl Future<Output = Result<Option<ContactRecord>, sqlx::Error>> + Send;

    /// `SELECT 1` round-trip.
    fn ping(&self) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    /// Per-day counts for rows created at or after `since`, newest day first.
    fn daily_metrics(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<DailyContactMetric>, sqlx::Error>> + Send;
}

type ContactRow = (i64, String, String, String, Option<String>, Option<String>, String, String);

fn into_record(row: ContactRow) -> ContactRecord {
    let (id, name, email, message, ip_address, user_agent, created_at, updated_at) = row;
    ContactRecord {
        id,
        name,
        email,
        message,
        ip_address,
        user_agent,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    }
}

impl ContactStore for SqliteStore {
    async fn insert_contact(&self, contact: NewContact) -> Result<ContactRecord, sqlx::Error> {
        let now = format_timestamp(Utc::now());
        let row: ContactRow = sqlx::query_as(
            "INSERT INTO contacts (name, email, message, ip_address, user_agent, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) \
             RETURNING id, name, email, message, ip_address, user_agent, created_at, updated_at",
        )
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.message)
        .bind(&contact.ip_address)
        .bind(&contact.user_agent)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;
        Ok(into_record(row))
    }

    async fn count_contacts(&self, clause: &FilterClause) -> Result<i64, sqlx::Error> {
        let sql = clause.count_sql();
        let mut query = sqlx::query_scalar::<sqlx::Sqlite, i64>(&sql);
        for param in &clause.params {
            query = query.bind(param);
        }
        query.fetch_one(&self.pool).await
    }

    async fn list_contacts(
        &self,
        clause: &FilterClause,
        page: PageRequest,
    ) -> Result<Vec<ContactRecord>, sqlx::Error> {
        let sql = clause.page_sql();
        let mut query = sqlx::query_as::<sqlx::Sqlite, ContactRow>(&sql);
        for param in &clause.params {
            query = query.bind(param);
        }
        let rows = query
            .bind(i64::from(page.limit))
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(into_record).collect())
    }

    async fn get_contact(&self, id: i64) -> Result<Option<ContactRecord>, sqlx::Error> {
        let row: Option<ContactRow> = sqlx::query_as(
            "SELECT id, name, email, message, ip_address, user_agent, created_at, updated_at \
             FROM contacts WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(into_record))
    }

    async fn delete_contact(&self, id: i64) -> Result<Option<ContactRecord>, sqlx::Error> {
        let row: Option<ContactRow> = sqlx::query_as(
            "DELETE FROM contacts WHERE id = ?1 \
             RETURNING id, name, email, message, ip_address, user_agent, created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(into_record))
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn daily_metrics(&self, since: DateTime<Utc>) -> Result<Vec<DailyContactMetric>, sqlx::Error> {
        let rows: Vec<(String, i64, i64, i64)> = sqlx::query_as(
            "SELECT substr(created_at, 1, 10) AS day, \
                    COUNT(*) AS total_contacts, \
                    COUNT(DISTINCT email) AS unique_emails, \
                    COUNT(*) AS daily_count \
             FROM contacts WHERE created_at >= ?1 \
             GROUP BY day ORDER BY day DESC",
        )
        .bind(format_timestamp(since))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(date, total_contacts, unique_emails, daily_count)| DailyContactMetric {
                date,
                total_contacts,
                unique_emails,
                daily_count,
            })
            .collect())
    }
}
