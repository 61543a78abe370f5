//! Persistence layer.
//!
//! [`ContactStore`] defines the persistence contract for contact records.
//! The implementation is [`SqliteStore`], a thin owner of a
//! [`sqlx::SqlitePool`]. The pool is created once at startup, held by
//! [`crate::state::AppState`] and handed to every operation by reference.
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` crate is required.

pub mod contact;
pub mod dao;
pub mod query;

pub use contact::ContactStore;
pub use dao::{ContactRecord, DailyContactMetric, NewContact};

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::Config;

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `cfg.database_url` and run pending
    /// migrations.
    ///
    /// The initial connection is attempted up to `cfg.db_connect_retries`
    /// times with a fixed `cfg.db_retry_backoff_ms` pause in between.
    /// Afterwards the pool replaces broken connections on acquire; request
    /// operations themselves are never retried.
    pub async fn connect(cfg: &Config) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&cfg.database_url)?.create_if_missing(true);
        let attempts = cfg.db_connect_retries.max(1);

        let mut attempt = 1;
        let pool = loop {
            let result = SqlitePoolOptions::new()
                .max_connections(cfg.db_pool_size.max(1))
                .acquire_timeout(cfg.db_acquire_timeout())
                .test_before_acquire(true)
                .connect_with(options.clone())
                .await;
            match result {
                Ok(pool) => break pool,
                Err(e) if attempt < attempts => {
                    warn!(
                        attempt,
                        max_attempts = attempts,
                        backoff_ms = cfg.db_retry_backoff_ms,
                        error = %e,
                        "database connection failed; retrying"
                    );
                    tokio::time::sleep(cfg.db_retry_backoff()).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };
        info!(attempt, pool_size = cfg.db_pool_size, "database pool established");

        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Fresh in-memory store for tests. A single pooled connection keeps
    /// the database alive for the store's lifetime.
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        Self::connect(&Config::default())
            .await
            .expect("in-memory sqlite store")
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
