//! Shared application state injected into every Axum handler.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::entities::SqliteStore;
use crate::gateway::ContactGateway;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};

#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived, built once at startup).
    pub config: Arc<Config>,
    /// Owner of the store connection pool.
    pub store: Arc<SqliteStore>,
    /// Per-address request counters for `/api/`.
    pub rate_limiter: Arc<RateLimiter>,
    /// Process start, reported as `uptime` by the health endpoint.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, store: SqliteStore) -> Self {
        let rate_limiter = RateLimiter::new(RateLimitConfig::from_config(&config));
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            rate_limiter: Arc::new(rate_limiter),
            started_at: Instant::now(),
        }
    }

    pub fn gateway(&self) -> ContactGateway<'_, SqliteStore> {
        ContactGateway::new(&*self.store, &*self.config)
    }
}
