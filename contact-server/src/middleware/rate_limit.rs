//! Per-address sliding-window rate limiting for `/api/` routes.
//!
//! Each source address keeps the timestamps of its requests inside the
//! window. A request is rejected once the address already has
//! `max_requests` timestamps in the window. Expired entries are swept every
//! `cleanup_interval` requests, and the number of tracked addresses is
//! capped so spoofed sources cannot grow the map without bound.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ServerError;
use crate::middleware::client_ip;
use crate::state::AppState;

/// Path prefix subject to rate limiting.
pub const LIMITED_PREFIX: &str = "/api/";

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    /// Sweep expired entries every N checks.
    pub cleanup_interval: u64,
    /// Hard cap on distinct addresses tracked at once.
    pub max_tracked_ips: usize,
}

impl RateLimitConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            max_requests: cfg.rate_limit_max_requests,
            window: Duration::from_secs(cfg.rate_limit_window_secs),
            cleanup_interval: 100,
            max_tracked_ips: cfg.rate_limit_max_tracked_ips.max(1),
        }
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: RwLock<HashMap<IpAddr, Vec<Instant>>>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: RwLock::new(HashMap::new()),
            checks: AtomicU64::new(0),
        }
    }

    /// Record a request from `ip`, or reject it with
    /// [`ServerError::RateLimited`].
    pub fn check(&self, ip: IpAddr) -> Result<(), ServerError> {
        let now = Instant::now();
        let cutoff = now.checked_sub(self.config.window).unwrap_or(now);

        let count = self.checks.fetch_add(1, Ordering::Relaxed);
        if count > 0 && count % self.config.cleanup_interval.max(1) == 0 {
            debug!(checks = count, "sweeping expired rate limit entries");
            self.cleanup();
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if !state.contains_key(&ip) && state.len() >= self.config.max_tracked_ips {
            state.retain(|_, stamps| {
                stamps.retain(|t| *t > cutoff);
                !stamps.is_empty()
            });
            if state.len() >= self.config.max_tracked_ips {
                warn!(ip = %ip, tracked_ips = state.len(), "rate limiter full; rejecting new address");
                return Err(ServerError::RateLimited);
            }
        }

        let stamps = state.entry(ip).or_default();
        stamps.retain(|t| *t > cutoff);
        if stamps.len() >= self.config.max_requests as usize {
            warn!(ip = %ip, requests = stamps.len(), max = self.config.max_requests, "rate limit exceeded");
            return Err(ServerError::RateLimited);
        }
        stamps.push(now);
        Ok(())
    }

    /// Drop addresses with no requests inside the window.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let cutoff = now.checked_sub(self.config.window).unwrap_or(now);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.retain(|_, stamps| {
            stamps.retain(|t| *t > cutoff);
            !stamps.is_empty()
        });
    }

    #[cfg(test)]
    pub fn tracked_ips(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Resolves the caller address (stored as a [`client_ip::ClientIp`]
/// extension for handlers) and enforces the limiter on `/api/` paths.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let client = client_ip::resolve(&req, state.config.trust_proxy);
    req.extensions_mut().insert(client);

    if req.uri().path().starts_with(LIMITED_PREFIX) {
        let key = client.0.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        if let Err(e) = state.rate_limiter.check(key) {
            return e.into_response();
        }
    }
    next.run(req).await
}
