//! Server configuration, loaded from environment variables at startup.

use std::str::FromStr;
use std::time::Duration;

use strum::{Display, EnumString};

/// Deployment mode. Controls the delete credential check and whether store
/// error detail reaches clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RunMode {
    Development,
    Production,
    Test,
}

impl RunMode {
    /// Parse a mode string; unknown values fall back to production.
    pub fn parse_or_production(raw: &str) -> Self {
        RunMode::from_str(raw.trim()).unwrap_or(RunMode::Production)
    }

    pub fn is_development(self) -> bool {
        self == RunMode::Development
    }

    pub fn is_production(self) -> bool {
        self == RunMode::Production
    }
}

/// Runtime configuration for contact-server.
///
/// Every field has a default so the server works out-of-the-box without
/// any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// sqlx SQLite URL (default: `"sqlite://contacts.db?mode=rwc"`).
    pub database_url: String,

    /// Maximum pooled store connections.
    pub db_pool_size: u32,

    /// How long a request waits for a pooled connection.
    pub db_acquire_timeout_secs: u64,

    /// Startup connection attempts before giving up.
    pub db_connect_retries: u32,

    /// Fixed delay between startup connection attempts.
    pub db_retry_backoff_ms: u64,

    pub run_mode: RunMode,

    /// Credential expected in `X-API-Key` for deletes in production.
    pub admin_api_key: Option<String>,

    /// Sliding window length for the `/api/` rate limiter.
    pub rate_limit_window_secs: u64,

    /// Requests allowed per source address within the window.
    pub rate_limit_max_requests: u32,

    /// Hard cap on source addresses tracked by the rate limiter.
    pub rate_limit_max_tracked_ips: usize,

    /// Take the source address from the first `X-Forwarded-For` entry.
    pub trust_proxy: bool,

    /// Comma-separated CORS allow list; wildcard when unset.
    pub cors_allowed_origins: Option<String>,

    /// Request body size ceiling in bytes.
    pub max_body_bytes: usize,

    /// Optional clamp on the list endpoint's `limit`. `None` keeps it
    /// caller-controlled.
    pub list_limit_cap: Option<u32>,

    /// Serve the OpenAPI document at `/api/docs/openapi.json`.
    pub enable_docs: bool,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("CONTACT_BIND", "0.0.0.0:3000"),
            database_url: env_or("CONTACT_DATABASE_URL", "sqlite://contacts.db?mode=rwc"),
            db_pool_size: parse_env("CONTACT_DB_POOL_SIZE", 20),
            db_acquire_timeout_secs: parse_env("CONTACT_DB_ACQUIRE_TIMEOUT_SECS", 30),
            db_connect_retries: parse_env("CONTACT_DB_CONNECT_RETRIES", 5),
            db_retry_backoff_ms: parse_env("CONTACT_DB_RETRY_BACKOFF_MS", 5_000),
            run_mode: RunMode::parse_or_production(&env_or("CONTACT_ENV", "production")),
            admin_api_key: env_opt("CONTACT_ADMIN_API_KEY"),
            rate_limit_window_secs: parse_env("CONTACT_RATE_LIMIT_WINDOW_SECS", 15 * 60),
            rate_limit_max_requests: parse_env("CONTACT_RATE_LIMIT_MAX", 100),
            rate_limit_max_tracked_ips: parse_env("CONTACT_RATE_LIMIT_MAX_IPS", 10_000),
            trust_proxy: env_flag("CONTACT_TRUST_PROXY", false),
            cors_allowed_origins: env_opt("CONTACT_CORS_ORIGINS"),
            max_body_bytes: parse_env("CONTACT_MAX_BODY_BYTES", 10 * 1024),
            list_limit_cap: env_opt("CONTACT_LIST_MAX_LIMIT")
                .and_then(|v| v.parse().ok())
                .filter(|cap: &u32| *cap > 0),
            enable_docs: env_flag("CONTACT_ENABLE_DOCS", true),
            log_level: env_or("CONTACT_LOG", "info"),
            log_json: env_flag("CONTACT_LOG_JSON", false),
        }
    }

    pub fn db_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.db_retry_backoff_ms)
    }

    pub fn db_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }
}

#[cfg(test)]
impl Default for Config {
    /// Defaults used by tests: in-memory store, development mode.
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:0".to_owned(),
            database_url: "sqlite::memory:".to_owned(),
            db_pool_size: 1,
            db_acquire_timeout_secs: 30,
            db_connect_retries: 1,
            db_retry_backoff_ms: 0,
            run_mode: RunMode::Development,
            admin_api_key: None,
            rate_limit_window_secs: 15 * 60,
            rate_limit_max_requests: 100,
            rate_limit_max_tracked_ips: 10_000,
            trust_proxy: false,
            cors_allowed_origins: None,
            max_body_bytes: 10 * 1024,
            list_limit_cap: None,
            enable_docs: true,
            log_level: "info".to_owned(),
            log_json: false,
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| parse_flag(&v))
        .unwrap_or(default)
}

fn parse_flag(raw: &str) -> bool {
    raw == "1" || raw.eq_ignore_ascii_case("true")
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_mode_parses_case_insensitively() {
        assert_eq!(RunMode::parse_or_production("Development"), RunMode::Development);
        assert_eq!(RunMode::parse_or_production(" test "), RunMode::Test);
        assert_eq!(RunMode::parse_or_production("PRODUCTION"), RunMode::Production);
    }

    #[test]
    fn unknown_run_mode_is_production() {
        assert_eq!(RunMode::parse_or_production("staging"), RunMode::Production);
        assert_eq!(RunMode::parse_or_production(""), RunMode::Production);
    }

    #[test]
    fn flags_accept_one_and_true() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("yes"));
        assert!(!parse_flag("0"));
    }

    #[test]
    fn run_mode_displays_lowercase() {
        assert_eq!(RunMode::Development.to_string(), "development");
    }
}
