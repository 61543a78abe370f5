//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON error envelope (`{"error": ..., "details"?: ...}`) with an
//! appropriate status code.
//!
//! **Security note:** store failures are logged with full detail where they
//! are mapped (see [`crate::gateway`]); the driver message only travels to
//! the client when the server runs in development mode.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use crate::validation::FieldError;

/// Fixed message returned to callers that exceed the request-rate ceiling.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// All errors that can occur in the contact-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// One or more submitted fields failed validation.
    #[error("validation failed ({} field errors)", .0.len())]
    Validation(Vec<FieldError>),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The caller did not present the admin credential.
    #[error("unauthorized")]
    Unauthorized,

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store reported a uniqueness violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller exceeded the request-rate ceiling.
    #[error("rate limit exceeded")]
    RateLimited,

    /// The store failed. `detail` is populated only in development mode.
    #[error("store unavailable")]
    StoreUnavailable { detail: Option<String> },
}

impl ServerError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ServerError::StoreUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The JSON error envelope sent to the client.
    pub fn envelope(&self) -> Value {
        match self {
            ServerError::Validation(errors) => json!({
                "error": "Validation failed",
                "details": errors,
            }),
            ServerError::BadRequest(m) | ServerError::NotFound(m) | ServerError::Conflict(m) => {
                json!({ "error": m })
            }
            ServerError::Unauthorized => json!({ "error": "Unauthorized" }),
            ServerError::RateLimited => json!({ "error": RATE_LIMIT_MESSAGE }),
            ServerError::StoreUnavailable { detail: Some(d) } => json!({
                "error": "Internal server error",
                "details": d,
            }),
            ServerError::StoreUnavailable { detail: None } => {
                json!({ "error": "Internal server error" })
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
