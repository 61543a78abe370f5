//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (request tracing, rate limiting, CORS, security
//!   headers, body size limit)
//! - `/api/contacts` CRUD routes
//! - `/api/health` and `/api/metrics`
//! - Optional OpenAPI document (disable with `CONTACT_ENABLE_DOCS=false`)
//! - A JSON 404 fallback for everything else

mod contacts;
pub mod doc;
mod health;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::middleware::{cors, rate_limit, trace};
use crate::state::AppState;

// ── Router builder ────────────────────────────────────────────────────────────

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let mut api_router = Router::new()
        .merge(contacts::router())
        .merge(health::router());

    if state.config.enable_docs {
        let api_doc = doc::get_docs();
        api_router = api_router.route(
            "/docs/openapi.json",
            get(move || {
                let api_doc = api_doc.clone();
                async move { Json(api_doc) }
            }),
        );
    }

    Router::new()
        .nest("/api", api_router)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_middleware,
        ))
        // Outermost layers execute first on the way in. CORS and the
        // security headers wrap the limiter so 429s carry them too, and
        // preflights are answered before they count against the quota.
        .layer(
            ServiceBuilder::new()
                .layer(security_header("x-content-type-options", "nosniff"))
                .layer(security_header("x-frame-options", "DENY"))
                .layer(security_header("referrer-policy", "no-referrer")),
        )
        .layer(cors::cors_layer(&state))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}

fn security_header(name: &'static str, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(
        HeaderName::from_static(name),
        HeaderValue::from_static(value),
    )
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Endpoint not found" })))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
