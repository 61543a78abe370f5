//! Health and metrics endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::entities::dao::format_timestamp;
use crate::error::ServerError;
use crate::gateway::DatabaseHealth;
use crate::schemas::contact::{DailyMetricView, ErrorEnvelope, MetricsResponse};
use crate::schemas::health::{HealthChecks, HealthResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(get_health, get_metrics),
    components(schemas(HealthResponse, HealthChecks, MetricsResponse, DailyMetricView))
)]
pub struct HealthApi;

/// Register health-check and metrics routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(get_health))
        .route("/metrics", get(get_metrics))
}

/// Liveness plus a store round-trip.
///
/// Returns 200 while the store answers `SELECT 1`, 503 otherwise.
/// Load-balancers and monitoring systems should poll this endpoint.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and store are healthy", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let db = state.gateway().health().await;
    let (status, label, database) = match db {
        DatabaseHealth::Connected => (StatusCode::OK, "healthy", "connected"),
        DatabaseHealth::Disconnected => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "disconnected"),
    };
    (
        status,
        Json(HealthResponse {
            status: label.to_owned(),
            timestamp: format_timestamp(Utc::now()),
            service: env!("CARGO_PKG_NAME").to_owned(),
            uptime: state.started_at.elapsed().as_secs_f64(),
            checks: HealthChecks { database: database.to_owned() },
        }),
    )
}

/// Daily submission counts for the trailing 30 days, newest first.
#[utoipa::path(
    get,
    path = "/api/metrics",
    tag = "health",
    responses(
        (status = 200, description = "Daily counts", body = MetricsResponse),
        (status = 500, description = "Store error", body = ErrorEnvelope)
    )
)]
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Result<Json<MetricsResponse>, ServerError> {
    let metrics = state.gateway().metrics().await?;
    Ok(Json(MetricsResponse {
        success: true,
        data: metrics.iter().map(|m| m.to_view()).collect(),
    }))
}
