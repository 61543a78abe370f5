use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthChecks {
    /// `"connected"` or `"disconnected"`.
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `"healthy"` or `"unhealthy"`.
    pub status: String,
    pub timestamp: String,
    pub service: String,
    /// Seconds since process start.
    pub uptime: f64,
    pub checks: HealthChecks,
}
