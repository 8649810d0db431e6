//! Health and API contract endpoints

use axum::{
    http::header,
    response::{IntoResponse, Json},
};
use serde::Serialize;

/// OpenAPI document describing every route
pub const OPENAPI_SPEC: &str = include_str!("../../openapi.yml");

/// Public health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    /// Status indicator (always "ok")
    pub status: String,
}

/// Public health check handler that returns simple status
///
/// # Example
/// ```bash
/// curl http://localhost:5000/api/v1/health
/// # Returns: {"status":"ok"}
/// ```
pub async fn health_check() -> Json<HealthCheckResponse> {
    tracing::debug!("Health check requested");
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}

/// GET /api-docs/openapi.yml
pub async fn openapi_spec() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/yaml")], OPENAPI_SPEC)
}
