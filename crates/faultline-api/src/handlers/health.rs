//! Health probe handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::handlers::AppState;

/// Health response payload, including the effective injection configuration
/// so operators can see at a glance what the service will and will not
/// simulate.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Probe timestamp.
    pub timestamp: String,
    /// Effective configuration summary.
    pub config: HealthConfig,
}

/// The configuration block reported by the health probe.
#[derive(Debug, Serialize)]
pub struct HealthConfig {
    /// Rule ceiling.
    pub max_rules: usize,
    /// Whether injection events are recorded.
    pub enable_statistics: bool,
    /// Whether scheduled rules are enabled.
    pub enable_scheduling: bool,
    /// Global evaluation gate.
    pub global_probability: f64,
    /// HTTP error actions allowed.
    pub enable_http_errors: bool,
    /// Network error actions allowed.
    pub enable_network_errors: bool,
    /// Database error actions allowed.
    pub enable_database_errors: bool,
    /// Storage error actions allowed.
    pub enable_storage_errors: bool,
}

/// Health probe.
///
/// GET /health
pub async fn health(State(state): State<AppState>) -> Response {
    let config = state.injector.config();
    let summary = HealthConfig {
        max_rules: config.engine.max_rules,
        enable_statistics: config.engine.enable_statistics,
        enable_scheduling: config.engine.enable_scheduling,
        global_probability: config.injection.global_probability,
        enable_http_errors: config.injection.enable_http_errors,
        enable_network_errors: config.injection.enable_network_errors,
        enable_database_errors: config.injection.enable_database_errors,
        enable_storage_errors: config.injection.enable_storage_errors,
    };

    let (status, status_str) = match state.injector.health_check() {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };

    let body = HealthResponse {
        status: status_str,
        service: "faultline",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
        config: summary,
    };
    (status, Json(body)).into_response()
}
