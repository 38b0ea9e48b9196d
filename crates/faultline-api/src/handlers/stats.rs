//! Statistics handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use faultline_core::ErrorStats;

use crate::error::ApiError;
use crate::handlers::AppState;

/// Read the aggregate injection statistics.
///
/// GET /errors/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<ErrorStats> {
    Json(state.injector.stats().await)
}

/// Reset the injection statistics.
///
/// DELETE /errors/stats
pub async fn reset_stats(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.injector.reset_stats().await?;
    Ok(StatusCode::NO_CONTENT)
}
