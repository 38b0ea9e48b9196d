//! Rule administration handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use faultline_core::ErrorRule;
use serde::Serialize;

use crate::error::ApiError;
use crate::handlers::AppState;

/// Response for rule listing.
#[derive(Debug, Serialize)]
pub struct ListRulesResponse {
    /// The rules, in insertion order.
    pub rules: Vec<ErrorRule>,
    /// Number of rules returned.
    pub count: usize,
}

/// Create a rule.
///
/// POST /errors/rules
pub async fn create_rule(
    State(state): State<AppState>,
    Json(rule): Json<ErrorRule>,
) -> Result<(StatusCode, Json<ErrorRule>), ApiError> {
    let added = state.injector.add_rule(rule)?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// List all rules.
///
/// GET /errors/rules
pub async fn list_rules(State(state): State<AppState>) -> Json<ListRulesResponse> {
    let rules = state.injector.list_rules();
    let count = rules.len();
    Json(ListRulesResponse { rules, count })
}

/// Fetch one rule by id.
///
/// GET /errors/rules/{id}
pub async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ErrorRule>, ApiError> {
    Ok(Json(state.injector.get_rule(&id)?))
}

/// Update a rule.
///
/// PUT /errors/rules/{id}
///
/// The id in the path wins over any id in the body.
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut rule): Json<ErrorRule>,
) -> Result<Json<ErrorRule>, ApiError> {
    rule.id = id;
    Ok(Json(state.injector.update_rule(rule)?))
}

/// Delete a rule.
///
/// DELETE /errors/rules/{id}
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.injector.remove_rule(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
