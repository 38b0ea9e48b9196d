//! Evaluation and action-execution handlers.
//!
//! These are the endpoints the fault-injecting middleware inside other
//! services calls on every monitored request.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use faultline_core::ErrorAction;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::handlers::AppState;

/// Request body for `should-inject`.
#[derive(Debug, Deserialize)]
pub struct ShouldInjectRequest {
    /// The service asking.
    pub service: String,
    /// The operation about to run.
    #[serde(default)]
    pub operation: String,
    /// Request attributes (documented keys: `user_agent`, `remote_addr`).
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Response body for `should-inject`.
#[derive(Debug, Serialize)]
pub struct ShouldInjectResponse {
    /// Whether a rule matched.
    pub matched: bool,
    /// The action to apply, when matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ErrorAction>,
}

/// Request body for `inject`.
#[derive(Debug, Deserialize)]
pub struct InjectRequest {
    /// The action to execute.
    pub action: ErrorAction,
}

/// Response body for a successfully applied (or no-op) injection.
#[derive(Debug, Serialize)]
pub struct InjectResponse {
    /// Always true on a 200 response; injected faults surface as errors.
    pub success: bool,
}

/// Decide whether the given operation should fail.
///
/// POST /errors/should-inject
pub async fn should_inject(
    State(state): State<AppState>,
    Json(request): Json<ShouldInjectRequest>,
) -> Json<ShouldInjectResponse> {
    let action =
        state.injector.should_inject(&request.service, &request.operation, &request.metadata);
    Json(ShouldInjectResponse { matched: action.is_some(), action })
}

/// Execute an action.
///
/// POST /errors/inject
///
/// Delay actions suspend the request; synthetic faults come back as error
/// responses shaped like the failure they simulate. Disabled categories are
/// no-ops.
pub async fn inject(
    State(state): State<AppState>,
    Json(request): Json<InjectRequest>,
) -> Result<Json<InjectResponse>, ApiError> {
    state.injector.inject(&request.action).await?;
    Ok(Json(InjectResponse { success: true }))
}
