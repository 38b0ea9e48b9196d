//! API error types and JSON error response formatting.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use faultline_core::Error as CoreError;
use serde::Serialize;

/// API-level error that can be converted to an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status for the response.
    pub status: StatusCode,
    /// Stable machine-readable error code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Request ID for tracking.
    pub request_id: String,
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
    request_id: &'a str,
}

impl ApiError {
    /// Create a new API error.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// A 400 response for a malformed or invalid request.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "InvalidRequest", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.code,
            message: &self.message,
            request_id: &self.request_id,
        })
        .into_response();

        let mut response = (self.status, body).into_response();
        if let Ok(value) = self.request_id.parse() {
            response.headers_mut().insert("x-request-id", value);
        }
        response
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = StatusCode::from_u16(err.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = match &err {
            CoreError::Validation(_) => "ValidationError",
            CoreError::Capacity { .. } => "CapacityError",
            CoreError::NotFound { .. } => "NotFoundError",
            CoreError::Consistency(_) => "ConsistencyError",
            CoreError::Network(_) => "NetworkErrorInjected",
            CoreError::Database(_) => "DatabaseErrorInjected",
            CoreError::Storage(_) => "StorageErrorInjected",
            CoreError::Cancelled => "Cancelled",
            CoreError::Config(_) => "ConfigError",
            CoreError::Io(_) => "InternalError",
        };
        Self::new(status, code, err.to_string())
    }
}
