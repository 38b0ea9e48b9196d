//! Axum middleware for metrics and request logging.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::metrics::{determine_operation, record_request};

/// Metrics and logging middleware.
///
/// Generates a request ID, detects the API operation, times the request,
/// records metrics, and wraps the handler in a tracing span.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let operation = determine_operation(&method, &path);

    let span = info_span!(
        "http_request",
        request_id = %request_id,
        method = %method,
        path = %path,
        operation = operation.map_or("unknown", |o| o.as_str()),
    );

    let response = next.run(request).instrument(span).await;

    if let Some(op) = operation {
        record_request(op, response.status().as_u16(), start.elapsed());
    }

    response
}
