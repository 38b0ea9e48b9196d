// Copyright 2026 Faultline Dev
// SPDX-License-Identifier: Apache-2.0

//! API request metrics definitions.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// API operation type for metrics labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOperation {
    /// Create a rule.
    AddRule,
    /// List all rules.
    ListRules,
    /// Fetch one rule.
    GetRule,
    /// Update a rule.
    UpdateRule,
    /// Delete a rule.
    DeleteRule,
    /// Evaluate whether an operation should fail.
    ShouldInject,
    /// Execute an action.
    Inject,
    /// Read statistics.
    GetStats,
    /// Reset statistics.
    ResetStats,
    /// Health probe.
    Health,
}

impl ApiOperation {
    /// Returns the operation name as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AddRule => "AddRule",
            Self::ListRules => "ListRules",
            Self::GetRule => "GetRule",
            Self::UpdateRule => "UpdateRule",
            Self::DeleteRule => "DeleteRule",
            Self::ShouldInject => "ShouldInject",
            Self::Inject => "Inject",
            Self::GetStats => "GetStats",
            Self::ResetStats => "ResetStats",
            Self::Health => "Health",
        }
    }
}

/// Initialize metric descriptions (call once at startup).
pub fn init_metrics() {
    describe_counter!("faultline_requests_total", "Total number of API requests");
    describe_histogram!("faultline_request_duration_seconds", "Request duration in seconds");
}

/// Record a completed request.
pub fn record_request(operation: ApiOperation, status_code: u16, duration: Duration) {
    let op = operation.as_str();
    let status = status_class(status_code);

    counter!("faultline_requests_total",
        "operation" => op,
        "status" => status
    )
    .increment(1);

    histogram!("faultline_request_duration_seconds",
        "operation" => op
    )
    .record(duration.as_secs_f64());
}

/// Convert status code to status class for metric labels.
fn status_class(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

/// Determine the API operation from HTTP method and path.
#[must_use]
pub fn determine_operation(method: &http::Method, path: &str) -> Option<ApiOperation> {
    match (method.as_str(), path) {
        ("GET", "/health") => Some(ApiOperation::Health),
        ("POST", "/errors/rules") => Some(ApiOperation::AddRule),
        ("GET", "/errors/rules") => Some(ApiOperation::ListRules),
        ("POST", "/errors/should-inject") => Some(ApiOperation::ShouldInject),
        ("POST", "/errors/inject") => Some(ApiOperation::Inject),
        ("GET", "/errors/stats") => Some(ApiOperation::GetStats),
        ("DELETE", "/errors/stats") => Some(ApiOperation::ResetStats),
        (method, path) if path.starts_with("/errors/rules/") => match method {
            "GET" => Some(ApiOperation::GetRule),
            "PUT" => Some(ApiOperation::UpdateRule),
            "DELETE" => Some(ApiOperation::DeleteRule),
            _ => None,
        },
        _ => None,
    }
}
