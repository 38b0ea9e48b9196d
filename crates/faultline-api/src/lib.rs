// Copyright 2026 Faultline Dev
// SPDX-License-Identifier: Apache-2.0

//! HTTP API for the Faultline fault-injection service.
//!
//! This crate provides the JSON administration and evaluation surface:
//! - Rule CRUD under `/errors/rules`
//! - The evaluation endpoints `/errors/should-inject` and `/errors/inject`
//! - Statistics under `/errors/stats`
//! - The `/health` probe

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;

pub use error::ApiError;
pub use handlers::AppState;
pub use metrics::init_metrics;
pub use router::create_router;
