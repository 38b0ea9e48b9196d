// Copyright 2026 Faultline Dev
// SPDX-License-Identifier: Apache-2.0

//! Rule engine and statistics subsystem for Faultline.
//!
//! This crate implements the core of the fault-injection service:
//! - [`RuleStore`]: in-memory repository of injection rules
//! - [`RuleEngine`]: fast, concurrency-safe rule matching and evaluation
//! - [`StatsStore`]: bounded, time-windowed injection statistics
//! - [`ErrorInjector`]: the orchestrator tying the three together and
//!   executing side-effecting actions
//!
//! The evaluation path holds no lock across an await and never blocks on
//! statistics I/O; event recording goes through a bounded queue drained by a
//! dedicated worker task.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;
pub mod injector;
pub mod metrics;
pub mod stats;
pub mod store;

pub use engine::RuleEngine;
pub use injector::ErrorInjector;
pub use stats::{StatsSink, StatsStore};
pub use store::RuleStore;
