// Copyright 2026 Faultline Dev
// SPDX-License-Identifier: Apache-2.0

//! Engine metrics definitions.
//!
//! Prometheus-compatible counters and gauges for rule management and
//! injection activity.

use metrics::{counter, describe_counter, describe_gauge, gauge};

use faultline_core::ActionKind;

/// Initialize metric descriptions (call once at startup).
pub fn init_engine_metrics() {
    describe_gauge!("faultline_rules_total", "Total number of registered rules");
    describe_gauge!("faultline_rules_active", "Number of enabled rules");
    describe_counter!(
        "faultline_injections_total",
        "Total number of injected errors by service and action"
    );
    describe_counter!(
        "faultline_validation_failures_total",
        "Total number of rejected rule submissions"
    );
    describe_counter!(
        "faultline_stats_events_dropped_total",
        "Injection events dropped because the statistics queue was full"
    );
}

/// Record one triggered injection.
pub fn record_injection(service: &str, action: ActionKind) {
    counter!("faultline_injections_total",
        "service" => service.to_string(),
        "action" => action.as_str()
    )
    .increment(1);
}

/// Record a rejected rule submission.
pub fn record_validation_failure() {
    counter!("faultline_validation_failures_total").increment(1);
}

/// Record an injection event dropped on statistics-queue overflow.
pub fn record_stats_drop() {
    counter!("faultline_stats_events_dropped_total").increment(1);
}

/// Publish the current rule counts.
pub fn record_rule_counts(total: u64, active: u64) {
    gauge!("faultline_rules_total").set(total as f64);
    gauge!("faultline_rules_active").set(active as f64);
}
