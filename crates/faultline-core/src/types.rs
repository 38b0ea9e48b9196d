// Copyright 2026 Faultline Dev
// SPDX-License-Identifier: Apache-2.0

//! Common types used throughout Faultline.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The concrete fault to simulate when a rule triggers.
///
/// Each variant carries only the fields it needs; unknown action types are
/// rejected at deserialization time rather than validated after the fact.
/// Delays are carried as milliseconds to keep the wire representation flat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ErrorAction {
    /// Respond with an HTTP error status. Applied by the calling service,
    /// which owns the response.
    HttpError {
        /// HTTP status code to return. Must lie in [400, 599].
        code: u16,
        /// Diagnostic payload for the simulated error.
        #[serde(default)]
        message: String,
    },
    /// Simulate a network-level failure.
    NetworkError {
        /// Diagnostic payload for the simulated error.
        #[serde(default)]
        message: String,
    },
    /// Simulate an operation timeout. Applied by the caller.
    Timeout {
        /// Diagnostic payload for the simulated error.
        #[serde(default)]
        message: String,
    },
    /// Suspend the request path for a fixed duration.
    Delay {
        /// Delay duration in milliseconds. Bounded by `injection.max_delay_ms`.
        delay_ms: u64,
    },
    /// Simulate corrupted payload data. Applied by the caller.
    Corruption {
        /// Diagnostic payload for the simulated error.
        #[serde(default)]
        message: String,
    },
    /// Simulate a dropped connection. Applied by the caller.
    Disconnect {
        /// Diagnostic payload for the simulated error.
        #[serde(default)]
        message: String,
    },
    /// Simulate a database failure.
    DatabaseError {
        /// Diagnostic payload for the simulated error.
        #[serde(default)]
        message: String,
    },
    /// Simulate a storage-backend failure.
    StorageError {
        /// Diagnostic payload for the simulated error.
        #[serde(default)]
        message: String,
    },
}

impl ErrorAction {
    /// Returns the kind tag for this action.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::HttpError { .. } => ActionKind::HttpError,
            Self::NetworkError { .. } => ActionKind::NetworkError,
            Self::Timeout { .. } => ActionKind::Timeout,
            Self::Delay { .. } => ActionKind::Delay,
            Self::Corruption { .. } => ActionKind::Corruption,
            Self::Disconnect { .. } => ActionKind::Disconnect,
            Self::DatabaseError { .. } => ActionKind::DatabaseError,
            Self::StorageError { .. } => ActionKind::StorageError,
        }
    }

    /// Returns the diagnostic message, if this action carries one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::HttpError { message, .. }
            | Self::NetworkError { message }
            | Self::Timeout { message }
            | Self::Corruption { message }
            | Self::Disconnect { message }
            | Self::DatabaseError { message }
            | Self::StorageError { message } => Some(message),
            Self::Delay { .. } => None,
        }
    }

    /// Returns the delay duration, if this is a delay action.
    #[must_use]
    pub const fn delay(&self) -> Option<Duration> {
        match self {
            Self::Delay { delay_ms } => Some(Duration::from_millis(*delay_ms)),
            _ => None,
        }
    }
}

/// Action kind tag, used for metric and statistics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// HTTP error status.
    HttpError,
    /// Network-level failure.
    NetworkError,
    /// Operation timeout.
    Timeout,
    /// Fixed delay.
    Delay,
    /// Payload corruption.
    Corruption,
    /// Dropped connection.
    Disconnect,
    /// Database failure.
    DatabaseError,
    /// Storage-backend failure.
    StorageError,
}

impl ActionKind {
    /// Returns the kind name as used in rule definitions and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HttpError => "httpError",
            Self::NetworkError => "networkError",
            Self::Timeout => "timeout",
            Self::Delay => "delay",
            Self::Corruption => "corruption",
            Self::Disconnect => "disconnect",
            Self::DatabaseError => "databaseError",
            Self::StorageError => "storageError",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The predicate family a condition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionType {
    /// Trigger with a fixed probability per evaluation.
    Probability,
}

/// A predicate gating whether a matching rule actually triggers.
///
/// All conditions on a rule must pass (logical AND). The `operator` field is
/// carried verbatim; the platform only ever produces `"eq"`, which reads as
/// "a uniform [0,1) draw is less than `value`".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCondition {
    /// The predicate family.
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    /// Comparison operator tag.
    pub operator: String,
    /// Threshold value. Probabilities must lie in [0, 1].
    pub value: f64,
}

impl ErrorCondition {
    /// Creates a probability condition with the given threshold.
    #[must_use]
    pub fn probability(value: f64) -> Self {
        Self { condition_type: ConditionType::Probability, operator: "eq".to_string(), value }
    }
}

fn default_enabled() -> bool {
    true
}

/// A named, prioritized specification of when and how to simulate a failure
/// for a given service/operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRule {
    /// Unique rule id. Empty on submission means the service generates one.
    #[serde(default)]
    pub id: String,
    /// Human-readable rule name. Required.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Target service this rule applies to.
    pub service: String,
    /// Target operation. Empty matches any operation on the service.
    #[serde(default)]
    pub operation: String,
    /// Whether the rule participates in evaluation.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Evaluation priority. Lower values are evaluated first.
    #[serde(default)]
    pub priority: i32,
    /// Conditions gating the rule. All must pass.
    #[serde(default)]
    pub conditions: Vec<ErrorCondition>,
    /// The action applied when the rule triggers.
    pub action: ErrorAction,
    /// Maximum number of triggers. 0 means unlimited.
    #[serde(default)]
    pub max_triggers: u64,
    /// Number of times the rule has triggered. Maintained by the engine;
    /// the value here is a snapshot.
    #[serde(default)]
    pub trigger_count: u64,
    /// When the rule was created.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// When the rule was last updated.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl ErrorRule {
    /// Creates an enabled rule with the given name, target service, and action.
    #[must_use]
    pub fn new(name: impl Into<String>, service: impl Into<String>, action: ErrorAction) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            name: name.into(),
            description: String::new(),
            service: service.into(),
            operation: String::new(),
            enabled: true,
            priority: 0,
            conditions: Vec::new(),
            action,
            max_triggers: 0,
            trigger_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the rule description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restricts the rule to a single operation.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    /// Sets the evaluation priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Appends a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: ErrorCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Caps the number of times the rule may trigger.
    #[must_use]
    pub fn with_max_triggers(mut self, max_triggers: u64) -> Self {
        self.max_triggers = max_triggers;
        self
    }

    /// Enables or disables the rule.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns whether the rule applies to the given service/operation pair.
    #[must_use]
    pub fn applies_to(&self, service: &str, operation: &str) -> bool {
        self.service == service && (self.operation.is_empty() || self.operation == operation)
    }
}

/// The record of one trigger: which rule action was applied where and when.
///
/// Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Unique event id.
    pub id: String,
    /// Service the injection targeted.
    pub service: String,
    /// Operation the injection targeted.
    pub operation: String,
    /// The action that was applied.
    pub action: ErrorAction,
    /// When the injection happened.
    pub timestamp: DateTime<Utc>,
    /// Whether the injection was applied successfully.
    pub success: bool,
}

impl ErrorEvent {
    /// Creates a successful injection event stamped with a fresh id and the
    /// current time.
    #[must_use]
    pub fn new(
        service: impl Into<String>,
        operation: impl Into<String>,
        action: ErrorAction,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            service: service.into(),
            operation: operation.into(),
            action,
            timestamp: Utc::now(),
            success: true,
        }
    }
}

/// Aggregate view over recorded injection events plus live rule counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    /// Number of events within the retention window.
    pub total_events: u64,
    /// Event counts keyed by target service.
    pub events_by_service: HashMap<String, u64>,
    /// Event counts keyed by action kind.
    pub events_by_action: HashMap<String, u64>,
    /// Total rules currently registered.
    pub total_rules: u64,
    /// Rules currently enabled.
    pub active_rules: u64,
    /// Timestamp of the most recent event, if any.
    pub last_event_at: Option<DateTime<Utc>>,
}
