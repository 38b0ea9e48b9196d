// Copyright 2026 Faultline Dev
// SPDX-License-Identifier: Apache-2.0

//! Error types for Faultline.
//!
//! The taxonomy distinguishes administrative failures (validation, capacity,
//! not-found) from the simulated faults the injector returns on purpose.
//! Simulated faults are shaped like genuine failures of their kind.

use thiserror::Error;

/// A specialized `Result` type for Faultline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during Faultline operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A rule failed validation and was not persisted.
    #[error("invalid rule: {0}")]
    Validation(String),

    /// The rule count is at the configured ceiling.
    #[error("maximum number of rules reached: {limit}")]
    Capacity {
        /// The configured rule ceiling.
        limit: usize,
    },

    /// No rule with the given id exists.
    #[error("rule not found: {id}")]
    NotFound {
        /// The missing rule id.
        id: String,
    },

    /// The rule store and rule engine diverged during a mutation.
    #[error("rule engine inconsistency: {0}")]
    Consistency(String),

    /// A deliberately injected network fault.
    #[error("network error injected: {0}")]
    Network(String),

    /// A deliberately injected database fault.
    #[error("database error injected: {0}")]
    Database(String),

    /// A deliberately injected storage fault.
    #[error("storage error injected: {0}")]
    Storage(String),

    /// A delay injection was interrupted by caller cancellation.
    #[error("delay injection cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a not-found error for the given rule id.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Returns whether this error is a deliberately injected fault rather
    /// than a failure of the service itself.
    #[must_use]
    pub const fn is_injected(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Database(_) | Self::Storage(_))
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Config(_) => 400,
            Self::NotFound { .. } => 404,
            Self::Cancelled => 408,
            Self::Capacity { .. } => 429,
            Self::Consistency(_) | Self::Io(_) => 500,
            Self::Network(_) | Self::Database(_) | Self::Storage(_) => 502,
        }
    }
}
