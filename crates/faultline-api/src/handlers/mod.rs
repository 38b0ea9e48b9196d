//! API request handlers.

use std::sync::Arc;

use faultline_engine::ErrorInjector;

pub mod health;
pub mod inject;
pub mod rules;
pub mod stats;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The injection orchestrator.
    pub injector: Arc<ErrorInjector>,
}
