//! API router configuration.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use faultline_engine::ErrorInjector;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers::{health, inject, rules, stats, AppState};
use crate::middleware::metrics_layer;

/// Creates the API router.
#[must_use]
pub fn create_router(injector: Arc<ErrorInjector>, log_requests: bool) -> Router {
    let state = AppState { injector };

    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/errors/rules", post(rules::create_rule).get(rules::list_rules))
        .route(
            "/errors/rules/{id}",
            get(rules::get_rule).put(rules::update_rule).delete(rules::delete_rule),
        )
        .route("/errors/should-inject", post(inject::should_inject))
        .route("/errors/inject", post(inject::inject))
        .route("/errors/stats", get(stats::get_stats).delete(stats::reset_stats))
        .with_state(state)
        .layer(axum::middleware::from_fn(metrics_layer));

    if log_requests {
        router = router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );
    }

    router
}
