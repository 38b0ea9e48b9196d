// Copyright 2026 Faultline Dev
// SPDX-License-Identifier: Apache-2.0

//! Injection orchestration.
//!
//! [`ErrorInjector`] validates and administers rules, keeps the
//! [`RuleStore`] and [`RuleEngine`] consistent, runs the
//! evaluate → record → report workflow, and executes the side-effecting
//! actions (delay, synthetic network/database/storage failures).
//!
//! Statistics recording is decoupled from the evaluation path: matched
//! events go onto a bounded queue drained by a dedicated worker task, and a
//! full queue drops the new event rather than blocking the caller.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use faultline_core::{
    Config, Error, ErrorAction, ErrorCondition, ErrorEvent, ErrorRule, ErrorStats, Result,
};

use crate::engine::RuleEngine;
use crate::metrics::{
    record_injection, record_rule_counts, record_stats_drop, record_validation_failure,
};
use crate::stats::StatsSink;
use crate::store::RuleStore;

/// Orchestrates rule administration, evaluation, and action execution.
pub struct ErrorInjector {
    config: Config,
    store: Arc<RuleStore>,
    engine: Arc<RuleEngine>,
    stats: Arc<dyn StatsSink>,
    events_tx: mpsc::Sender<ErrorEvent>,
}

impl ErrorInjector {
    /// Creates an injector and spawns its statistics worker.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(
        config: Config,
        store: Arc<RuleStore>,
        engine: Arc<RuleEngine>,
        stats: Arc<dyn StatsSink>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(config.engine.stats_queue_size);
        tokio::spawn(Self::stats_worker(events_rx, stats.clone()));
        Self { config, store, engine, stats, events_tx }
    }

    /// Returns the configuration this injector runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drains the statistics queue into the sink.
    ///
    /// Recording failures are logged and swallowed; they must never surface
    /// to a monitored request. The worker stops when the injector is
    /// dropped and the queue closes.
    async fn stats_worker(mut events_rx: mpsc::Receiver<ErrorEvent>, sink: Arc<dyn StatsSink>) {
        while let Some(event) = events_rx.recv().await {
            if let Err(e) = sink.record_event(event).await {
                warn!(error = %e, "Failed to record error event");
            }
        }
        debug!("Statistics worker stopped");
    }

    // =========================================================================
    // Rule administration
    // =========================================================================

    /// Adds an error rule.
    ///
    /// Validates the rule, enforces the rule ceiling, assigns an id if the
    /// submission carries none, applies the configured default probability
    /// to condition-less rules, and writes through to both the store and
    /// the engine. If the engine write fails the store write is rolled back
    /// so at most one of the two holds the rule.
    ///
    /// Returns the stored rule, with server-assigned id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for invalid rules and
    /// [`Error::Capacity`] when the ceiling is reached.
    pub fn add_rule(&self, mut rule: ErrorRule) -> Result<ErrorRule> {
        info!(rule_name = %rule.name, service = %rule.service, "Adding error rule");

        if let Err(e) = self.validate_rule(&rule) {
            warn!(rule_name = %rule.name, error = %e, "Invalid rule");
            record_validation_failure();
            return Err(e);
        }

        let limit = self.config.engine.max_rules;
        if self.store.count() >= limit {
            warn!(limit = limit, "Rule ceiling reached");
            return Err(Error::Capacity { limit });
        }

        if rule.id.is_empty() {
            rule.id = Uuid::new_v4().to_string();
        }
        if rule.conditions.is_empty() {
            // A rule submitted without conditions gets the configured
            // default probability instead of firing on every call.
            rule.conditions
                .push(ErrorCondition::probability(self.config.engine.default_probability));
        }
        let now = chrono::Utc::now();
        rule.created_at = now;
        rule.updated_at = now;
        rule.trigger_count = 0;

        self.store.add(rule.clone())?;

        if let Err(engine_err) = self.engine.add_rule(rule.clone()) {
            error!(rule_id = %rule.id, error = %engine_err, "Failed to add rule to engine, rolling back store");
            if let Err(rollback_err) = self.store.delete(&rule.id) {
                // The store now holds a rule the engine does not know about.
                error!(
                    rule_id = %rule.id,
                    error = %rollback_err,
                    "Compensating delete failed; store and engine have diverged"
                );
            }
            return Err(engine_err);
        }

        self.refresh_rule_counts();
        info!(rule_id = %rule.id, rule_name = %rule.name, "Error rule added");
        Ok(rule)
    }

    /// Updates an existing error rule.
    ///
    /// The creation timestamp of the stored rule is preserved; the update
    /// timestamp is refreshed. Writes through to both store and engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for invalid rules and
    /// [`Error::NotFound`] if the id is absent.
    pub fn update_rule(&self, mut rule: ErrorRule) -> Result<ErrorRule> {
        info!(rule_id = %rule.id, rule_name = %rule.name, "Updating error rule");

        if rule.id.is_empty() {
            return Err(Error::validation("rule id is required"));
        }
        if let Err(e) = self.validate_rule(&rule) {
            record_validation_failure();
            return Err(e);
        }

        let existing = self.store.get(&rule.id)?;
        rule.created_at = existing.created_at;
        rule.updated_at = chrono::Utc::now();

        self.store.update(rule.clone())?;
        if let Err(e) = self.engine.update_rule(rule.clone()) {
            error!(rule_id = %rule.id, error = %e, "Failed to update rule in engine");
            return Err(e);
        }

        self.refresh_rule_counts();
        Ok(rule)
    }

    /// Removes an error rule.
    ///
    /// The store is the source of truth for administrative listing; a
    /// failure to remove from the engine is logged but does not block the
    /// removal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is absent from the store.
    pub fn remove_rule(&self, id: &str) -> Result<()> {
        info!(rule_id = %id, "Removing error rule");

        self.store.delete(id)?;
        if let Err(e) = self.engine.remove_rule(id) {
            warn!(rule_id = %id, error = %e, "Failed to remove rule from engine");
        }

        self.refresh_rule_counts();
        Ok(())
    }

    /// Returns the rule with the given id, with its live trigger count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is absent.
    pub fn get_rule(&self, id: &str) -> Result<ErrorRule> {
        let mut rule = self.store.get(id)?;
        if let Some(triggers) = self.engine.trigger_count(id) {
            rule.trigger_count = triggers;
        }
        Ok(rule)
    }

    /// Lists all rules in insertion order, with live trigger counts.
    #[must_use]
    pub fn list_rules(&self) -> Vec<ErrorRule> {
        let mut rules = self.store.list();
        for rule in &mut rules {
            if let Some(triggers) = self.engine.trigger_count(&rule.id) {
                rule.trigger_count = triggers;
            }
        }
        rules
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Decides whether the given operation should fail.
    ///
    /// Delegates to the rule engine; on a match the injection event is
    /// queued for the statistics worker without blocking. `metadata`
    /// carries request attributes (documented keys: `user_agent`,
    /// `remote_addr`).
    #[must_use]
    pub fn should_inject(
        &self,
        service: &str,
        operation: &str,
        metadata: &HashMap<String, String>,
    ) -> Option<ErrorAction> {
        let global = self.config.injection.global_probability;
        if global < 1.0 && rand::thread_rng().gen::<f64>() >= global {
            return None;
        }

        let action = self.engine.evaluate(service, operation, metadata)?;

        debug!(
            service = service,
            operation = operation,
            action = action.kind().as_str(),
            "Error injection triggered"
        );
        record_injection(service, action.kind());

        if self.config.engine.enable_statistics {
            let event = ErrorEvent::new(service, operation, action.clone());
            match self.events_tx.try_send(event) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // Drop-newest: evaluation must not wait for statistics.
                    record_stats_drop();
                    warn!(service = service, "Statistics queue full, dropping event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!("Statistics worker gone, dropping event");
                }
            }
        }

        Some(action)
    }

    // =========================================================================
    // Action execution
    // =========================================================================

    /// Executes a side-effecting action.
    ///
    /// Equivalent to [`inject_with_cancel`](Self::inject_with_cancel) with
    /// a cancellation signal that never fires.
    ///
    /// # Errors
    ///
    /// See [`inject_with_cancel`](Self::inject_with_cancel).
    pub async fn inject(&self, action: &ErrorAction) -> Result<()> {
        self.inject_with_cancel(action, std::future::pending()).await
    }

    /// Executes a side-effecting action, aborting a delay when `cancel`
    /// resolves.
    ///
    /// Delay actions suspend the calling path for the configured duration
    /// or until `cancel` fires, whichever comes first. Synthetic
    /// network/database/storage failures are returned as errors when their
    /// category is enabled in configuration and are no-ops otherwise. HTTP
    /// error actions are always a no-op here: only the caller owns the
    /// response. Timeout, corruption, and disconnect actions are applied by
    /// the caller, not the injector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] for an interrupted delay, the matching
    /// injected-fault variant for enabled synthetic failures, and
    /// [`Error::Validation`] for caller-applied action kinds.
    pub async fn inject_with_cancel(
        &self,
        action: &ErrorAction,
        cancel: impl Future<Output = ()> + Send,
    ) -> Result<()> {
        debug!(action = action.kind().as_str(), "Injecting error");

        match action {
            ErrorAction::Delay { delay_ms } => {
                self.inject_delay(Duration::from_millis(*delay_ms), cancel).await
            }
            ErrorAction::HttpError { .. } => Ok(()),
            ErrorAction::NetworkError { message } => {
                if !self.config.injection.enable_network_errors {
                    return Ok(());
                }
                Err(Error::Network(message.clone()))
            }
            ErrorAction::DatabaseError { message } => {
                if !self.config.injection.enable_database_errors {
                    return Ok(());
                }
                Err(Error::Database(message.clone()))
            }
            ErrorAction::StorageError { message } => {
                if !self.config.injection.enable_storage_errors {
                    return Ok(());
                }
                Err(Error::Storage(message.clone()))
            }
            ErrorAction::Timeout { .. }
            | ErrorAction::Corruption { .. }
            | ErrorAction::Disconnect { .. } => Err(Error::validation(format!(
                "unsupported action type: {}",
                action.kind()
            ))),
        }
    }

    async fn inject_delay(
        &self,
        delay: Duration,
        cancel: impl Future<Output = ()> + Send,
    ) -> Result<()> {
        debug!(delay_ms = delay.as_millis() as u64, "Injecting delay");
        tokio::select! {
            () = tokio::time::sleep(delay) => Ok(()),
            () = cancel => Err(Error::Cancelled),
        }
    }

    // =========================================================================
    // Statistics and health
    // =========================================================================

    /// Returns the aggregate injection statistics.
    ///
    /// Rule counts are refreshed from the store before reading so the
    /// report is never stale relative to rule state.
    pub async fn stats(&self) -> ErrorStats {
        let total = self.store.count() as u64;
        let active = self.store.count_active() as u64;
        record_rule_counts(total, active);
        if let Err(e) = self.stats.update_rule_counts(total, active).await {
            warn!(error = %e, "Failed to update rule counts");
        }
        self.stats.stats().await
    }

    /// Clears recorded statistics, then refreshes rule counts.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if the reset fails.
    pub async fn reset_stats(&self) -> Result<()> {
        info!("Resetting error statistics");
        self.stats.reset().await?;
        let total = self.store.count() as u64;
        let active = self.store.count_active() as u64;
        if let Err(e) = self.stats.update_rule_counts(total, active).await {
            warn!(error = %e, "Failed to update rule counts");
        }
        Ok(())
    }

    /// Verifies the rule store is reachable.
    ///
    /// # Errors
    ///
    /// Any store failure is fatal to the health probe.
    pub fn health_check(&self) -> Result<()> {
        let count = self.store.count();
        debug!(rule_count = count, "Health check passed");
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn validate_rule(&self, rule: &ErrorRule) -> Result<()> {
        if rule.name.is_empty() {
            return Err(Error::validation("rule name is required"));
        }
        if rule.service.is_empty() {
            return Err(Error::validation("target service is required"));
        }
        if let ErrorAction::HttpError { code, .. } = rule.action {
            if !(400..=599).contains(&code) {
                return Err(Error::validation(format!("invalid HTTP code: {code}")));
            }
        }
        if let Some(delay) = rule.action.delay() {
            let max = Duration::from_millis(self.config.injection.max_delay_ms);
            if delay > max {
                return Err(Error::validation(format!(
                    "delay exceeds maximum allowed: {}ms",
                    max.as_millis()
                )));
            }
        }
        for condition in &rule.conditions {
            if !(0.0..=1.0).contains(&condition.value) {
                return Err(Error::validation(format!(
                    "probability must be within [0, 1]: {}",
                    condition.value
                )));
            }
        }
        Ok(())
    }

    /// Pushes fresh rule counts to the metrics sink and, fire-and-forget,
    /// to the statistics sink.
    fn refresh_rule_counts(&self) {
        let total = self.store.count() as u64;
        let active = self.store.count_active() as u64;
        record_rule_counts(total, active);

        let sink = self.stats.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.update_rule_counts(total, active).await {
                warn!(error = %e, "Failed to update rule counts");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn injector() -> ErrorInjector {
        injector_with(Config::default())
    }

    fn injector_with(config: Config) -> ErrorInjector {
        let capacity = config.engine.stats_capacity;
        let retention = config.engine.stat_retention_hours;
        ErrorInjector::new(
            config,
            Arc::new(RuleStore::new()),
            Arc::new(RuleEngine::new()),
            Arc::new(crate::stats::StatsStore::new(capacity, retention)),
        )
    }

    fn http_rule(name: &str) -> ErrorRule {
        ErrorRule::new(
            name,
            "storage-service",
            ErrorAction::HttpError { code: 500, message: "injected".to_string() },
        )
        .with_condition(ErrorCondition::probability(1.0))
    }

    #[tokio::test]
    async fn test_add_assigns_id_and_timestamps() {
        let injector = injector();
        let added = injector.add_rule(http_rule("round trip")).unwrap();

        assert!(!added.id.is_empty());
        let fetched = injector.get_rule(&added.id).unwrap();
        assert_eq!(fetched.name, "round trip");
        assert_eq!(fetched.action, added.action);
        assert_eq!(fetched.created_at, added.created_at);
    }

    #[tokio::test]
    async fn test_add_rejects_missing_name() {
        let injector = injector();
        let result = injector.add_rule(http_rule(""));
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(injector.list_rules().is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_bad_http_code() {
        let injector = injector();
        let rule = ErrorRule::new(
            "bad code",
            "storage-service",
            ErrorAction::HttpError { code: 200, message: String::new() },
        );
        assert!(matches!(injector.add_rule(rule), Err(Error::Validation(_))));
        assert!(injector.list_rules().is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_excessive_delay() {
        let injector = injector();
        let rule = ErrorRule::new(
            "slow",
            "storage-service",
            ErrorAction::Delay { delay_ms: 120_000 },
        );
        assert!(matches!(injector.add_rule(rule), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_rejects_bad_probability() {
        let injector = injector();
        let rule = http_rule("too likely").with_condition(ErrorCondition::probability(1.5));
        assert!(matches!(injector.add_rule(rule), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_applies_default_probability() {
        let mut config = Config::default();
        config.engine.default_probability = 0.25;
        let injector = injector_with(config);

        let rule = ErrorRule::new(
            "no conditions",
            "storage-service",
            ErrorAction::NetworkError { message: String::new() },
        );
        let added = injector.add_rule(rule).unwrap();
        assert_eq!(added.conditions.len(), 1);
        assert!((added.conditions[0].value - 0.25).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_capacity_ceiling() {
        let mut config = Config::default();
        config.engine.max_rules = 2;
        let injector = injector_with(config);

        injector.add_rule(http_rule("one")).unwrap();
        injector.add_rule(http_rule("two")).unwrap();
        let result = injector.add_rule(http_rule("three"));
        assert!(matches!(result, Err(Error::Capacity { limit: 2 })));
        assert_eq!(injector.list_rules().len(), 2);
    }

    #[tokio::test]
    async fn test_update_preserves_created_at() {
        let injector = injector();
        let added = injector.add_rule(http_rule("original")).unwrap();

        let mut changed = added.clone();
        changed.name = "renamed".to_string();
        let updated = injector.update_rule(changed).unwrap();

        assert_eq!(updated.created_at, added.created_at);
        assert!(updated.updated_at >= added.updated_at);
        assert_eq!(injector.get_rule(&added.id).unwrap().name, "renamed");
    }

    #[tokio::test]
    async fn test_update_unknown_rule() {
        let injector = injector();
        let mut rule = http_rule("ghost");
        rule.id = "missing".to_string();
        assert!(matches!(injector.update_rule(rule), Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_remove_rule() {
        let injector = injector();
        let added = injector.add_rule(http_rule("short lived")).unwrap();
        injector.remove_rule(&added.id).unwrap();
        assert!(matches!(injector.get_rule(&added.id), Err(Error::NotFound { .. })));
        assert!(matches!(injector.remove_rule(&added.id), Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_should_inject_matches_and_counts() {
        let injector = injector();
        let added = injector.add_rule(http_rule("always")).unwrap();

        let meta = HashMap::new();
        let action = injector.should_inject("storage-service", "PutObject", &meta);
        assert!(action.is_some());
        assert!(injector.should_inject("metadata-service", "PutObject", &meta).is_none());

        assert_eq!(injector.get_rule(&added.id).unwrap().trigger_count, 1);
    }

    #[tokio::test]
    async fn test_inject_http_error_is_noop() {
        let injector = injector();
        let action = ErrorAction::HttpError { code: 503, message: "busy".to_string() };
        assert!(injector.inject(&action).await.is_ok());
    }

    #[tokio::test]
    async fn test_inject_network_error() {
        let injector = injector();
        let action = ErrorAction::NetworkError { message: "connection reset".to_string() };
        let err = injector.inject(&action).await.unwrap_err();
        assert!(err.is_injected());
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_inject_disabled_category_is_noop() {
        let mut config = Config::default();
        config.injection.enable_database_errors = false;
        let injector = injector_with(config);

        let action = ErrorAction::DatabaseError { message: "deadlock".to_string() };
        assert!(injector.inject(&action).await.is_ok());
    }

    #[tokio::test]
    async fn test_inject_unsupported_kind() {
        let injector = injector();
        let action = ErrorAction::Disconnect { message: String::new() };
        assert!(matches!(injector.inject(&action).await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_inject_delay_completes() {
        let injector = injector();
        let action = ErrorAction::Delay { delay_ms: 10 };
        let start = std::time::Instant::now();
        injector.inject(&action).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_inject_delay_cancelled() {
        let injector = injector();
        let action = ErrorAction::Delay { delay_ms: 60_000 };
        let start = std::time::Instant::now();
        let result = injector
            .inject_with_cancel(&action, async {
                tokio::time::sleep(Duration::from_millis(10)).await;
            })
            .await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_stats_reflect_rule_counts() {
        let injector = injector();
        injector.add_rule(http_rule("a")).unwrap();
        injector.add_rule(http_rule("b").with_enabled(false)).unwrap();

        let stats = injector.stats().await;
        assert_eq!(stats.total_rules, 2);
        assert_eq!(stats.active_rules, 1);
    }

    #[tokio::test]
    async fn test_health_check() {
        let injector = injector();
        assert!(injector.health_check().is_ok());
    }
}
