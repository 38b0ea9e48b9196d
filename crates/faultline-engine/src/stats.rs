// Copyright 2026 Faultline Dev
// SPDX-License-Identifier: Apache-2.0

//! Bounded, time-windowed injection statistics.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;

use faultline_core::{ErrorEvent, ErrorStats, Result};

/// Destination for injection events and rule-count updates.
///
/// The orchestrator records through this trait so deployments (and tests)
/// can substitute the in-memory store with other sinks.
#[async_trait]
pub trait StatsSink: Send + Sync {
    /// Records one injection event.
    async fn record_event(&self, event: ErrorEvent) -> Result<()>;

    /// Returns the aggregate view over retained events.
    async fn stats(&self) -> ErrorStats;

    /// Clears all retained events.
    async fn reset(&self) -> Result<()>;

    /// Updates the live total/active rule counts reported with the stats.
    async fn update_rule_counts(&self, total: u64, active: u64) -> Result<()>;
}

struct StatsInner {
    events: VecDeque<ErrorEvent>,
    total_rules: u64,
    active_rules: u64,
}

/// In-memory statistics store.
///
/// Retains at most `capacity` events, each for at most the retention window.
/// Eviction is lazy, on write and on read; reads never include expired
/// events. Aggregates are recomputed from live events on read, which is
/// cheap at the configured capacities (default 10 000).
pub struct StatsStore {
    inner: Mutex<StatsInner>,
    capacity: usize,
    retention: Duration,
}

impl StatsStore {
    /// Creates a store retaining up to `capacity` events for
    /// `retention_hours` hours.
    #[must_use]
    pub fn new(capacity: usize, retention_hours: i64) -> Self {
        Self {
            inner: Mutex::new(StatsInner {
                events: VecDeque::with_capacity(capacity.min(1024)),
                total_rules: 0,
                active_rules: 0,
            }),
            capacity,
            retention: Duration::hours(retention_hours),
        }
    }

    fn evict_expired(&self, inner: &mut StatsInner) {
        let cutoff = Utc::now() - self.retention;
        while inner.events.front().is_some_and(|e| e.timestamp < cutoff) {
            inner.events.pop_front();
        }
    }

    fn record(&self, event: ErrorEvent) {
        let mut inner = self.inner.lock();
        self.evict_expired(&mut inner);
        while inner.events.len() >= self.capacity {
            inner.events.pop_front();
        }
        inner.events.push_back(event);
    }

    fn snapshot(&self) -> ErrorStats {
        let mut inner = self.inner.lock();
        self.evict_expired(&mut inner);

        let mut stats = ErrorStats {
            total_rules: inner.total_rules,
            active_rules: inner.active_rules,
            ..ErrorStats::default()
        };
        for event in &inner.events {
            stats.total_events += 1;
            *stats.events_by_service.entry(event.service.clone()).or_insert(0) += 1;
            *stats
                .events_by_action
                .entry(event.action.kind().as_str().to_string())
                .or_insert(0) += 1;
        }
        stats.last_event_at = inner.events.back().map(|e| e.timestamp);
        stats
    }
}

#[async_trait]
impl StatsSink for StatsStore {
    async fn record_event(&self, event: ErrorEvent) -> Result<()> {
        self.record(event);
        Ok(())
    }

    async fn stats(&self) -> ErrorStats {
        self.snapshot()
    }

    async fn reset(&self) -> Result<()> {
        self.inner.lock().events.clear();
        Ok(())
    }

    async fn update_rule_counts(&self, total: u64, active: u64) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.total_rules = total;
        inner.active_rules = active;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use faultline_core::ErrorAction;

    use super::*;

    fn event(service: &str) -> ErrorEvent {
        ErrorEvent::new(service, "PutObject", ErrorAction::Delay { delay_ms: 10 })
    }

    #[tokio::test]
    async fn test_record_and_aggregate() {
        let store = StatsStore::new(100, 24);
        store.record_event(event("storage-service")).await.unwrap();
        store.record_event(event("storage-service")).await.unwrap();
        store.record_event(event("queue-service")).await.unwrap();
        store.update_rule_counts(5, 3).await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.total_events, 3);
        assert_eq!(stats.events_by_service["storage-service"], 2);
        assert_eq!(stats.events_by_service["queue-service"], 1);
        assert_eq!(stats.events_by_action["delay"], 3);
        assert_eq!(stats.total_rules, 5);
        assert_eq!(stats.active_rules, 3);
        assert!(stats.last_event_at.is_some());
    }

    #[tokio::test]
    async fn test_capacity_bound_drops_oldest() {
        let store = StatsStore::new(3, 24);
        for i in 0..5 {
            let mut e = event("storage-service");
            e.operation = format!("op-{i}");
            store.record_event(e).await.unwrap();
        }

        let stats = store.stats().await;
        assert_eq!(stats.total_events, 3);
    }

    #[tokio::test]
    async fn test_expired_events_not_reported() {
        let store = StatsStore::new(100, 1);
        let mut old = event("storage-service");
        old.timestamp = Utc::now() - Duration::hours(2);
        store.record_event(old).await.unwrap();
        store.record_event(event("storage-service")).await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.total_events, 1);
    }

    #[tokio::test]
    async fn test_reset_keeps_rule_counts() {
        let store = StatsStore::new(100, 24);
        store.record_event(event("storage-service")).await.unwrap();
        store.update_rule_counts(2, 2).await.unwrap();

        store.reset().await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.total_events, 0);
        assert!(stats.last_event_at.is_none());
        assert_eq!(stats.total_rules, 2);
    }
}
