// Copyright 2026 Faultline Dev
// SPDX-License-Identifier: Apache-2.0

//! In-memory rule repository.
//!
//! The store owns the administrative view of the rule set: listing, counting,
//! and CRUD by id. The [`RuleEngine`](crate::RuleEngine) keeps its own copy
//! optimized for evaluation; the orchestrator keeps the two in sync.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use faultline_core::{Error, ErrorRule, Result};

struct StoredRule {
    rule: ErrorRule,
    /// Insertion sequence, kept for stable list ordering.
    seq: u64,
}

/// Thread-safe in-memory repository of error rules.
///
/// A single lock guards the index; mutations serialize, reads run
/// concurrently. Rule volumes are expected in the tens to low thousands, so
/// no finer-grained sharding is needed.
#[derive(Default)]
pub struct RuleStore {
    rules: RwLock<HashMap<String, StoredRule>>,
    next_seq: AtomicU64,
}

impl RuleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a rule under its id.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a rule with the same id already exists.
    pub fn add(&self, rule: ErrorRule) -> Result<()> {
        let mut rules = self.rules.write();
        if rules.contains_key(&rule.id) {
            return Err(Error::validation(format!("rule already exists: {}", rule.id)));
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        rules.insert(rule.id.clone(), StoredRule { rule, seq });
        Ok(())
    }

    /// Returns a copy of the rule with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is absent.
    pub fn get(&self, id: &str) -> Result<ErrorRule> {
        self.rules.read().get(id).map(|s| s.rule.clone()).ok_or_else(|| Error::not_found(id))
    }

    /// Replaces the stored rule with the same id, preserving its insertion
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is absent.
    pub fn update(&self, rule: ErrorRule) -> Result<()> {
        let mut rules = self.rules.write();
        match rules.get_mut(&rule.id) {
            Some(stored) => {
                stored.rule = rule;
                Ok(())
            }
            None => Err(Error::not_found(&rule.id)),
        }
    }

    /// Removes the rule with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is absent.
    pub fn delete(&self, id: &str) -> Result<()> {
        match self.rules.write().remove(id) {
            Some(_) => Ok(()),
            None => Err(Error::not_found(id)),
        }
    }

    /// Returns all rules in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<ErrorRule> {
        let rules = self.rules.read();
        let mut entries: Vec<_> = rules.values().collect();
        entries.sort_by_key(|s| s.seq);
        entries.iter().map(|s| s.rule.clone()).collect()
    }

    /// Returns the number of stored rules.
    #[must_use]
    pub fn count(&self) -> usize {
        self.rules.read().len()
    }

    /// Returns the number of enabled rules.
    #[must_use]
    pub fn count_active(&self) -> usize {
        self.rules.read().values().filter(|s| s.rule.enabled).count()
    }
}
