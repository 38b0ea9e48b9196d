// Copyright 2026 Faultline Dev
// SPDX-License-Identifier: Apache-2.0

//! Rule matching and evaluation.
//!
//! The engine keeps its own authoritative copy of the active rule set,
//! synchronized write-through by the orchestrator. [`RuleEngine::evaluate`]
//! runs on every monitored request, so the read path takes the lock only to
//! snapshot candidates and never blocks on store I/O.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use tracing::{debug, trace};

use faultline_core::{ConditionType, Error, ErrorAction, ErrorCondition, ErrorRule, Result};

/// A rule plus the engine-side state that must survive updates: the
/// insertion sequence used for deterministic tie-breaking and the live
/// trigger counter.
struct EngineRule {
    rule: ErrorRule,
    seq: u64,
    triggers: AtomicU64,
}

impl EngineRule {
    /// Returns whether the rule has used up its trigger budget.
    fn exhausted(&self) -> bool {
        self.rule.max_triggers > 0 && self.triggers.load(Ordering::SeqCst) >= self.rule.max_triggers
    }

    /// Atomically claims one trigger slot.
    ///
    /// With `max_triggers = 0` the counter only tracks usage and the claim
    /// always succeeds. Otherwise the check and the increment are a single
    /// atomic step, so a rule with `max_triggers = n` matches exactly `n`
    /// times even under concurrent evaluation.
    fn try_claim(&self) -> bool {
        if self.rule.max_triggers == 0 {
            self.triggers.fetch_add(1, Ordering::SeqCst);
            return true;
        }
        let max = self.rule.max_triggers;
        self.triggers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current < max).then_some(current + 1)
            })
            .is_ok()
    }
}

/// Evaluates fault-injection rules for (service, operation) pairs.
///
/// All operations are safe to call from any thread.
#[derive(Default)]
pub struct RuleEngine {
    rules: RwLock<HashMap<String, Arc<EngineRule>>>,
    next_seq: AtomicU64,
}

impl RuleEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule for evaluation.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a rule with the same id is already
    /// registered.
    pub fn add_rule(&self, rule: ErrorRule) -> Result<()> {
        let mut rules = self.rules.write();
        if rules.contains_key(&rule.id) {
            return Err(Error::validation(format!("rule already registered: {}", rule.id)));
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        debug!(rule_id = %rule.id, rule_name = %rule.name, service = %rule.service, "Registering rule");
        rules.insert(
            rule.id.clone(),
            Arc::new(EngineRule { rule, seq, triggers: AtomicU64::new(0) }),
        );
        Ok(())
    }

    /// Removes a rule from evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is absent.
    pub fn remove_rule(&self, id: &str) -> Result<()> {
        match self.rules.write().remove(id) {
            Some(_) => {
                debug!(rule_id = %id, "Removed rule from engine");
                Ok(())
            }
            None => Err(Error::not_found(id)),
        }
    }

    /// Replaces a registered rule.
    ///
    /// The insertion sequence and trigger counter carry over: an updated
    /// rule keeps its place in tie-breaking and its used trigger budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is absent.
    pub fn update_rule(&self, rule: ErrorRule) -> Result<()> {
        let mut rules = self.rules.write();
        match rules.get_mut(&rule.id) {
            Some(entry) => {
                let seq = entry.seq;
                let triggers = entry.triggers.load(Ordering::SeqCst);
                *entry = Arc::new(EngineRule {
                    rule,
                    seq,
                    triggers: AtomicU64::new(triggers),
                });
                Ok(())
            }
            None => Err(Error::not_found(&rule.id)),
        }
    }

    /// Returns the live trigger count for a rule, if registered.
    #[must_use]
    pub fn trigger_count(&self, id: &str) -> Option<u64> {
        self.rules.read().get(id).map(|e| e.triggers.load(Ordering::SeqCst))
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    /// Returns whether no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// Evaluates the rule set for one inbound operation.
    ///
    /// Candidates are the enabled rules targeting `service` whose operation
    /// is empty or equals `operation`, minus rules with an exhausted trigger
    /// budget. They are tried in `(priority, insertion order)` order; the
    /// first rule whose conditions all pass claims a trigger slot and its
    /// action is returned. Losing the claim race (another evaluation took
    /// the last slot) falls through to the next candidate.
    ///
    /// `metadata` carries request attributes extracted by the caller
    /// (documented keys: `user_agent`, `remote_addr`). No current condition
    /// type consumes it.
    #[must_use]
    pub fn evaluate(
        &self,
        service: &str,
        operation: &str,
        metadata: &HashMap<String, String>,
    ) -> Option<ErrorAction> {
        let _ = metadata;

        // Snapshot candidates, then release the lock before drawing.
        let mut candidates: Vec<Arc<EngineRule>> = {
            let rules = self.rules.read();
            rules
                .values()
                .filter(|e| e.rule.enabled && e.rule.applies_to(service, operation))
                .filter(|e| !e.exhausted())
                .cloned()
                .collect()
        };
        if candidates.is_empty() {
            return None;
        }
        candidates.sort_by_key(|e| (e.rule.priority, e.seq));

        let mut rng = rand::thread_rng();
        for entry in candidates {
            if !entry.rule.conditions.iter().all(|c| condition_passes(c, &mut rng)) {
                trace!(rule_id = %entry.rule.id, service = service, "Conditions did not pass");
                continue;
            }
            if !entry.try_claim() {
                continue;
            }
            debug!(
                rule_id = %entry.rule.id,
                rule_name = %entry.rule.name,
                service = service,
                operation = operation,
                action = entry.rule.action.kind().as_str(),
                "Rule matched"
            );
            return Some(entry.rule.action.clone());
        }
        None
    }
}

/// Evaluates one condition.
///
/// "eq" is the only operator the platform produces for probability
/// conditions; it reads as "a uniform [0,1) draw is less than `value`".
fn condition_passes(condition: &ErrorCondition, rng: &mut impl Rng) -> bool {
    match condition.condition_type {
        ConditionType::Probability => rng.gen::<f64>() < condition.value,
    }
}
