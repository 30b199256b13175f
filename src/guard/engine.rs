//! Guard decision logic.
//!
//! # Responsibilities
//! - Run one section of work exactly once per evaluation
//! - Increment the key's counter on failure, apply the reset policy on success
//! - Decide whether a failure is suppressed or breaches the threshold

use crate::config::{validate_guard, GuardConfig, ResetStrategy, ValidationError};
use crate::guard::decision::Decision;
use crate::guard::policy::ResetPolicy;
use crate::guard::state::GuardState;

/// Key used when a sensor is guarded as a single unit.
pub const DEFAULT_KEY: &str = "__default__";

/// Validated threshold and reset policy for one guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardSettings {
    threshold: u32,
    policy: ResetPolicy,
}

impl GuardSettings {
    /// Validate a threshold / policy pair.
    pub fn new(threshold: u32, policy: ResetPolicy) -> Result<Self, Vec<ValidationError>> {
        let (reset_strategy, decay_amount) = match policy {
            ResetPolicy::Full => (ResetStrategy::Full, None),
            ResetPolicy::Decay { amount } => (ResetStrategy::Decay, Some(amount)),
        };
        validate_guard(&GuardConfig {
            threshold,
            reset_strategy,
            decay_amount,
            per_key: false,
        })
    }

    /// Construct without validation. Callers must already have checked
    /// `threshold > 0` and a non-zero decay amount.
    pub(crate) fn from_validated(threshold: u32, policy: ResetPolicy) -> Self {
        Self { threshold, policy }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn policy(&self) -> ResetPolicy {
        self.policy
    }
}

/// Owns one sensor's counters and evaluates sections of work against them.
#[derive(Debug, Clone)]
pub struct Guard {
    settings: GuardSettings,
    state: GuardState,
}

impl Guard {
    /// Create a guard over previously persisted state.
    pub fn new(settings: GuardSettings, state: GuardState) -> Self {
        Self { settings, state }
    }

    pub fn threshold(&self) -> u32 {
        self.settings.threshold
    }

    pub fn policy(&self) -> ResetPolicy {
        self.settings.policy
    }

    pub fn settings(&self) -> GuardSettings {
        self.settings
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn into_state(self) -> GuardState {
        self.state
    }

    /// Run `work` once and update the counter for `key` from its outcome.
    ///
    /// Not idempotent: every call executes `work` and moves the counter.
    pub fn evaluate<T, E, F>(&mut self, key: &str, work: F) -> Decision<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        match work() {
            Ok(value) => {
                self.record_success(key);
                Decision::Succeeded(value)
            }
            Err(error) => {
                let count = self.record_failure(key);
                let threshold = self.settings.threshold;
                if count > threshold {
                    Decision::Breached { error, count, threshold }
                } else {
                    Decision::Suppressed { count, threshold }
                }
            }
        }
    }

    /// Apply the reset policy to `key`, returning the new count.
    pub fn record_success(&mut self, key: &str) -> u32 {
        let previous = self.state.count(key);
        let count = self.settings.policy.apply(previous);
        self.state.set(key, count);
        if previous > 0 {
            tracing::debug!(key, previous, count, policy = %self.settings.policy, "Failure count reduced");
        }
        count
    }

    /// Add one consecutive failure to `key`, returning the new count.
    pub fn record_failure(&mut self, key: &str) -> u32 {
        let count = self.state.count(key).saturating_add(1);
        self.state.set(key, count);
        tracing::debug!(key, count, threshold = self.settings.threshold, "Failure counted");
        count
    }
}
