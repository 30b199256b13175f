//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check guard options: positive threshold, decay amount iff decay
//! - Check the demo sensor list: unique names, non-zero intervals, mode agreement
//!
//! Validation is a pure function that returns every error, not just the first.

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{DemoConfig, GuardConfig, ResetStrategy};
use crate::guard::{GuardSettings, ResetPolicy};

/// A single semantic problem found in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("threshold must be a positive integer")]
    ThresholdNotPositive,

    #[error("decay_amount is required when reset_strategy = \"decay\"")]
    MissingDecayAmount,

    #[error("decay_amount must be a positive integer")]
    DecayAmountNotPositive,

    #[error("duplicate sensor name {0:?}")]
    DuplicateSensor(String),

    #[error("sensor {0:?}: minimum_interval_secs must be greater than zero")]
    ZeroInterval(String),

    #[error("scheduler.tick_scale must be greater than zero")]
    ZeroTickScale,

    #[error("sensor {sensor:?}: per_key = {configured} but its script {requires} tracked sections")]
    PerKeyMismatch {
        sensor: String,
        configured: bool,
        requires: &'static str,
    },

    #[error("sensor {sensor:?}: {error}")]
    Sensor {
        sensor: String,
        error: Box<ValidationError>,
    },
}

/// Validate guard options and turn them into settings.
pub fn validate_guard(config: &GuardConfig) -> Result<GuardSettings, Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.threshold == 0 {
        errors.push(ValidationError::ThresholdNotPositive);
    }

    let policy = match config.reset_strategy {
        ResetStrategy::Full => {
            if let Some(amount) = config.decay_amount {
                tracing::debug!(decay_amount = amount, "decay_amount ignored for full reset");
            }
            ResetPolicy::Full
        }
        ResetStrategy::Decay => match config.decay_amount {
            None => {
                errors.push(ValidationError::MissingDecayAmount);
                ResetPolicy::Full
            }
            Some(0) => {
                errors.push(ValidationError::DecayAmountNotPositive);
                ResetPolicy::Full
            }
            Some(amount) => ResetPolicy::Decay { amount },
        },
    };

    if errors.is_empty() {
        Ok(GuardSettings::from_validated(config.threshold, policy))
    } else {
        Err(errors)
    }
}

/// Validate the full demo configuration.
pub fn validate_config(config: &DemoConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.scheduler.tick_scale == 0 {
        errors.push(ValidationError::ZeroTickScale);
    }

    let mut seen = HashSet::new();
    for sensor in &config.sensors {
        if !seen.insert(sensor.name.as_str()) {
            errors.push(ValidationError::DuplicateSensor(sensor.name.clone()));
        }

        if sensor.minimum_interval_secs == 0 {
            errors.push(ValidationError::ZeroInterval(sensor.name.clone()));
        }

        if sensor.guard.per_key != sensor.script.is_tracked() {
            errors.push(ValidationError::PerKeyMismatch {
                sensor: sensor.name.clone(),
                configured: sensor.guard.per_key,
                requires: if sensor.script.is_tracked() { "requires" } else { "does not use" },
            });
        }

        if let Err(guard_errors) = validate_guard(&sensor.guard) {
            errors.extend(guard_errors.into_iter().map(|error| ValidationError::Sensor {
                sensor: sensor.name.clone(),
                error: Box::new(error),
            }));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
