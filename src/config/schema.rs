//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::demo::Script;

/// Reset strategy name as written in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetStrategy {
    /// Clear the failure count on any success.
    #[default]
    Full,
    /// Subtract `decay_amount` from the failure count on each success.
    Decay,
}

/// Construction-time options for one guarded sensor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GuardConfig {
    /// Maximum consecutive failures still suppressed.
    pub threshold: u32,

    /// How the failure count recovers after a success.
    #[serde(default)]
    pub reset_strategy: ResetStrategy,

    /// Required when `reset_strategy = "decay"`, ignored otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay_amount: Option<u32>,

    /// Track independent counters per key through tracked sections.
    #[serde(default)]
    pub per_key: bool,
}

impl GuardConfig {
    /// Full reset, single key.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            reset_strategy: ResetStrategy::Full,
            decay_amount: None,
            per_key: false,
        }
    }

    /// Switch to decay reset by `amount`.
    pub fn decay(mut self, amount: u32) -> Self {
        self.reset_strategy = ResetStrategy::Decay;
        self.decay_amount = Some(amount);
        self
    }

    /// Enable per-key tracking.
    pub fn per_key(mut self) -> Self {
        self.per_key = true;
        self
    }
}

/// Root configuration for the demo host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Tick loop settings.
    pub scheduler: SchedulerConfig,

    /// Guarded sensors to run.
    pub sensors: Vec<SensorConfig>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            observability: ObservabilityConfig::default(),
            scheduler: SchedulerConfig::default(),
            sensors: vec![
                SensorConfig::new("always_failing_sensor", Script::AlwaysFailing, 30, GuardConfig::new(3)),
                SensorConfig::new("decay_recovery_sensor", Script::DecayRecovery, 10, GuardConfig::new(3).decay(1)),
                SensorConfig::new("flaky_sensor", Script::Flaky, 5, GuardConfig::new(3).decay(1)),
                SensorConfig::new("multi_table_sensor", Script::MultiTable, 10, GuardConfig::new(3).per_key()),
                SensorConfig::new("recovers_after_3_sensor", Script::RecoversAfter3, 30, GuardConfig::new(3)),
                SensorConfig::new("recovers_after_failure_sensor", Script::RecoversAfterFailure, 10, GuardConfig::new(3)),
            ],
        }
    }
}

/// One guarded sensor in the demo.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SensorConfig {
    /// Unique sensor name, also the cursor storage key.
    pub name: String,

    /// Which scripted failure pattern drives the sensor.
    pub script: Script,

    /// Minimum seconds between ticks.
    #[serde(default = "default_interval")]
    pub minimum_interval_secs: u64,

    /// Guard options.
    pub guard: GuardConfig,
}

impl SensorConfig {
    pub fn new(name: &str, script: Script, minimum_interval_secs: u64, guard: GuardConfig) -> Self {
        Self {
            name: name.to_string(),
            script,
            minimum_interval_secs,
            guard,
        }
    }
}

fn default_interval() -> u64 {
    30
}

/// Tick loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Stop each sensor after this many ticks (unbounded when absent).
    pub max_ticks: Option<u64>,

    /// Divide every interval by this factor, for fast local runs.
    pub tick_scale: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_ticks: None,
            tick_scale: 1,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
