//! Scripted sensors.
//!
//! | script                   | guard                 | pattern                                  |
//! |--------------------------|-----------------------|------------------------------------------|
//! | `always_failing`         | threshold 3           | fails every tick                         |
//! | `flaky`                  | threshold 3, decay 1  | F,S, FF,S, F,S, FFF,S, FFFF,S then S     |
//! | `recovers_after_3`       | threshold 3           | three warm-up failures, then healthy     |
//! | `recovers_after_failure` | threshold 3           | F,F,F,F,S,F,S then S                     |
//! | `decay_recovery`         | threshold 3, decay 1  | five failures, then S                    |
//! | `multi_table`            | threshold 3, per key  | `orders` always S, `inventory` 4 F then S |

use std::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, GuardConfig, SensorConfig};
use crate::sensor::{HostSensor, ResilientSensor, RunRequest, SensorContext, TickOutput};

const FLAKY_SCRIPT: &[bool] = &[
    false, true,
    false, false, true,
    false, true,
    false, false, false, true,
    false, false, false, false, true,
];

const RECOVERY_SCRIPT: &[bool] = &[false, false, false, false, true, false, true];

const DECAY_SCRIPT: &[bool] = &[false, false, false, false, false];

const INVENTORY_SCRIPT: &[bool] = &[false, false, false, false];

const WARM_UP_FAILURES: u32 = 3;

/// Errors raised by the scripted sensors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DemoError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Which scripted pattern a demo sensor follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    AlwaysFailing,
    Flaky,
    #[serde(rename = "recovers_after_3")]
    RecoversAfter3,
    RecoversAfterFailure,
    DecayRecovery,
    MultiTable,
}

impl Script {
    /// Whether the script encloses its work in tracked sections.
    pub fn is_tracked(&self) -> bool {
        matches!(self, Script::MultiTable)
    }
}

/// Replays a fail/succeed pattern, succeeding forever once it runs out.
#[derive(Debug, Clone)]
struct Playback {
    script: &'static [bool],
    position: usize,
}

impl Playback {
    fn new(script: &'static [bool]) -> Self {
        Self { script, position: 0 }
    }

    /// Advance one tick. Returns the 1-based tick number and whether it succeeds.
    fn next(&mut self) -> (usize, bool) {
        let position = self.position;
        self.position += 1;
        let succeeds = self.script.get(position).copied().unwrap_or(true);
        (position + 1, succeeds)
    }
}

/// Emit `{prefix}-{n}` for the current cursor index and advance the cursor.
fn advance(ctx: &mut SensorContext, prefix: &str) -> TickOutput {
    let index = ctx.cursor_index();
    ctx.update_cursor((index + 1).to_string());
    TickOutput::from(RunRequest::new().with_run_key(format!("{prefix}-{index}")))
}

pub fn always_failing(name: &str, guard: &GuardConfig) -> Result<ResilientSensor<DemoError>, ConfigError> {
    ResilientSensor::single(name, guard, |_ctx| {
        Err(DemoError::Connection("Simulated external service unreachable".into()))
    })
}

pub fn flaky(name: &str, guard: &GuardConfig) -> Result<ResilientSensor<DemoError>, ConfigError> {
    let mut playback = Playback::new(FLAKY_SCRIPT);
    ResilientSensor::single(name, guard, move |ctx| match playback.next() {
        (_, false) => Err(DemoError::Connection("Simulated intermittent timeout".into())),
        (_, true) => Ok(advance(ctx, "flaky")),
    })
}

pub fn recovers_after_3(name: &str, guard: &GuardConfig) -> Result<ResilientSensor<DemoError>, ConfigError> {
    let mut remaining = WARM_UP_FAILURES;
    ResilientSensor::single(name, guard, move |_ctx| {
        if remaining > 0 {
            remaining -= 1;
            return Err(DemoError::Runtime(format!(
                "Service warming up ({remaining} failures left)"
            )));
        }
        Ok(TickOutput::skip("Service is healthy, nothing to process"))
    })
}

pub fn recovers_after_failure(name: &str, guard: &GuardConfig) -> Result<ResilientSensor<DemoError>, ConfigError> {
    let mut playback = Playback::new(RECOVERY_SCRIPT);
    ResilientSensor::single(name, guard, move |ctx| match playback.next() {
        (tick, false) => Err(DemoError::Runtime(format!("Service unavailable (tick {tick})"))),
        (_, true) => Ok(advance(ctx, "recovery")),
    })
}

pub fn decay_recovery(name: &str, guard: &GuardConfig) -> Result<ResilientSensor<DemoError>, ConfigError> {
    let mut playback = Playback::new(DECAY_SCRIPT);
    ResilientSensor::single(name, guard, move |ctx| match playback.next() {
        (tick, false) => Err(DemoError::Connection(format!("Simulated upstream outage (tick {tick})"))),
        (_, true) => Ok(advance(ctx, "decay")),
    })
}

/// Two tables polled in one tick; `inventory` runs last so its breach
/// never prevents `orders` from registering a run.
pub fn multi_table(name: &str, guard: &GuardConfig) -> Result<ResilientSensor<DemoError>, ConfigError> {
    let mut inventory = Playback::new(INVENTORY_SCRIPT);
    ResilientSensor::tracked(name, guard, move |ctx, tracker| {
        let index = ctx.cursor_index();

        tracker.track(ctx, "orders", |ctx| {
            ctx.request_run(
                RunRequest::new()
                    .with_run_key(format!("orders-{index}"))
                    .with_tag("table", "orders"),
            );
            Ok::<_, DemoError>(())
        })?;

        let (tick, succeeds) = inventory.next();
        tracker.track(ctx, "inventory", |ctx| {
            if !succeeds {
                return Err(DemoError::Connection(format!(
                    "Simulated inventory database timeout (tick {tick})"
                )));
            }
            ctx.request_run(
                RunRequest::new()
                    .with_run_key(format!("inventory-{index}"))
                    .with_tag("table", "inventory"),
            );
            Ok(())
        })?;

        ctx.update_cursor((index + 1).to_string());
        Ok(TickOutput::nothing())
    })
}

/// Build the guarded sensor described by `config`.
pub fn build_sensor(config: &SensorConfig) -> Result<Box<dyn HostSensor>, ConfigError> {
    let name = config.name.as_str();
    let guard = &config.guard;
    let sensor = match config.script {
        Script::AlwaysFailing => always_failing(name, guard)?,
        Script::Flaky => flaky(name, guard)?,
        Script::RecoversAfter3 => recovers_after_3(name, guard)?,
        Script::RecoversAfterFailure => recovers_after_failure(name, guard)?,
        Script::DecayRecovery => decay_recovery(name, guard)?,
        Script::MultiTable => multi_table(name, guard)?,
    };
    let interval = Duration::from_secs(config.minimum_interval_secs);
    Ok(Box::new(sensor.with_minimum_interval(interval)))
}
