//! Shared helpers for the guard integration tests.

use std::sync::{Arc, Mutex};

use sensor_guard::config::GuardConfig;
use sensor_guard::cursor::GuardCursor;
use sensor_guard::sensor::{ResilientSensor, RunRequest, SensorContext, TickOutput};
use sensor_guard::GuardState;
use thiserror::Error;

/// Error raised by scripted test sensors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("upstream unreachable on tick {0}")]
    Unreachable(usize),
    #[error("{table} timed out on tick {tick}")]
    Timeout { table: &'static str, tick: usize },
}

/// Outcome script: `true` succeeds, `false` fails. Succeeds once exhausted.
#[derive(Debug, Clone)]
pub struct Script {
    outcomes: Vec<bool>,
    position: usize,
}

#[allow(dead_code)]
impl Script {
    pub fn new(outcomes: &[bool]) -> Self {
        Self {
            outcomes: outcomes.to_vec(),
            position: 0,
        }
    }

    /// `n` failures.
    pub fn failures(n: usize) -> Self {
        Self::new(&vec![false; n])
    }

    /// `(tick, succeeds)` for the next tick, 1-based.
    pub fn next(&mut self) -> (usize, bool) {
        let position = self.position;
        self.position += 1;
        (position + 1, self.outcomes.get(position).copied().unwrap_or(true))
    }
}

/// Single-key sensor following `script`, counting how often its body runs.
#[allow(dead_code)]
pub fn scripted(config: &GuardConfig, script: Script) -> (ResilientSensor<FetchError>, Arc<Mutex<usize>>) {
    let calls = Arc::new(Mutex::new(0));
    let seen = calls.clone();
    let mut script = script;
    let sensor = ResilientSensor::single("scripted_sensor", config, move |ctx| {
        *seen.lock().unwrap() += 1;
        match script.next() {
            (tick, false) => Err(FetchError::Unreachable(tick)),
            (_, true) => {
                let index = ctx.cursor_index();
                ctx.update_cursor((index + 1).to_string());
                Ok(TickOutput::from(RunRequest::new().with_run_key(format!("run-{index}"))))
            }
        }
    })
    .unwrap();
    (sensor, calls)
}

/// Guard state stored in `ctx`.
#[allow(dead_code)]
pub fn state(ctx: &SensorContext) -> GuardState {
    GuardCursor::decode(ctx.cursor()).state
}

/// Count for `key` stored in `ctx`.
#[allow(dead_code)]
pub fn count(ctx: &SensorContext, key: &str) -> u32 {
    state(ctx).count(key)
}

/// Expected skip for a single-key suppression.
#[allow(dead_code)]
pub fn suppressed(count: u32, threshold: u32) -> TickOutput {
    TickOutput::skip(format!("{count}/{threshold} consecutive failures, suppressed"))
}
