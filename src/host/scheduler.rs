//! Sensor tick loop.
//!
//! # Responsibilities
//! - Drive each sensor at its minimum interval
//! - Bracket every tick with a single cursor read and a single cursor write
//! - Hand produced run requests to the launcher
//! - Stop on shutdown or after the configured number of ticks

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::SchedulerConfig;
use crate::host::cursor_store::CursorStore;
use crate::host::launcher::{Job, RunLauncher};
use crate::lifecycle::Shutdown;
use crate::sensor::{HostSensor, SensorContext, TickReport};

/// Counters for one sensor's run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickStats {
    pub ticks: u64,
    pub launched: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Evaluate one tick of `sensor` against the stored cursor.
pub fn tick_once(
    sensor: &mut dyn HostSensor,
    store: &CursorStore,
    launcher: &mut RunLauncher,
    tick: u64,
    stats: &mut TickStats,
) -> TickReport {
    let name = sensor.name().to_string();
    let mut ctx = SensorContext::new(name.as_str(), store.get(&name)).with_tick(tick);

    let report = sensor.tick(&mut ctx);
    stats.ticks += 1;

    let mut requests = ctx.take_run_requests();
    match ctx.into_cursor() {
        Some(cursor) => store.set(&name, cursor),
        None => {
            store.clear(&name);
        }
    }

    match &report {
        TickReport::Run(produced) => {
            requests.extend(produced.iter().cloned());
            tracing::debug!(sensor = %name, tick, requests = requests.len(), "Tick completed");
        }
        TickReport::Skipped(reason) => {
            stats.skipped += 1;
            tracing::info!(sensor = %name, tick, reason = %reason, "Tick skipped");
        }
        TickReport::Failed(error) => {
            stats.failed += 1;
            tracing::error!(sensor = %name, tick, error = %error, "Tick failed");
        }
    }

    for request in &requests {
        if launcher.launch(&name, request) {
            stats.launched += 1;
        }
    }

    report
}

/// Runs every registered sensor on its own interval.
pub struct Scheduler {
    sensors: Vec<Box<dyn HostSensor>>,
    store: CursorStore,
    config: SchedulerConfig,
    job: Job,
}

impl Scheduler {
    pub fn new(store: CursorStore, config: SchedulerConfig, job: Job) -> Self {
        Self {
            sensors: Vec::new(),
            store,
            config,
            job,
        }
    }

    pub fn add(&mut self, sensor: Box<dyn HostSensor>) {
        self.sensors.push(sensor);
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Run until shutdown or until every sensor has used up `max_ticks`.
    /// Returns per-sensor statistics in registration order.
    pub async fn run(self, shutdown: &Shutdown) -> Vec<(String, TickStats)> {
        tracing::info!(
            sensors = self.sensors.len(),
            max_ticks = ?self.config.max_ticks,
            tick_scale = self.config.tick_scale,
            "Scheduler starting"
        );

        let mut handles = Vec::with_capacity(self.sensors.len());
        for sensor in self.sensors {
            let name = sensor.name().to_string();
            let interval = scaled(sensor.minimum_interval(), self.config.tick_scale);
            let sensor_loop = SensorLoop {
                sensor,
                store: self.store.clone(),
                launcher: RunLauncher::new(self.job.clone()),
                interval,
                max_ticks: self.config.max_ticks,
            };
            let rx = shutdown.subscribe();
            handles.push((name, tokio::spawn(sensor_loop.run(rx))));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            match handle.await {
                Ok(stats) => results.push((name, stats)),
                Err(e) => {
                    tracing::error!(sensor = %name, error = %e, "Sensor task aborted");
                    results.push((name, TickStats::default()));
                }
            }
        }

        tracing::info!("Scheduler stopped");
        results
    }
}

fn scaled(interval: Duration, tick_scale: u64) -> Duration {
    let divisor = u32::try_from(tick_scale.max(1)).unwrap_or(u32::MAX);
    (interval / divisor).max(Duration::from_millis(1))
}

struct SensorLoop {
    sensor: Box<dyn HostSensor>,
    store: CursorStore,
    launcher: RunLauncher,
    interval: Duration,
    max_ticks: Option<u64>,
}

impl SensorLoop {
    async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> TickStats {
        let mut stats = TickStats::default();
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            sensor = %self.sensor.name(),
            interval_ms = self.interval.as_millis() as u64,
            "Sensor loop starting"
        );

        loop {
            if self.max_ticks.is_some_and(|max| stats.ticks >= max) {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    let tick = stats.ticks + 1;
                    tick_once(self.sensor.as_mut(), &self.store, &mut self.launcher, tick, &mut stats);
                }
                _ = shutdown.recv() => {
                    tracing::info!(sensor = %self.sensor.name(), "Sensor loop received shutdown signal, exiting");
                    break;
                }
            }
        }

        stats
    }
}
