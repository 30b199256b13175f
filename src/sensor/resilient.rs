//! Guarded sensor adapter.
//!
//! # Responsibilities
//! - Restore guard state from the host cursor before the body runs
//! - Run the body as one section (single-key) or hand it a `Tracker` (per-key)
//! - Persist the updated state on every exit path, breach included
//! - Translate decisions into run requests, a skip reason, or the original error

use std::fmt;
use std::time::Duration;

use crate::config::{validate_guard, ConfigError, GuardConfig};
use crate::cursor::GuardCursor;
use crate::guard::{Guard, GuardSettings, GuardState, Tracker, DEFAULT_KEY};
use crate::sensor::context::SensorContext;
use crate::sensor::types::{TickOutput, TickReport};

/// Default gap between ticks when none is configured.
const DEFAULT_MINIMUM_INTERVAL: Duration = Duration::from_secs(30);

/// Body guarded as one unit.
pub type SingleBody<E> = Box<dyn FnMut(&mut SensorContext) -> Result<TickOutput, E> + Send>;

/// Body that encloses each resource in its own tracked section.
pub type TrackedBody<E> =
    Box<dyn FnMut(&mut SensorContext, &mut Tracker<'_>) -> Result<TickOutput, E> + Send>;

/// The wrapped sensor logic, in one of the two guard modes.
pub enum SensorBody<E> {
    Single(SingleBody<E>),
    Tracked(TrackedBody<E>),
}

impl<E> SensorBody<E> {
    fn kind(&self) -> &'static str {
        match self {
            SensorBody::Single(_) => "single-key",
            SensorBody::Tracked(_) => "tracked",
        }
    }
}

impl<E> fmt::Debug for SensorBody<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// A sensor body bound to a guard and the host cursor.
#[derive(Debug)]
pub struct ResilientSensor<E> {
    name: String,
    settings: GuardSettings,
    minimum_interval: Duration,
    body: SensorBody<E>,
}

impl<E: fmt::Display> ResilientSensor<E> {
    /// Validate `config` and bind it to `body`.
    ///
    /// Fails when the guard options are invalid or `per_key` does not match
    /// the body's mode. Nothing is evaluated until the first tick.
    pub fn new(
        name: impl Into<String>,
        config: &GuardConfig,
        body: SensorBody<E>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let settings = validate_guard(config)?;

        let tracked = matches!(body, SensorBody::Tracked(_));
        if tracked != config.per_key {
            return Err(ConfigError::BodyMismatch {
                sensor: name,
                per_key: config.per_key,
                body: body.kind(),
            });
        }

        tracing::debug!(
            sensor = %name,
            threshold = settings.threshold(),
            policy = %settings.policy(),
            per_key = config.per_key,
            "Guarded sensor configured"
        );

        Ok(Self {
            name,
            settings,
            minimum_interval: DEFAULT_MINIMUM_INTERVAL,
            body,
        })
    }

    /// Guard `body` as a single section.
    pub fn single<F>(name: impl Into<String>, config: &GuardConfig, body: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&mut SensorContext) -> Result<TickOutput, E> + Send + 'static,
    {
        Self::new(name, config, SensorBody::Single(Box::new(body)))
    }

    /// Guard `body` per key through tracked sections.
    pub fn tracked<F>(name: impl Into<String>, config: &GuardConfig, body: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&mut SensorContext, &mut Tracker<'_>) -> Result<TickOutput, E> + Send + 'static,
    {
        Self::new(name, config, SensorBody::Tracked(Box::new(body)))
    }

    pub fn with_minimum_interval(mut self, interval: Duration) -> Self {
        self.minimum_interval = interval;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> GuardSettings {
        self.settings
    }

    pub fn is_tracked(&self) -> bool {
        matches!(self.body, SensorBody::Tracked(_))
    }

    /// Guard state currently stored in `ctx`'s cursor.
    pub fn state_from(ctx: &SensorContext) -> GuardState {
        GuardCursor::decode(ctx.cursor()).state
    }

    /// Wipe all stored state, as when an operator disables and re-enables the sensor.
    pub fn reset(&self, ctx: &mut SensorContext) {
        tracing::info!(sensor = %self.name, "Sensor state reset");
        ctx.clear_cursor();
    }

    /// Run one tick.
    ///
    /// `Ok` carries the body's output, or a skip explaining suppressed
    /// failures. `Err` is the body's own error, returned only on a breach or
    /// when a per-key body fails outside any tracked section. Requests the
    /// body registered through its context are moved into `ctx`, except those
    /// registered by a section that failed.
    pub fn evaluate(&mut self, ctx: &mut SensorContext) -> Result<TickOutput, E> {
        let GuardCursor { host, state } = GuardCursor::decode(ctx.cursor());
        let before = state.clone();
        let mut guard = Guard::new(self.settings, state);
        let mut inner = SensorContext::new(self.name.clone(), host).with_tick(ctx.tick());

        let result = match &mut self.body {
            SensorBody::Single(body) => {
                let mut tracker = Tracker::new(&mut guard, &self.name);
                match tracker.track(&mut inner, DEFAULT_KEY, |inner| body(inner)) {
                    Ok(Some(output)) => Ok(output),
                    Ok(None) => {
                        let count = tracker.count(DEFAULT_KEY);
                        Ok(TickOutput::skip(format!(
                            "{}/{} consecutive failures, suppressed",
                            count,
                            self.settings.threshold()
                        )))
                    }
                    Err(e) => Err(e),
                }
            }
            SensorBody::Tracked(body) => {
                let mut tracker = Tracker::new(&mut guard, &self.name);
                let result = body(&mut inner, &mut tracker);
                let registered = !inner.run_requests().is_empty();
                summarize(&self.name, result, tracker, registered)
            }
        };

        for request in inner.take_run_requests() {
            ctx.request_run(request);
        }
        let state = guard.into_state();
        log_recoveries(&self.name, &before, &state);
        persist(&self.name, ctx, inner.into_cursor(), state);
        result
    }
}

/// Replace an empty per-key output with a skip naming every suppressed key.
fn summarize<E: fmt::Display>(
    sensor: &str,
    result: Result<TickOutput, E>,
    tracker: Tracker<'_>,
    registered: bool,
) -> Result<TickOutput, E> {
    let breached = tracker.breached().map(str::to_string);
    let suppressions = tracker.into_suppressions();
    match result {
        Ok(output)
            if !suppressions.is_empty() && !registered && output.run_requests().is_empty() =>
        {
            let reason = suppressions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            Ok(TickOutput::skip(reason))
        }
        Ok(output) => Ok(output),
        Err(e) => {
            match breached {
                Some(key) => tracing::debug!(sensor, key = %key, "Breach propagated to host"),
                None => tracing::error!(sensor, error = %e, "Sensor failed outside tracked sections"),
            }
            Err(e)
        }
    }
}

fn log_recoveries(sensor: &str, before: &GuardState, after: &GuardState) {
    for (key, count) in after.iter() {
        let previous = before.count(key);
        if count < previous {
            tracing::info!(sensor, key, previous, count, "Failure count recovering");
        }
    }
}

fn persist(sensor: &str, ctx: &mut SensorContext, host: Option<String>, state: GuardState) {
    match GuardCursor::new(host, state).encode() {
        Ok(encoded) => ctx.update_cursor(encoded),
        Err(e) => {
            tracing::error!(sensor, error = %e, "Failed to encode cursor, keeping previous value");
        }
    }
}

/// Object-safe view of a guarded sensor for the scheduler.
pub trait HostSensor: Send {
    fn name(&self) -> &str;

    fn minimum_interval(&self) -> Duration;

    fn tick(&mut self, ctx: &mut SensorContext) -> TickReport;
}

impl<E: fmt::Display> HostSensor for ResilientSensor<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn minimum_interval(&self) -> Duration {
        self.minimum_interval
    }

    fn tick(&mut self, ctx: &mut SensorContext) -> TickReport {
        self.evaluate(ctx).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::types::RunRequest;

    fn ctx() -> SensorContext {
        SensorContext::new("test_sensor", None)
    }

    #[test]
    fn test_body_mode_must_match_config() {
        let err = ResilientSensor::single("s", &GuardConfig::new(3).per_key(), |_ctx| {
            Ok::<_, String>(TickOutput::nothing())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::BodyMismatch { per_key: true, .. }));

        let err = ResilientSensor::tracked("s", &GuardConfig::new(3), |_ctx, _tracker| {
            Ok::<_, String>(TickOutput::nothing())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::BodyMismatch { per_key: false, .. }));
    }

    #[test]
    fn test_invalid_config_fails_at_construction() {
        let err = ResilientSensor::single("s", &GuardConfig::new(0), |_ctx| {
            Ok::<_, String>(TickOutput::nothing())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_suppressed_failure_becomes_skip() {
        let mut sensor = ResilientSensor::single("s", &GuardConfig::new(3), |_ctx| {
            Err::<TickOutput, _>("unreachable".to_string())
        })
        .unwrap();

        let mut ctx = ctx();
        let out = sensor.evaluate(&mut ctx).unwrap();
        assert_eq!(out, TickOutput::skip("1/3 consecutive failures, suppressed"));
        assert_eq!(ResilientSensor::<String>::state_from(&ctx).count(DEFAULT_KEY), 1);
    }

    #[test]
    fn test_breach_persists_state_before_propagating() {
        let mut sensor = ResilientSensor::single("s", &GuardConfig::new(1), |_ctx| {
            Err::<TickOutput, _>("unreachable".to_string())
        })
        .unwrap();

        let mut ctx = ctx();
        assert!(sensor.evaluate(&mut ctx).is_ok());
        let err = sensor.evaluate(&mut ctx).unwrap_err();
        assert_eq!(err, "unreachable");
        assert_eq!(ResilientSensor::<String>::state_from(&ctx).count(DEFAULT_KEY), 2);
    }

    #[test]
    fn test_body_sees_only_its_own_cursor() {
        let mut sensor = ResilientSensor::single("s", &GuardConfig::new(3), |ctx| {
            let next = ctx.cursor_index() + 1;
            ctx.update_cursor(next.to_string());
            Ok::<_, String>(TickOutput::from(RunRequest::new().with_run_key(format!("run-{next}"))))
        })
        .unwrap();

        let mut ctx = ctx();
        sensor.evaluate(&mut ctx).unwrap();
        let out = sensor.evaluate(&mut ctx).unwrap();
        assert_eq!(out.run_requests()[0].run_key.as_deref(), Some("run-2"));
        assert_eq!(
            ctx.cursor(),
            Some(r#"{"cursor":"2","guard":{"__default__":0}}"#)
        );
    }

    #[test]
    fn test_tracked_skip_lists_suppressed_keys() {
        let mut sensor = ResilientSensor::tracked("s", &GuardConfig::new(3).per_key(), |ctx, tracker| {
            tracker.track(ctx, "inventory", |_| Err::<(), _>("timeout".to_string()))?;
            tracker.track(ctx, "orders", |_| Err::<(), _>("timeout".to_string()))?;
            Ok::<_, String>(TickOutput::nothing())
        })
        .unwrap();

        let mut ctx = ctx();
        let out = sensor.evaluate(&mut ctx).unwrap();
        assert_eq!(
            out,
            TickOutput::skip(
                "inventory: 1/3 consecutive failures, suppressed; orders: 1/3 consecutive failures, suppressed"
            )
        );
    }

    #[test]
    fn test_registered_requests_survive_breach() {
        let config = GuardConfig::new(1).per_key();
        let mut sensor = ResilientSensor::tracked("s", &config, |ctx, tracker| {
            tracker.track(ctx, "orders", |ctx| {
                ctx.request_run(RunRequest::new().with_run_key("orders"));
                Ok::<_, String>(())
            })?;
            tracker.track(ctx, "inventory", |ctx| {
                ctx.request_run(RunRequest::new().with_run_key("inventory"));
                Err::<(), _>("timeout".to_string())
            })?;
            Ok::<_, String>(TickOutput::nothing())
        })
        .unwrap();

        let mut ctx = ctx();
        assert_eq!(sensor.evaluate(&mut ctx).unwrap(), TickOutput::nothing());
        assert_eq!(ctx.take_run_requests().len(), 1);

        assert_eq!(sensor.evaluate(&mut ctx).unwrap_err(), "timeout");
        let requests = ctx.take_run_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].run_key.as_deref(), Some("orders"));
    }

    #[test]
    fn test_failed_section_requests_are_dropped() {
        let mut sensor = ResilientSensor::tracked("s", &GuardConfig::new(3).per_key(), |ctx, tracker| {
            tracker.track(ctx, "inventory", |ctx| {
                ctx.request_run(RunRequest::new().with_run_key("inventory-0"));
                Err::<(), _>("timeout".to_string())
            })?;
            Ok::<_, String>(TickOutput::nothing())
        })
        .unwrap();

        let mut ctx = ctx();
        let out = sensor.evaluate(&mut ctx).unwrap();
        assert_eq!(out, TickOutput::skip("inventory: 1/3 consecutive failures, suppressed"));
        assert!(ctx.run_requests().is_empty());
    }

    #[test]
    fn test_single_body_requests_dropped_unless_succeeded() {
        let mut sensor = ResilientSensor::single("s", &GuardConfig::new(1), |ctx| {
            ctx.request_run(RunRequest::new().with_run_key("partial"));
            Err::<TickOutput, _>("boom".to_string())
        })
        .unwrap();

        let mut ctx = ctx();
        assert_eq!(
            sensor.evaluate(&mut ctx).unwrap(),
            TickOutput::skip("1/1 consecutive failures, suppressed")
        );
        assert!(ctx.run_requests().is_empty());

        assert_eq!(sensor.evaluate(&mut ctx).unwrap_err(), "boom");
        assert!(ctx.run_requests().is_empty());
    }

    #[test]
    fn test_untracked_error_propagates_uncounted() {
        let mut sensor = ResilientSensor::tracked("s", &GuardConfig::new(3).per_key(), |_ctx, _tracker| {
            Err::<TickOutput, _>("listing failed".to_string())
        })
        .unwrap();

        let mut ctx = ctx();
        assert_eq!(sensor.evaluate(&mut ctx).unwrap_err(), "listing failed");
        assert!(ResilientSensor::<String>::state_from(&ctx).is_empty());
    }

    #[test]
    fn test_reset_wipes_counters() {
        let mut sensor = ResilientSensor::single("s", &GuardConfig::new(3), |_ctx| {
            Err::<TickOutput, _>("down".to_string())
        })
        .unwrap();
        let mut ctx = ctx();
        sensor.evaluate(&mut ctx).unwrap();
        sensor.evaluate(&mut ctx).unwrap();
        sensor.reset(&mut ctx);
        assert_eq!(ctx.cursor(), None);
        let out = sensor.evaluate(&mut ctx).unwrap();
        assert_eq!(out, TickOutput::skip("1/3 consecutive failures, suppressed"));
    }

    #[test]
    fn test_host_sensor_report() {
        let mut sensor = ResilientSensor::single("s", &GuardConfig::new(1), |_ctx| {
            Err::<TickOutput, _>("down".to_string())
        })
        .unwrap()
        .with_minimum_interval(Duration::from_secs(5));

        let host: &mut dyn HostSensor = &mut sensor;
        assert_eq!(host.minimum_interval(), Duration::from_secs(5));
        let mut ctx = ctx();
        assert!(matches!(host.tick(&mut ctx), TickReport::Skipped(_)));
        assert_eq!(host.tick(&mut ctx), TickReport::Failed("down".into()));
    }
}
