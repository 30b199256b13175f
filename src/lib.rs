//! Failure-suppressing guard for periodic polling sensors.
//!
//! A sensor is invoked on a fixed interval by an external scheduler. The
//! guard absorbs a bounded run of consecutive failures per tracked key,
//! reporting them as "nothing to do", and hands the original error back once
//! failures exceed the configured threshold. Counters live in the sensor's
//! cursor so they survive restarts.
//!
//! ```text
//! host tick → sensor::ResilientSensor → guard::Guard / guard::Tracker
//!           ↘ cursor::GuardCursor (decode before, encode after) ↙
//! ```

pub mod config;
pub mod cursor;
pub mod demo;
pub mod guard;
pub mod host;
pub mod lifecycle;
pub mod observability;
pub mod sensor;

pub use config::{GuardConfig, ResetStrategy};
pub use cursor::GuardCursor;
pub use guard::{Decision, Guard, GuardSettings, GuardState, ResetPolicy, Tracker, DEFAULT_KEY};
pub use sensor::{ResilientSensor, RunRequest, SensorContext, SkipReason, TickOutput};
