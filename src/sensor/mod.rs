//! Host binding subsystem.
//!
//! # Data Flow
//! ```text
//! host tick
//!     → resilient.rs: decode GuardCursor from SensorContext
//!     → body runs against a context that only sees its own cursor
//!         single-key: whole body is one section under DEFAULT_KEY
//!         per-key:    body encloses each resource in Tracker::track
//!     → updated cursor written back on every path
//!     → TickOutput (run requests / skip) or the original error
//! ```

pub mod context;
pub mod resilient;
pub mod types;

pub use context::SensorContext;
pub use resilient::{HostSensor, ResilientSensor, SensorBody, SingleBody, TrackedBody};
pub use types::{RunRequest, SkipReason, TickOutput, TickReport};
