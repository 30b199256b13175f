//! Demo host subsystem: the scheduler side of the sensor contract.
//!
//! # Data Flow
//! ```text
//! scheduler.rs (one task per sensor, interval per sensor)
//!     → cursor_store.rs get(name)
//!     → HostSensor::tick(ctx)
//!     → cursor_store.rs set(name, cursor)
//!     → launcher.rs (dedup by run_key, run the job)
//! ```
//!
//! # Rules
//! - Ticks of one sensor never overlap; different sensors run concurrently
//! - Cursor storage is last-writer-wins per sensor name
//! - The host does not retry a failed tick; the next interval is the next chance

pub mod cursor_store;
pub mod launcher;
pub mod scheduler;

pub use cursor_store::CursorStore;
pub use launcher::{Job, RunLauncher};
pub use scheduler::{tick_once, Scheduler, TickStats};
