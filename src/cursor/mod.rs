//! Cursor persistence subsystem.
//!
//! # Data Flow
//! ```text
//! host cursor string
//!     → envelope.rs decode (never fails: unreadable guard data reads as empty)
//!     → GuardCursor { host payload, GuardState }
//!     → tick runs, counters move
//!     → envelope.rs encode (keys in sorted order)
//!     → host cursor string
//! ```
//!
//! The host only ever sees one opaque string. The guard's counters ride
//! alongside whatever cursor the sensor body keeps for itself.

pub mod envelope;

pub use envelope::{CursorError, GuardCursor};
