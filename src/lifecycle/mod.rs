//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger → every sensor loop leaves its select! → stats returned → cursors saved
//!
//! Signals (signals.rs):
//!     SIGINT (ctrl-c) → Shutdown::trigger
//! ```
//!
//! A tick that is already running is allowed to finish; the guard never
//! cancels the sensor body.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
