//! Scripted demo sensors and the job they trigger.
//!
//! Each sensor replays a fixed fail/succeed pattern so the guard's
//! suppression, breach and recovery behavior can be watched tick by tick.
//! Script positions live inside each sensor's own closure state.

pub mod assets;
pub mod sensors;

pub use sensors::{build_sensor, DemoError, Script};
