//! Failure-counting guard subsystem.
//!
//! # Data Flow
//! ```text
//! One section of work for one key:
//!     → state.rs (look up the key's consecutive-failure count)
//!     → engine.rs (run the work exactly once)
//!     → success: policy.rs (apply Full / Decay reset)
//!     → failure: count + 1, compare against threshold
//!     → decision.rs (Succeeded / Suppressed / Breached)
//!
//! Per-key mode (tracker.rs):
//!     body → track(ctx, "orders", ..) → Guard::evaluate
//!          → track(ctx, "inventory", ..) → Guard::evaluate
//!     A failed section's writes to ctx are rolled back.
//!     A breach returns the original error and the body's `?` aborts the rest.
//! ```
//!
//! # Invariants
//! - Counters never go below zero and saturate instead of overflowing
//! - Exactly one counter is touched per evaluation
//! - A breach carries the original error, never a wrapped one
//! - The guard never retries, sleeps, or schedules; the host drives ticks

pub mod engine;
pub mod decision;
pub mod policy;
pub mod state;
pub mod tracker;

pub use engine::{Guard, GuardSettings, DEFAULT_KEY};
pub use decision::Decision;
pub use policy::ResetPolicy;
pub use state::GuardState;
pub use tracker::{SectionScope, Suppression, Tracker};
