//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks, every error collected)
//!     → DemoConfig (validated, immutable)
//!
//! Per guarded sensor:
//!     GuardConfig → validate_guard → GuardSettings (threshold + ResetPolicy)
//! ```
//!
//! # Rules
//! - Guard options are fixed at construction; there is no reload path
//! - Invalid guard options fail before any tick runs, never silently defaulted
//! - Everything except `threshold` has a default

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    DemoConfig, GuardConfig, ObservabilityConfig, ResetStrategy, SchedulerConfig, SensorConfig,
};
pub use validation::{validate_config, validate_guard, ValidationError};
