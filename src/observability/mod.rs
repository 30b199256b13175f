//! Observability subsystem.
//!
//! Every subsystem logs through `tracing` with structured fields
//! (`sensor`, `key`, `count`, `threshold`, `error`). `logging.rs` installs
//! the subscriber for the binary; the library itself never installs one.
//!
//! | event                         | level |
//! |-------------------------------|-------|
//! | failure suppressed            | warn  |
//! | threshold breached            | error |
//! | failure count recovering      | info  |
//! | unreadable cursor replaced    | warn  |
//! | counter moved                 | debug |

pub mod logging;

pub use logging::init_logging;
