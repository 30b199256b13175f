//! Host-side outcome vocabulary.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};

/// A request for the host to launch a run. Opaque to the guard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Deduplication key; the host launches at most one run per key.
    pub run_key: Option<String>,
    /// Free-form tags attached to the launched run.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl RunRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run_key(mut self, key: impl Into<String>) -> Self {
        self.run_key = Some(key.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Human-readable reason a tick did nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipReason(pub String);

impl SkipReason {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Successful outcome of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutput {
    /// Zero or more runs to launch.
    Run(Vec<RunRequest>),
    /// Nothing to do, with a reason.
    Skip(SkipReason),
}

impl TickOutput {
    pub fn run(requests: Vec<RunRequest>) -> Self {
        TickOutput::Run(requests)
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        TickOutput::Skip(SkipReason::new(reason))
    }

    /// No run requests and no explicit reason.
    pub fn nothing() -> Self {
        TickOutput::Run(Vec::new())
    }

    pub fn run_requests(&self) -> &[RunRequest] {
        match self {
            TickOutput::Run(requests) => requests,
            TickOutput::Skip(_) => &[],
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            TickOutput::Skip(reason) => Some(reason),
            TickOutput::Run(_) => None,
        }
    }
}

impl From<Vec<RunRequest>> for TickOutput {
    fn from(requests: Vec<RunRequest>) -> Self {
        TickOutput::Run(requests)
    }
}

impl From<RunRequest> for TickOutput {
    fn from(request: RunRequest) -> Self {
        TickOutput::Run(vec![request])
    }
}

/// Type-erased tick result handed to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickReport {
    Run(Vec<RunRequest>),
    Skipped(SkipReason),
    /// A breach (or an error outside any tracked section), rendered for the host.
    Failed(String),
}

impl<E: fmt::Display> From<Result<TickOutput, E>> for TickReport {
    fn from(result: Result<TickOutput, E>) -> Self {
        match result {
            Ok(TickOutput::Run(requests)) => TickReport::Run(requests),
            Ok(TickOutput::Skip(reason)) => TickReport::Skipped(reason),
            Err(e) => TickReport::Failed(e.to_string()),
        }
    }
}
