//! Run launching with run-key deduplication.

use std::collections::HashSet;
use std::sync::Arc;

use crate::sensor::RunRequest;

/// The work started for each launched run: `(sensor, request)`.
pub type Job = Arc<dyn Fn(&str, &RunRequest) + Send + Sync>;

/// Launches runs for one sensor, at most once per run key.
pub struct RunLauncher {
    job: Job,
    launched: HashSet<String>,
}

impl RunLauncher {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            launched: HashSet::new(),
        }
    }

    /// Launch `request` unless its run key was launched before.
    /// Requests without a run key always launch.
    pub fn launch(&mut self, sensor: &str, request: &RunRequest) -> bool {
        if let Some(key) = &request.run_key {
            if !self.launched.insert(key.clone()) {
                tracing::info!(sensor, run_key = %key, "Run key already launched, skipping");
                return false;
            }
        }
        tracing::info!(sensor, run_key = request.run_key.as_deref().unwrap_or("-"), "Launching run");
        (self.job)(sensor, request);
        true
    }

    pub fn launched_count(&self) -> usize {
        self.launched.len()
    }
}

impl std::fmt::Debug for RunLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLauncher")
            .field("launched", &self.launched)
            .finish_non_exhaustive()
    }
}
