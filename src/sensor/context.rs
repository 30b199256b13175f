//! Scheduling context handed to a sensor on each tick.

use crate::guard::SectionScope;
use crate::sensor::types::RunRequest;

/// Per-tick view of the host: the sensor's identity, its stored cursor, and
/// the run requests registered so far this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorContext {
    name: String,
    tick: u64,
    cursor: Option<String>,
    requests: Vec<RunRequest>,
}

impl SensorContext {
    pub fn new(name: impl Into<String>, cursor: Option<String>) -> Self {
        Self {
            name: name.into(),
            tick: 0,
            cursor,
            requests: Vec::new(),
        }
    }

    /// Attach the host's tick sequence number.
    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn update_cursor(&mut self, cursor: impl Into<String>) {
        self.cursor = Some(cursor.into());
    }

    pub fn clear_cursor(&mut self) {
        self.cursor = None;
    }

    pub fn into_cursor(self) -> Option<String> {
        self.cursor
    }

    /// Register a run request. Requests registered by a section that fails
    /// are dropped; those from sections that succeeded reach the host even if
    /// a later section breaches.
    pub fn request_run(&mut self, request: RunRequest) {
        self.requests.push(request);
    }

    pub fn run_requests(&self) -> &[RunRequest] {
        &self.requests
    }

    pub fn take_run_requests(&mut self) -> Vec<RunRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Parse the cursor as a run index, zero when unset or unparseable.
    pub fn cursor_index(&self) -> u64 {
        self.cursor().and_then(|c| c.parse().ok()).unwrap_or(0)
    }
}

/// Run requests registered inside a failed section are discarded. The cursor
/// is left as the body set it.
impl SectionScope for SensorContext {
    type Checkpoint = usize;

    fn checkpoint(&self) -> usize {
        self.requests.len()
    }

    fn rollback(&mut self, checkpoint: usize) {
        self.requests.truncate(checkpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_roundtrip() {
        let mut ctx = SensorContext::new("flaky", None).with_tick(4);
        assert_eq!(ctx.tick(), 4);
        assert_eq!(ctx.cursor_index(), 0);
        ctx.update_cursor("7");
        assert_eq!(ctx.cursor(), Some("7"));
        assert_eq!(ctx.cursor_index(), 7);
        ctx.clear_cursor();
        assert_eq!(ctx.into_cursor(), None);
    }

    #[test]
    fn test_registered_requests() {
        let mut ctx = SensorContext::new("multi_table", None);
        ctx.request_run(RunRequest::new().with_run_key("orders-0"));
        assert_eq!(ctx.run_requests().len(), 1);
        let taken = ctx.take_run_requests();
        assert_eq!(taken[0].run_key.as_deref(), Some("orders-0"));
        assert!(ctx.run_requests().is_empty());
    }

    #[test]
    fn test_rollback_drops_later_requests() {
        let mut ctx = SensorContext::new("multi_table", Some("3".into()));
        ctx.request_run(RunRequest::new().with_run_key("orders-3"));
        let checkpoint = ctx.checkpoint();
        ctx.request_run(RunRequest::new().with_run_key("inventory-3"));
        ctx.update_cursor("4");
        ctx.rollback(checkpoint);

        assert_eq!(ctx.run_requests().len(), 1);
        assert_eq!(ctx.run_requests()[0].run_key.as_deref(), Some("orders-3"));
        assert_eq!(ctx.cursor(), Some("4"));
    }
}
