//! Tracked sections for per-key mode.
//!
//! A per-key sensor body receives a [`Tracker`] and encloses the work for
//! each sub-resource in [`Tracker::track`]. The section runs inside `track`,
//! so the counter update and the suppress/propagate decision happen exactly
//! once whichever way the section exits. Whatever the section left in its
//! [`SectionScope`] is rolled back unless it succeeded.
//!
//! ```text
//! let orders = tracker.track(ctx, "orders", |ctx| fetch_orders(ctx))?;     // Some(..) or None
//! let stock = tracker.track(ctx, "inventory", |ctx| fetch_stock(ctx))?;    // Err aborts the tick
//! ```

use std::fmt;

use crate::guard::decision::Decision;
use crate::guard::engine::Guard;

/// Surroundings a section can write into, such as a buffer of produced
/// results. Writes made by a failed section are undone.
pub trait SectionScope {
    type Checkpoint;

    fn checkpoint(&self) -> Self::Checkpoint;

    fn rollback(&mut self, checkpoint: Self::Checkpoint);
}

/// No surroundings.
impl SectionScope for () {
    type Checkpoint = ();

    fn checkpoint(&self) {}

    fn rollback(&mut self, _checkpoint: ()) {}
}

/// A failure swallowed at a section boundary during the current tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suppression {
    pub key: String,
    pub count: u32,
    pub threshold: u32,
}

impl fmt::Display for Suppression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} consecutive failures, suppressed",
            self.key, self.count, self.threshold
        )
    }
}

/// Scoped access to a guard for one invocation of a per-key body.
#[derive(Debug)]
pub struct Tracker<'g> {
    guard: &'g mut Guard,
    sensor: &'g str,
    suppressed: Vec<Suppression>,
    breached: Option<String>,
}

impl<'g> Tracker<'g> {
    pub fn new(guard: &'g mut Guard, sensor: &'g str) -> Self {
        Self {
            guard,
            sensor,
            suppressed: Vec::new(),
            breached: None,
        }
    }

    /// Run `section` against `scope` as the work for `key`.
    ///
    /// Returns `Ok(Some(value))` on success and `Ok(None)` when a failure is
    /// suppressed. When the failure breaches the threshold the original error
    /// comes back as `Err`, and the body is expected to propagate it with `?`,
    /// skipping any sections it has not entered yet. On either failure the
    /// scope is rolled back to where it stood before the section ran.
    pub fn track<S, T, E, F>(&mut self, scope: &mut S, key: &str, section: F) -> Result<Option<T>, E>
    where
        S: SectionScope + ?Sized,
        F: FnOnce(&mut S) -> Result<T, E>,
    {
        let checkpoint = scope.checkpoint();
        let decision = self.guard.evaluate(key, || section(&mut *scope));

        match decision {
            Decision::Succeeded(value) => Ok(Some(value)),
            Decision::Suppressed { count, threshold } => {
                scope.rollback(checkpoint);
                tracing::warn!(sensor = self.sensor, key, count, threshold, "Section failure suppressed");
                self.suppressed.push(Suppression {
                    key: key.to_string(),
                    count,
                    threshold,
                });
                Ok(None)
            }
            Decision::Breached { error, count, threshold } => {
                scope.rollback(checkpoint);
                tracing::error!(
                    sensor = self.sensor,
                    key,
                    count,
                    threshold,
                    "Section failure threshold breached"
                );
                self.breached = Some(key.to_string());
                Err(error)
            }
        }
    }

    /// Failures swallowed so far in this tick, in evaluation order.
    pub fn suppressions(&self) -> &[Suppression] {
        &self.suppressed
    }

    /// Key whose failure breached the threshold this tick, if any.
    pub fn breached(&self) -> Option<&str> {
        self.breached.as_deref()
    }

    pub(crate) fn into_suppressions(self) -> Vec<Suppression> {
        self.suppressed
    }

    /// Current count for `key`.
    pub fn count(&self, key: &str) -> u32 {
        self.guard.state().count(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{GuardSettings, GuardState, ResetPolicy};

    fn guard(threshold: u32) -> Guard {
        Guard::new(
            GuardSettings::new(threshold, ResetPolicy::Full).unwrap(),
            GuardState::new(),
        )
    }

    impl SectionScope for Vec<&'static str> {
        type Checkpoint = usize;

        fn checkpoint(&self) -> usize {
            self.len()
        }

        fn rollback(&mut self, checkpoint: usize) {
            self.truncate(checkpoint);
        }
    }

    #[test]
    fn test_success_yields_value() {
        let mut g = guard(3);
        let mut tracker = Tracker::new(&mut g, "test");
        let value = tracker.track(&mut (), "orders", |_| Ok::<_, String>(5)).unwrap();
        assert_eq!(value, Some(5));
        assert!(tracker.suppressions().is_empty());
        assert_eq!(tracker.breached(), None);
    }

    #[test]
    fn test_suppressed_failure_is_swallowed() {
        let mut g = guard(3);
        let mut tracker = Tracker::new(&mut g, "test");
        let value = tracker
            .track(&mut (), "inventory", |_| Err::<u8, _>("timeout".to_string()))
            .unwrap();
        assert_eq!(value, None);
        assert_eq!(
            tracker.suppressions(),
            &[Suppression { key: "inventory".into(), count: 1, threshold: 3 }]
        );
        assert_eq!(
            tracker.suppressions()[0].to_string(),
            "inventory: 1/3 consecutive failures, suppressed"
        );
    }

    #[test]
    fn test_error_needs_no_display() {
        #[derive(Debug, PartialEq)]
        struct Opaque;

        let mut g = guard(1);
        let mut tracker = Tracker::new(&mut g, "test");
        assert_eq!(tracker.track(&mut (), "a", |_| Err::<(), _>(Opaque)), Ok(None));
        assert_eq!(tracker.track(&mut (), "a", |_| Err::<(), _>(Opaque)), Err(Opaque));
    }

    #[test]
    fn test_failed_section_writes_are_rolled_back() {
        let mut g = guard(1);
        let mut produced: Vec<&'static str> = Vec::new();
        let mut tracker = Tracker::new(&mut g, "test");

        tracker
            .track(&mut produced, "orders", |out| {
                out.push("orders-0");
                Ok::<_, String>(())
            })
            .unwrap();
        let suppressed = tracker.track(&mut produced, "inventory", |out| {
            out.push("inventory-0");
            Err::<(), _>("timeout".to_string())
        });
        assert_eq!(suppressed, Ok(None));
        assert_eq!(produced, vec!["orders-0"]);

        let breached = tracker.track(&mut produced, "inventory", |out| {
            out.push("inventory-1");
            Err::<(), _>("timeout".to_string())
        });
        assert_eq!(breached, Err("timeout".to_string()));
        assert_eq!(tracker.breached(), Some("inventory"));
        assert_eq!(produced, vec!["orders-0"]);
    }

    #[test]
    fn test_breach_aborts_remaining_sections() {
        let mut g = guard(1);
        let mut state = GuardState::new();
        state.set("inventory", 1);
        g = Guard::new(g.settings(), state);

        fn body(tracker: &mut Tracker<'_>, reached: &mut bool) -> Result<(), String> {
            tracker.track(&mut (), "inventory", |_| Err::<(), _>("db down".to_string()))?;
            tracker.track(&mut (), "orders", |_| {
                *reached = true;
                Ok::<_, String>(())
            })?;
            Ok(())
        }

        let mut reached = false;
        let mut tracker = Tracker::new(&mut g, "test");
        let result = body(&mut tracker, &mut reached);
        assert_eq!(result, Err("db down".to_string()));
        assert!(!reached);
        assert_eq!(g.state().count("inventory"), 2);
        assert!(!g.state().contains("orders"));
    }
}
