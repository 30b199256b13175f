//! Outcome of evaluating one section against one key.

/// What the guard decided for a single section of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<T, E> {
    /// The work completed; the reset policy was applied.
    Succeeded(T),
    /// The work failed but the count is still within the threshold.
    Suppressed { count: u32, threshold: u32 },
    /// The work failed and the count exceeds the threshold.
    /// `error` is exactly what the work returned.
    Breached { error: E, count: u32, threshold: u32 },
}

impl<T, E> Decision<T, E> {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Decision::Succeeded(_))
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Decision::Suppressed { .. })
    }

    pub fn is_breached(&self) -> bool {
        matches!(self, Decision::Breached { .. })
    }

    /// Failure count after the decision, `None` for a success.
    pub fn count(&self) -> Option<u32> {
        match self {
            Decision::Succeeded(_) => None,
            Decision::Suppressed { count, .. } | Decision::Breached { count, .. } => Some(*count),
        }
    }

    /// Collapse into the section-boundary view: a value, nothing, or the original error.
    pub fn into_result(self) -> Result<Option<T>, E> {
        match self {
            Decision::Succeeded(value) => Ok(Some(value)),
            Decision::Suppressed { .. } => Ok(None),
            Decision::Breached { error, .. } => Err(error),
        }
    }
}
