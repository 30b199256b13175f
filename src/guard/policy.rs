//! Reset policy applied to a counter after a successful section.

use std::fmt;

/// How a key's failure count recovers after a success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResetPolicy {
    /// Any success clears the count.
    #[default]
    Full,
    /// Each success subtracts `amount`, floored at zero.
    Decay { amount: u32 },
}

impl ResetPolicy {
    /// Return the count that remains after one success.
    pub fn apply(&self, count: u32) -> u32 {
        match self {
            ResetPolicy::Full => 0,
            ResetPolicy::Decay { amount } => count.saturating_sub(*amount),
        }
    }
}

impl fmt::Display for ResetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetPolicy::Full => write!(f, "full"),
            ResetPolicy::Decay { amount } => write!(f, "decay({})", amount),
        }
    }
}
