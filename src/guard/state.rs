//! Per-key consecutive-failure counters.
//!
//! # Responsibilities
//! - Hold one counter per observed key
//! - Report absent keys as zero
//! - Serialize in key order so the cursor encoding is stable

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// Mapping from resource key to its consecutive-failure count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuardState {
    counters: BTreeMap<String, u32>,
}

impl GuardState {
    /// Create an empty state (every counter at zero).
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count for `key`, zero if the key was never observed.
    pub fn count(&self, key: &str) -> u32 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    /// Store the count for `key`, returning the previous value.
    pub fn set(&mut self, key: &str, value: u32) -> u32 {
        self.counters.insert(key.to_string(), value).unwrap_or(0)
    }

    /// Whether `key` has been observed since the last wipe.
    pub fn contains(&self, key: &str) -> bool {
        self.counters.contains_key(key)
    }

    /// Observed keys, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.counters.keys().map(String::as_str)
    }

    /// `(key, count)` pairs, in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counters.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Forget every key. Mirrors the operator disabling and re-enabling a sensor.
    pub fn clear(&mut self) {
        self.counters.clear();
    }
}

impl FromIterator<(String, u32)> for GuardState {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self {
            counters: iter.into_iter().collect(),
        }
    }
}
