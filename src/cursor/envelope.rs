//! Combined host/guard cursor encoding.
//!
//! Wire form:
//! ```text
//! {"cursor":"41","guard":{"inventory":2,"orders":0}}
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::guard::GuardState;

/// Errors produced while encoding a cursor.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("failed to encode cursor: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Host cursor payload plus the guard's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardCursor {
    /// The sensor body's own cursor, untouched by the guard.
    pub host: Option<String>,
    /// Consecutive-failure counters by key.
    pub state: GuardState,
}

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    cursor: Option<&'a str>,
    guard: &'a GuardState,
}

/// Both keys must be present; any other JSON value is a host cursor.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EnvelopeIn {
    #[serde(deserialize_with = "present")]
    cursor: Option<String>,
    #[serde(deserialize_with = "present")]
    guard: Option<serde_json::Value>,
}

/// Deserialize an `Option` without treating a missing key as `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::deserialize(deserializer)
}

impl GuardCursor {
    pub fn new(host: Option<String>, state: GuardState) -> Self {
        Self { host, state }
    }

    /// Decode a stored cursor.
    ///
    /// Missing, empty or unreadable guard data yields an empty state. A token
    /// that is not an envelope at all is kept whole as the host payload, so a
    /// sensor that already had a cursor can start being guarded without a wipe.
    pub fn decode(raw: Option<&str>) -> Self {
        let raw = match raw {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Self::default(),
        };

        let envelope: EnvelopeIn = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "Cursor is not a guard envelope, treating it as host cursor");
                return Self {
                    host: Some(raw.to_string()),
                    state: GuardState::new(),
                };
            }
        };

        let state = match envelope.guard {
            None => GuardState::new(),
            Some(guard) => match serde_json::from_value::<GuardState>(guard) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed guard state in cursor, starting from zero");
                    GuardState::new()
                }
            },
        };

        Self {
            host: envelope.cursor,
            state,
        }
    }

    /// Encode for storage. Equal values always encode to identical bytes.
    pub fn encode(&self) -> Result<String, CursorError> {
        let envelope = EnvelopeOut {
            cursor: self.host.as_deref(),
            guard: &self.state,
        };
        Ok(serde_json::to_string(&envelope)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(pairs: &[(&str, u32)]) -> GuardState {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_missing_or_empty_is_empty_state() {
        assert_eq!(GuardCursor::decode(None), GuardCursor::default());
        assert_eq!(GuardCursor::decode(Some("")), GuardCursor::default());
        assert_eq!(GuardCursor::decode(Some("   ")), GuardCursor::default());
    }

    #[test]
    fn test_encoding_is_sorted_and_stable() {
        let cursor = GuardCursor::new(Some("41".into()), state(&[("orders", 0), ("inventory", 2)]));
        let encoded = cursor.encode().unwrap();
        assert_eq!(encoded, r#"{"cursor":"41","guard":{"inventory":2,"orders":0}}"#);

        let decoded = GuardCursor::decode(Some(encoded.as_str()));
        assert_eq!(decoded, cursor);
        assert_eq!(decoded.encode().unwrap(), encoded);
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut a = GuardState::new();
        a.set("x", 1);
        a.set("y", 2);
        let mut b = GuardState::new();
        b.set("y", 2);
        b.set("x", 1);
        assert_eq!(
            GuardCursor::new(None, a).encode().unwrap(),
            GuardCursor::new(None, b).encode().unwrap()
        );
    }

    #[test]
    fn test_no_host_cursor() {
        let cursor = GuardCursor::new(None, state(&[("__default__", 3)]));
        let encoded = cursor.encode().unwrap();
        assert_eq!(encoded, r#"{"cursor":null,"guard":{"__default__":3}}"#);
        assert_eq!(GuardCursor::decode(Some(encoded.as_str())), cursor);
    }

    #[test]
    fn test_bare_host_cursor_is_adopted() {
        let decoded = GuardCursor::decode(Some("17"));
        assert_eq!(decoded.host.as_deref(), Some("17"));
        assert!(decoded.state.is_empty());

        let decoded = GuardCursor::decode(Some("not json at all"));
        assert_eq!(decoded.host.as_deref(), Some("not json at all"));
    }

    #[test]
    fn test_malformed_guard_portion_keeps_host() {
        let decoded = GuardCursor::decode(Some(r#"{"cursor":"9","guard":{"orders":-1}}"#));
        assert_eq!(decoded.host.as_deref(), Some("9"));
        assert!(decoded.state.is_empty());

        let decoded = GuardCursor::decode(Some(r#"{"cursor":"9","guard":"garbage"}"#));
        assert_eq!(decoded.host.as_deref(), Some("9"));
        assert!(decoded.state.is_empty());
    }

    #[test]
    fn test_null_guard_portion() {
        let decoded = GuardCursor::decode(Some(r#"{"cursor":"9","guard":null}"#));
        assert_eq!(decoded.host.as_deref(), Some("9"));
        assert!(decoded.state.is_empty());
    }

    #[test]
    fn test_foreign_json_object_is_host_cursor() {
        for raw in [r#"{"last_id":12}"#, "{}", r#"{"cursor":"5"}"#, r#"{"guard":{"a":1}}"#] {
            let decoded = GuardCursor::decode(Some(raw));
            assert_eq!(decoded.host.as_deref(), Some(raw));
            assert!(decoded.state.is_empty());
        }
    }
}
