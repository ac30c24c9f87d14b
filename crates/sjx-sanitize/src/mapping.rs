//! Per-run value mapping

use serde_json::Value;
use std::collections::HashMap;

/// Memo of `(mapping key, original value) -> redacted value` for one export run
///
/// Originals are keyed by their JSON text, so the string `"7"` and the
/// number `7` are distinct entries.
#[derive(Debug, Clone, Default)]
pub struct ValueMapping {
    entries: HashMap<(String, String), Value>,
}

impl ValueMapping {
    /// Empty mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Redacted value previously recorded for an original
    #[must_use]
    pub fn get(&self, key: &str, original: &Value) -> Option<&Value> {
        self.entries.get(&(key.to_string(), original.to_string()))
    }

    /// Record a redaction
    pub fn insert(&mut self, key: &str, original: &Value, redacted: Value) {
        self.entries
            .insert((key.to_string(), original.to_string()), redacted);
    }

    /// Number of recorded redactions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct mapping keys in use
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(|(k, _)| k.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}
