//! Deterministic record key derivation
//!
//! The ledger stores at most one attendance record per `(day, key)`. Both
//! the scan path and the roster path derive the key from the same
//! `(name, class)` pair through this one function, so a later scan of a
//! student an administrator already marked resolves to the same stored row
//! instead of creating a second one.

use serde::{Deserialize, Serialize};

/// Storage key for one student within a day partition
///
/// Derived, never typed in by hand. Safe as a path/URL segment: lowercase
/// alphanumerics, `-` within a segment, `_` between the name and class
/// segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    /// Derive the key for a `(name, class)` pair
    ///
    /// Total and referentially transparent: equal inputs always yield
    /// equal keys, regardless of which path (scan or roster) calls it.
    ///
    /// Known limitation: two distinct students whose normalized pairs
    /// collide (e.g. differing only in punctuation) map to the same key
    /// and therefore the same record.
    pub fn derive(name: &str, class: &str) -> Self {
        RecordKey(format!("{}_{}", normalize(name), normalize(class)))
    }

    /// Wrap a key string read back from storage
    pub fn from_stored(s: impl Into<String>) -> Self {
        RecordKey(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize one key segment: trim, lowercase, collapse whitespace runs
/// to `-`, drop everything outside `[a-z0-9-]`
fn normalize(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut pending_sep = false;
    for c in segment.trim().to_lowercase().chars() {
        if c.is_whitespace() {
            pending_sep = !out.is_empty();
            continue;
        }
        if c.is_ascii_alphanumeric() || c == '-' {
            if pending_sep {
                out.push('-');
                pending_sep = false;
            }
            out.push(c);
        }
    }
    out
}
