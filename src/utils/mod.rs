//! Utility functions and helpers.

use chrono::{Datelike, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Truncated SHA-256 over the JSON encoding of a value.
///
/// Used for the baseline content hash and as a fallback event key when the
/// API omits the competition id. Field order in the serialized structs is
/// fixed, so the hash is stable across runs.
pub fn short_hash<T: Serialize + ?Sized>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    let full = hex::encode(digest);
    full[..12].to_string()
}

/// Current season, derived from the UTC calendar year.
pub fn current_season() -> i32 {
    Utc::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash_stable() {
        let a = short_hash(&("BMW International Open", "2025-06-29"));
        let b = short_hash(&("BMW International Open", "2025-06-29"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
    }

    #[test]
    fn test_short_hash_differs() {
        let a = short_hash(&("Open A", "2025-06-29"));
        let b = short_hash(&("Open B", "2025-06-29"));
        assert_ne!(a, b);
    }
}
