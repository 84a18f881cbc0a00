//! Content-addressed cache key generation.

use sha2::{Digest, Sha256};

/// Normalize a cache source string: trimmed and lower-cased.
pub fn normalize_source(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Compute the cache key for a source string.
///
/// SHA-256 hex of the normalized input, so `" FOO "` and `"foo"` share a key.
pub fn compute_cache_key(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_source(input).as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether a string has the shape of a cache key.
pub fn is_cache_key(candidate: &str) -> bool {
    candidate.len() == 64 && candidate.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("https://example.com/openapi.json");
        let hash2 = compute_cache_key("https://example.com/openapi.json");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_normalization_invariant() {
        assert_eq!(compute_cache_key(" FOO "), compute_cache_key("foo"));
        assert_eq!(compute_cache_key("\tStripe\n"), compute_cache_key("stripe"));
    }

    #[test]
    fn test_hash_different_sources() {
        assert_ne!(compute_cache_key("https://a.example.com"), compute_cache_key("https://b.example.com"));
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("https://example.com");
        assert_eq!(hash.len(), 64);
        assert!(is_cache_key(&hash));
        assert!(!is_cache_key("https://example.com"));
    }
}
