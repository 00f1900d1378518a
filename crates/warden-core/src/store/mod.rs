//! Shared TTL key-value store abstraction
//!
//! All credential and nonce state lives behind [`Store`]. Authorities hold no
//! in-process locks or caches; every compound step that must not interleave
//! with another caller is a single store primitive (`get_and_delete`,
//! `push_bounded`), so correctness holds across threads and processes.
//!
//! The trait is synchronous. Backends enforce their own call timeouts.

mod chaotic;
mod error;
mod memory;

use std::time::Duration;

pub use chaotic::ChaoticStore;
pub use error::StoreError;
pub use memory::MemoryStore;

/// Shared key-value store with per-key TTLs.
///
/// Must be Clone (handed to several authorities), Send + Sync (thread-safe),
/// and synchronous. Implementations typically share internal state via Arc,
/// so clones access the same underlying data.
///
/// Every call is atomic with respect to the keys it touches. Backends surface
/// call timeouts as [`StoreError::Unavailable`].
pub trait Store: Clone + Send + Sync + 'static {
    /// Value stored under `key`, or `None` if absent or expired.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value and TTL.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remove `key`. Returns whether a live value was removed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Reset the TTL of an existing key. Returns false if the key is absent.
    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Remaining lifetime of `key`, or `None` if absent.
    fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;

    /// Read and remove `key` in one atomic step.
    ///
    /// # Invariants
    ///
    /// - Of any number of concurrent callers for one key, at most one
    ///   observes `Some`
    fn get_and_delete(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Prepend `member` to the JSON-array list at `list_key`, keeping at most
    /// `cap` entries, most recent first.
    ///
    /// In the same atomic step: the list TTL is reset to `ttl`, and for every
    /// id pushed off the tail the key `evict_prefix + id` is deleted.
    ///
    /// Returns the evicted ids.
    ///
    /// # Invariants
    ///
    /// - Post: the list never holds more than `cap` entries, regardless of
    ///   how many callers push concurrently
    fn push_bounded(
        &self,
        list_key: &str,
        member: &str,
        cap: usize,
        ttl: Duration,
        evict_prefix: &str,
    ) -> Result<Vec<String>, StoreError>;

    /// Entries of the list at `list_key`, most recent first. Empty if absent.
    fn list(&self, list_key: &str) -> Result<Vec<String>, StoreError> {
        match self.get(list_key)? {
            Some(raw) => decode_list(&raw),
            None => Ok(Vec::new()),
        }
    }
}

/// Decode a JSON-array list value.
pub fn decode_list(raw: &str) -> Result<Vec<String>, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Encode a list value as a JSON array.
pub fn encode_list(entries: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(entries).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Prepend `member` and truncate to `cap`.
///
/// An existing copy of `member` is moved to the front rather than duplicated.
/// Returns the evicted tail. Shared by backends that implement
/// [`Store::push_bounded`] inside their own critical section.
pub fn bounded_prepend(entries: &mut Vec<String>, member: &str, cap: usize) -> Vec<String> {
    entries.retain(|existing| existing != member);
    entries.insert(0, member.to_string());

    if entries.len() > cap { entries.split_off(cap) } else { Vec::new() }
}

/// Whole seconds of a TTL, rounded up so sub-second TTLs never mean "expire
/// immediately".
pub fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 { secs + 1 } else { secs }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_prepend_keeps_most_recent_first() {
        let mut entries = vec!["b".to_string(), "a".to_string()];
        let evicted = bounded_prepend(&mut entries, "c", 5);

        assert_eq!(entries, vec!["c", "b", "a"]);
        assert!(evicted.is_empty());
    }

    #[test]
    fn bounded_prepend_evicts_oldest() {
        let mut entries: Vec<String> = (1..=5).rev().map(|i| i.to_string()).collect();
        let evicted = bounded_prepend(&mut entries, "6", 5);

        assert_eq!(entries, vec!["6", "5", "4", "3", "2"]);
        assert_eq!(evicted, vec!["1"]);
    }

    #[test]
    fn bounded_prepend_moves_existing_member() {
        let mut entries = vec!["b".to_string(), "a".to_string()];
        let evicted = bounded_prepend(&mut entries, "a", 5);

        assert_eq!(entries, vec!["a", "b"]);
        assert!(evicted.is_empty());
    }

    #[test]
    fn list_codec_is_json_array() {
        let encoded = encode_list(&["x".to_string(), "y".to_string()]).unwrap();
        assert_eq!(encoded, r#"["x","y"]"#);
        assert_eq!(decode_list(&encoded).unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn decode_list_rejects_non_array() {
        assert!(matches!(decode_list("{}"), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn ttl_secs_rounds_up() {
        assert_eq!(ttl_secs(Duration::from_secs(300)), 300);
        assert_eq!(ttl_secs(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_secs(Duration::from_millis(1)), 1);
    }
}
