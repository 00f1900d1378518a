#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use super::{Store, StoreError, bounded_prepend, decode_list, encode_list, ttl_secs};
use crate::env::Environment;

/// In-memory store for tests, simulation and single-process deployments
///
/// Expiry is judged against the environment's wall clock, so a simulated
/// clock drives TTLs deterministically. Expired entries are dropped lazily on
/// access. Every operation, including the compound ones, runs inside one
/// critical section. A poisoned mutex surfaces as
/// [`StoreError::Unavailable`] instead of a panic.
#[derive(Clone)]
pub struct MemoryStore<E: Environment> {
    env: E,
    inner: Arc<Mutex<HashMap<String, Entry>>>,
}

struct Entry {
    value: String,
    /// Unix seconds; the entry is live while `now < expires_at`
    expires_at: u64,
}

impl<E: Environment> MemoryStore<E> {
    /// Create an empty store that reads time from `env`.
    pub fn new(env: E) -> Self {
        Self { env, inner: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Number of live keys.
    ///
    /// Useful for debugging and testing.
    pub fn live_key_count(&self) -> Result<usize, StoreError> {
        let now = self.env.wall_clock_secs();
        let entries = self.lock()?;
        Ok(entries.values().filter(|entry| now < entry.expires_at).count())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn expiry(&self, ttl: Duration) -> u64 {
        self.env.wall_clock_secs().saturating_add(ttl_secs(ttl))
    }
}

/// Live entry under `key`, dropping it first if it has expired.
fn live<'a>(entries: &'a mut HashMap<String, Entry>, key: &str, now: u64) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(|entry| now >= entry.expires_at) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

impl<E: Environment> Store for MemoryStore<E> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.env.wall_clock_secs();
        let mut entries = self.lock()?;
        Ok(live(&mut entries, key, now).map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = self.expiry(ttl);
        let mut entries = self.lock()?;
        entries.insert(key.to_string(), Entry { value: value.to_string(), expires_at });
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = self.env.wall_clock_secs();
        let mut entries = self.lock()?;
        Ok(entries.remove(key).is_some_and(|entry| now < entry.expires_at))
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = self.env.wall_clock_secs();
        let expires_at = self.expiry(ttl);
        let mut entries = self.lock()?;

        match live(&mut entries, key, now) {
            Some(entry) => {
                entry.expires_at = expires_at;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let now = self.env.wall_clock_secs();
        let mut entries = self.lock()?;
        Ok(live(&mut entries, key, now).map(|entry| Duration::from_secs(entry.expires_at - now)))
    }

    fn get_and_delete(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.env.wall_clock_secs();
        let mut entries = self.lock()?;
        Ok(entries.remove(key).filter(|entry| now < entry.expires_at).map(|entry| entry.value))
    }

    fn push_bounded(
        &self,
        list_key: &str,
        member: &str,
        cap: usize,
        ttl: Duration,
        evict_prefix: &str,
    ) -> Result<Vec<String>, StoreError> {
        let now = self.env.wall_clock_secs();
        let expires_at = self.expiry(ttl);
        let mut entries = self.lock()?;

        let mut list = match live(&mut entries, list_key, now) {
            Some(entry) => decode_list(&entry.value)?,
            None => Vec::new(),
        };

        let evicted = bounded_prepend(&mut list, member, cap);
        debug_assert!(list.len() <= cap.max(1));

        let value = encode_list(&list)?;
        entries.insert(list_key.to_string(), Entry { value, expires_at });

        for id in &evicted {
            entries.remove(&format!("{evict_prefix}{id}"));
        }

        Ok(evicted)
    }
}
