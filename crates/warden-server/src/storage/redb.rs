//! Redb-backed durable store.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety.
//! Nonces and credentials survive restarts. Every mutating call, including
//! the compound `get_and_delete` and `push_bounded`, is one write
//! transaction; Redb serializes write transactions, which makes them atomic
//! across threads of this process.
//!
//! Redb holds an exclusive lock on the database file, so a single process
//! owns it. Deployments with several server processes need a networked
//! backend behind the same [`Store`] trait.

use std::{path::Path, sync::Arc, time::Duration};

use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use warden_core::{
    Environment, Store, StoreError,
    store::{bounded_prepend, decode_list, encode_list, ttl_secs},
};

/// Table: entries
/// Key: store key (UTF-8)
/// Value: CBOR-encoded `StoredEntry`
const ENTRIES: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");

/// Value plus absolute expiry. The entry is live while `now < expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredEntry {
    value: String,
    expires_at: u64,
}

impl StoredEntry {
    fn encode(&self) -> Result<Vec<u8>, StoreError> {
        let mut bytes = Vec::with_capacity(self.value.len() + 16);
        ciborium::into_writer(self, &mut bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn is_live(&self, now: u64) -> bool {
        now < self.expires_at
    }
}

/// Durable store backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc). Expired
/// entries are ignored on read and removed by writes that touch them or by
/// [`RedbStore::purge_expired`].
#[derive(Clone)]
pub struct RedbStore<E: Environment> {
    db: Arc<Database>,
    env: E,
}

fn unavailable(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

impl<E: Environment> RedbStore<E> {
    /// Open or create a Redb database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the database cannot be opened or
    /// created (including when another process holds it).
    pub fn open(path: impl AsRef<Path>, env: E) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(unavailable)?;

        let txn = db.begin_write().map_err(unavailable)?;
        {
            let _ = txn.open_table(ENTRIES).map_err(backend)?;
        }
        txn.commit().map_err(backend)?;

        Ok(Self { db: Arc::new(db), env })
    }

    /// Delete every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = self.env.wall_clock_secs();
        let txn = self.db.begin_write().map_err(unavailable)?;

        let removed = {
            let mut table = txn.open_table(ENTRIES).map_err(backend)?;

            let mut expired = Vec::new();
            for row in table.iter().map_err(backend)? {
                let (key, value) = row.map_err(backend)?;
                // Undecodable entries are unusable; purge them too
                let live = StoredEntry::decode(value.value()).is_ok_and(|e| e.is_live(now));
                if !live {
                    expired.push(key.value().to_string());
                }
            }

            for key in &expired {
                table.remove(key.as_str()).map_err(backend)?;
            }
            expired.len()
        };

        txn.commit().map_err(backend)?;
        Ok(removed)
    }

    /// Run `f` against the entries table inside one write transaction and
    /// commit if it succeeds.
    fn write<T>(
        &self,
        f: impl FnOnce(&mut redb::Table<'_, &'static str, &'static [u8]>, u64) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let now = self.env.wall_clock_secs();
        let txn = self.db.begin_write().map_err(unavailable)?;

        let result = {
            let mut table = txn.open_table(ENTRIES).map_err(backend)?;
            f(&mut table, now)?
        };

        txn.commit().map_err(backend)?;
        Ok(result)
    }

    fn expiry(&self, now: u64, ttl: Duration) -> u64 {
        now.saturating_add(ttl_secs(ttl))
    }
}

/// Live entry under `key` within an open write transaction.
fn live_entry(
    table: &redb::Table<'_, &'static str, &'static [u8]>,
    key: &str,
    now: u64,
) -> Result<Option<StoredEntry>, StoreError> {
    let bytes = table.get(key).map_err(backend)?.map(|guard| guard.value().to_vec());
    match bytes {
        Some(bytes) => Ok(Some(StoredEntry::decode(&bytes)?).filter(|e| e.is_live(now))),
        None => Ok(None),
    }
}

fn insert(
    table: &mut redb::Table<'_, &'static str, &'static [u8]>,
    key: &str,
    entry: &StoredEntry,
) -> Result<(), StoreError> {
    let bytes = entry.encode()?;
    table.insert(key, bytes.as_slice()).map_err(backend)?;
    Ok(())
}

impl<E: Environment> Store for RedbStore<E> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.env.wall_clock_secs();
        let txn = self.db.begin_read().map_err(unavailable)?;
        let table = txn.open_table(ENTRIES).map_err(backend)?;

        match table.get(key).map_err(backend)? {
            Some(guard) => {
                let entry = StoredEntry::decode(guard.value())?;
                Ok(entry.is_live(now).then_some(entry.value))
            },
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.write(|table, now| {
            let entry = StoredEntry { value: value.to_string(), expires_at: self.expiry(now, ttl) };
            insert(table, key, &entry)
        })
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.write(|table, now| {
            let was_live = live_entry(table, key, now)?.is_some();
            table.remove(key).map_err(backend)?;
            Ok(was_live)
        })
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.write(|table, now| match live_entry(table, key, now)? {
            Some(mut entry) => {
                entry.expires_at = self.expiry(now, ttl);
                insert(table, key, &entry)?;
                Ok(true)
            },
            None => Ok(false),
        })
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let now = self.env.wall_clock_secs();
        let txn = self.db.begin_read().map_err(unavailable)?;
        let table = txn.open_table(ENTRIES).map_err(backend)?;

        match table.get(key).map_err(backend)? {
            Some(guard) => {
                let entry = StoredEntry::decode(guard.value())?;
                Ok(entry.is_live(now).then(|| Duration::from_secs(entry.expires_at - now)))
            },
            None => Ok(None),
        }
    }

    fn get_and_delete(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.write(|table, now| {
            let entry = live_entry(table, key, now)?;
            table.remove(key).map_err(backend)?;
            Ok(entry.map(|e| e.value))
        })
    }

    fn push_bounded(
        &self,
        list_key: &str,
        member: &str,
        cap: usize,
        ttl: Duration,
        evict_prefix: &str,
    ) -> Result<Vec<String>, StoreError> {
        self.write(|table, now| {
            let mut list = match live_entry(table, list_key, now)? {
                Some(entry) => decode_list(&entry.value)?,
                None => Vec::new(),
            };

            let evicted = bounded_prepend(&mut list, member, cap);

            let entry = StoredEntry { value: encode_list(&list)?, expires_at: self.expiry(now, ttl) };
            insert(table, list_key, &entry)?;

            for id in &evicted {
                table.remove(format!("{evict_prefix}{id}").as_str()).map_err(backend)?;
            }

            Ok(evicted)
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use warden_harness::SimEnv;

    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn entry_cbor_roundtrip() {
        let entry = StoredEntry { value: "v".to_string(), expires_at: 99 };
        assert_eq!(StoredEntry::decode(&entry.encode().unwrap()).unwrap(), entry);
    }

    #[test]
    fn corrupt_entry_is_serialization_error() {
        assert!(matches!(StoredEntry::decode(&[0xFF, 0x00]), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn set_get_and_expire() {
        let dir = tempdir().unwrap();
        let env = SimEnv::with_seed(1);
        let store = RedbStore::open(dir.path().join("test.redb"), env.clone()).unwrap();

        store.set("k", "v", MINUTE).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.ttl("k").unwrap(), Some(MINUTE));

        env.advance(MINUTE);
        assert_eq!(store.get("k").unwrap(), None);
        assert_eq!(store.ttl("k").unwrap(), None);
    }
}
