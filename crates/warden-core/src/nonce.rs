//! One-time anti-replay tokens.
//!
//! A nonce is 16 random bytes, hex encoded. Issuance records it in the shared
//! store with a short TTL; verification consumes the record with a single
//! atomic `get_and_delete`, so a nonce is accepted at most once across every
//! process sharing the store.
//!
//! Store keys are the public value followed by a server-side secret suffix.

use std::time::Duration;

use crate::{env::Environment, error::NonceError, store::Store};

/// Default nonce lifetime (5 minutes).
pub const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(300);

/// Random bytes per nonce.
pub const NONCE_BYTES: usize = 16;

/// Store key prefix for nonce records.
pub const NONCE_KEY_PREFIX: &str = "nonce:";

/// Nonce configuration.
#[derive(Debug, Clone)]
pub struct NonceConfig {
    /// How long an issued nonce stays redeemable.
    pub ttl: Duration,
    /// Secret appended to every nonce before it is used as a store key.
    pub suffix: String,
}

impl NonceConfig {
    /// Configuration with the default TTL and the given secret suffix.
    pub fn new(suffix: impl Into<String>) -> Self {
        Self { ttl: DEFAULT_NONCE_TTL, suffix: suffix.into() }
    }
}

/// Issues and single-use-verifies anti-replay tokens.
#[derive(Clone)]
pub struct NonceGuard<S: Store, E: Environment> {
    store: S,
    env: E,
    config: NonceConfig,
}

impl<S: Store, E: Environment> NonceGuard<S, E> {
    /// Create a guard over `store`.
    pub fn new(store: S, env: E, config: NonceConfig) -> Self {
        Self { store, env, config }
    }

    /// Issue a fresh nonce.
    ///
    /// # Errors
    ///
    /// - `EntropyUnavailable`: the environment could not supply random bytes
    /// - `StoreUnavailable`: the record could not be written
    pub fn issue(&self) -> Result<String, NonceError> {
        let bytes: [u8; NONCE_BYTES] = self.env.random_array()?;
        let value = hex::encode(bytes);

        let issued_at = self.env.wall_clock_secs();
        self.store.set(&self.store_key(&value), &issued_at.to_string(), self.config.ttl)?;

        tracing::debug!(issued_at, "issued nonce");
        Ok(value)
    }

    /// Consume a nonce.
    ///
    /// Succeeds at most once per issued value. The record is gone after this
    /// call whatever the outcome.
    ///
    /// # Errors
    ///
    /// - `NotFoundOrExpired`: never issued, already consumed, or record
    ///   expired (also for an unreadable record)
    /// - `Expired`: record still present but older than the TTL
    /// - `StoreUnavailable`: backend failure; the nonce may or may not have
    ///   been consumed
    pub fn verify(&self, value: &str) -> Result<(), NonceError> {
        let Some(raw) = self.store.get_and_delete(&self.store_key(value))? else {
            tracing::debug!("nonce rejected: not found or already used");
            return Err(NonceError::NotFoundOrExpired);
        };

        let Ok(issued_at) = raw.parse::<u64>() else {
            tracing::warn!("nonce record unreadable, treating as never issued");
            return Err(NonceError::NotFoundOrExpired);
        };

        let age = self.env.wall_clock_secs().saturating_sub(issued_at);
        if age > self.config.ttl.as_secs() {
            tracing::debug!(age, "nonce rejected: expired");
            return Err(NonceError::Expired);
        }

        Ok(())
    }

    fn store_key(&self, value: &str) -> String {
        let suffix = self.config.suffix.as_str();
        if value.ends_with(suffix) {
            format!("{NONCE_KEY_PREFIX}{value}")
        } else {
            format!("{NONCE_KEY_PREFIX}{value}{suffix}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        env::test_env::TestEnv,
        store::{ChaoticStore, MemoryStore},
    };

    const SUFFIX: &str = "-s3cret";

    fn guard(env: &TestEnv) -> NonceGuard<MemoryStore<TestEnv>, TestEnv> {
        NonceGuard::new(MemoryStore::new(env.clone()), env.clone(), NonceConfig::new(SUFFIX))
    }

    #[test]
    fn issued_nonce_is_32_hex_chars() {
        let env = TestEnv::new(1_000);
        let nonce = guard(&env).issue().unwrap();

        assert_eq!(nonce.len(), NONCE_BYTES * 2);
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn nonce_is_single_use() {
        let env = TestEnv::new(1_000);
        let guard = guard(&env);
        let nonce = guard.issue().unwrap();

        assert_eq!(guard.verify(&nonce), Ok(()));
        assert_eq!(guard.verify(&nonce), Err(NonceError::NotFoundOrExpired));
    }

    #[test]
    fn unknown_nonce_rejected() {
        let env = TestEnv::new(1_000);
        assert_eq!(guard(&env).verify("deadbeef"), Err(NonceError::NotFoundOrExpired));
    }

    #[test]
    fn value_with_suffix_already_appended_is_accepted() {
        let env = TestEnv::new(1_000);
        let guard = guard(&env);
        let nonce = guard.issue().unwrap();

        assert_eq!(guard.verify(&format!("{nonce}{SUFFIX}")), Ok(()));
    }

    #[test]
    fn record_is_stored_under_suffixed_key() {
        let env = TestEnv::new(1_000);
        let store = MemoryStore::new(env.clone());
        let guard = NonceGuard::new(store.clone(), env.clone(), NonceConfig::new(SUFFIX));

        let nonce = guard.issue().unwrap();

        assert_eq!(store.get(&format!("nonce:{nonce}{SUFFIX}")).unwrap(), Some("1000".into()));
        assert_eq!(store.get(&format!("nonce:{nonce}")).unwrap(), None);
    }

    #[test]
    fn nonce_expires_after_ttl() {
        let env = TestEnv::new(1_000);
        let guard = guard(&env);
        let nonce = guard.issue().unwrap();

        env.advance(301);
        assert_eq!(guard.verify(&nonce), Err(NonceError::NotFoundOrExpired));
    }

    #[test]
    fn nonce_valid_just_before_ttl() {
        let env = TestEnv::new(1_000);
        let guard = guard(&env);
        let nonce = guard.issue().unwrap();

        env.advance(299);
        assert_eq!(guard.verify(&nonce), Ok(()));
    }

    #[test]
    fn stale_record_with_lagging_store_ttl_is_expired() {
        let env = TestEnv::new(1_000);
        let store = MemoryStore::new(env.clone());
        let guard = NonceGuard::new(store.clone(), env.clone(), NonceConfig::new(SUFFIX));

        store.set(&format!("nonce:abc{SUFFIX}"), "1000", Duration::from_secs(3_600)).unwrap();
        env.advance(400);

        assert_eq!(guard.verify("abc"), Err(NonceError::Expired));
        assert_eq!(guard.verify("abc"), Err(NonceError::NotFoundOrExpired));
    }

    #[test]
    fn unreadable_record_is_not_found() {
        let env = TestEnv::new(1_000);
        let store = MemoryStore::new(env.clone());
        let guard = NonceGuard::new(store.clone(), env.clone(), NonceConfig::new(SUFFIX));

        store.set(&format!("nonce:abc{SUFFIX}"), "yesterday", DEFAULT_NONCE_TTL).unwrap();
        assert_eq!(guard.verify("abc"), Err(NonceError::NotFoundOrExpired));
    }

    #[test]
    fn entropy_failure_is_reported() {
        let env = TestEnv::new(1_000);
        let guard = guard(&env);

        env.fail_entropy(true);
        assert_eq!(guard.issue(), Err(NonceError::EntropyUnavailable));
    }

    #[test]
    fn store_failure_is_reported() {
        let env = TestEnv::new(1_000);
        let store = ChaoticStore::new(MemoryStore::new(env.clone()), 1.0);
        let guard = NonceGuard::new(store, env, NonceConfig::new(SUFFIX));

        assert!(matches!(guard.issue(), Err(NonceError::StoreUnavailable(_))));
        assert!(matches!(guard.verify("abc"), Err(NonceError::StoreUnavailable(_))));
    }
}
