//! Chaotic store wrapper for fault injection testing
//!
//! Store wrapper that randomly fails operations to test error handling. Used
//! for chaos testing to ensure nonce and session logic turn every backend
//! failure into a typed error without panicking or double-accepting.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use super::{Store, StoreError};

/// Chaotic store wrapper that randomly injects failures
///
/// Delegates to an underlying store but fails calls with
/// [`StoreError::Unavailable`] at a configured rate, before the call reaches
/// the inner store. A failed call therefore has no side effects, which
/// mirrors a request that timed out before the backend saw it.
#[derive(Clone)]
pub struct ChaoticStore<S: Store> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    operation_count: Arc<AtomicUsize>,
}

/// Linear congruential generator; reproducible chaos from a seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // Numerical Recipes constants
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: Store> ChaoticStore<S> {
    /// Wrap `inner` with the default seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x5EED_CAFE_F00D_0001)
    }

    /// Wrap `inner` with an explicit seed for reproducible chaos.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng { state: seed })),
            operation_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Underlying store (for checking invariants after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of store calls attempted, failed or not.
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::Relaxed)
    }

    /// Count the call and decide whether it fails.
    fn inject(&self) -> Result<(), StoreError> {
        self.operation_count.fetch_add(1, Ordering::Relaxed);

        // A poisoned RNG lock is itself a failure worth surfacing
        let roll = match self.rng.lock() {
            Ok(mut rng) => rng.next(),
            Err(_) => 0.0,
        };

        if roll < self.failure_rate {
            return Err(StoreError::Unavailable("chaotic failure injection".to_string()));
        }
        Ok(())
    }
}

impl<S: Store> Store for ChaoticStore<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inject()?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.inject()?;
        self.inner.set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.inject()?;
        self.inner.delete(key)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.inject()?;
        self.inner.expire(key, ttl)
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        self.inject()?;
        self.inner.ttl(key)
    }

    fn get_and_delete(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inject()?;
        self.inner.get_and_delete(key)
    }

    fn push_bounded(
        &self,
        list_key: &str,
        member: &str,
        cap: usize,
        ttl: Duration,
        evict_prefix: &str,
    ) -> Result<Vec<String>, StoreError> {
        self.inject()?;
        self.inner.push_bounded(list_key, member, cap, ttl, evict_prefix)
    }
}
