//! Environment abstraction for deterministic testing.
//!
//! Decouples credential and nonce logic from system resources (wall clock,
//! randomness). Enables deterministic simulation (virtual clock, seeded RNG,
//! injected entropy failure) and production use with real system resources.

use crate::error::EntropyUnavailable;

/// Abstract environment providing time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - `random_bytes()` never substitutes a weaker generator when the secure
///   source fails; it reports [`EntropyUnavailable`] instead
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time as Unix seconds.
    ///
    /// Used for credential timestamps, nonce ages and store TTLs.
    fn wall_clock_secs(&self) -> u64;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    /// - On error the buffer contents are unspecified and must not be used
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyUnavailable>;

    /// Generates a fixed-size array of random bytes.
    fn random_array<const N: usize>(&self) -> Result<[u8; N], EntropyUnavailable> {
        let mut bytes = [0u8; N];
        self.random_bytes(&mut bytes)?;
        Ok(bytes)
    }
}

/// Minimal environment for unit tests inside this crate.
///
/// Integration tests use the harness `SimEnv` instead.
#[cfg(test)]
pub(crate) mod test_env {
    #![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]
    #![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    };

    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    use super::Environment;
    use crate::error::EntropyUnavailable;

    #[derive(Clone)]
    pub(crate) struct TestEnv {
        clock: Arc<AtomicU64>,
        rng: Arc<Mutex<ChaCha20Rng>>,
        entropy_fails: Arc<AtomicBool>,
    }

    impl TestEnv {
        pub(crate) fn new(start_secs: u64) -> Self {
            Self {
                clock: Arc::new(AtomicU64::new(start_secs)),
                rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(start_secs))),
                entropy_fails: Arc::new(AtomicBool::new(false)),
            }
        }

        pub(crate) fn advance(&self, secs: u64) {
            self.clock.fetch_add(secs, Ordering::SeqCst);
        }

        pub(crate) fn fail_entropy(&self, fail: bool) {
            self.entropy_fails.store(fail, Ordering::SeqCst);
        }
    }

    impl Environment for TestEnv {
        fn wall_clock_secs(&self) -> u64 {
            self.clock.load(Ordering::SeqCst)
        }

        fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyUnavailable> {
            if self.entropy_fails.load(Ordering::SeqCst) {
                return Err(EntropyUnavailable);
            }
            self.rng.lock().expect("rng mutex poisoned").fill_bytes(buffer);
            Ok(())
        }
    }
}
