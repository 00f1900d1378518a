//! Simulated environment: virtual wall clock and seeded RNG.
//!
//! Time only moves when a test advances it, and every random byte comes from
//! a ChaCha20 stream keyed by the seed, so a failing run replays exactly.
//! Entropy can be switched off to exercise the `EntropyUnavailable` paths.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use warden_core::{EntropyUnavailable, Environment};

/// Wall-clock start for simulations (2023-11-14T22:13:20Z).
pub const DEFAULT_START_SECS: u64 = 1_700_000_000;

/// Deterministic [`Environment`] for tests.
///
/// Clones share the clock, RNG stream and entropy switch.
#[derive(Clone)]
pub struct SimEnv {
    clock: Arc<AtomicU64>,
    rng: Arc<Mutex<ChaCha20Rng>>,
    entropy_available: Arc<AtomicBool>,
}

impl SimEnv {
    /// Environment seeded with `seed`, clock at [`DEFAULT_START_SECS`].
    pub fn with_seed(seed: u64) -> Self {
        Self::starting_at(seed, DEFAULT_START_SECS)
    }

    /// Environment seeded with `seed`, clock at `start_secs`.
    pub fn starting_at(seed: u64, start_secs: u64) -> Self {
        Self {
            clock: Arc::new(AtomicU64::new(start_secs)),
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
            entropy_available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.fetch_add(by.as_secs(), Ordering::SeqCst);
    }

    /// Turn the entropy source on or off.
    pub fn set_entropy_available(&self, available: bool) {
        self.entropy_available.store(available, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    fn wall_clock_secs(&self) -> u64 {
        self.clock.load(Ordering::SeqCst)
    }

    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyUnavailable> {
        if !self.entropy_available.load(Ordering::SeqCst) {
            return Err(EntropyUnavailable);
        }

        let mut rng = self.rng.lock().map_err(|_| EntropyUnavailable)?;
        rng.fill_bytes(buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bytes() {
        let a = SimEnv::with_seed(42);
        let b = SimEnv::with_seed(42);

        assert_eq!(a.random_array::<32>().unwrap(), b.random_array::<32>().unwrap());
    }

    #[test]
    fn clones_share_stream() {
        let a = SimEnv::with_seed(42);
        let b = a.clone();

        assert_ne!(a.random_array::<16>().unwrap(), b.random_array::<16>().unwrap());
    }

    #[test]
    fn clock_only_moves_when_advanced() {
        let env = SimEnv::with_seed(1);
        assert_eq!(env.wall_clock_secs(), DEFAULT_START_SECS);

        env.advance(Duration::from_secs(90));
        assert_eq!(env.wall_clock_secs(), DEFAULT_START_SECS + 90);
    }

    #[test]
    fn entropy_switch() {
        let env = SimEnv::with_seed(1);
        env.set_entropy_available(false);
        assert_eq!(env.random_array::<8>(), Err(EntropyUnavailable));

        env.set_entropy_available(true);
        assert!(env.random_array::<8>().is_ok());
    }
}
