//! A complete boundary wired to a simulated environment.
//!
//! ```text
//! SimEnv ──► Store ──┬─► NonceGuard ───────┐
//!                    └─► SessionAuthority ─┴─► Gate
//! ```
//!
//! The store defaults to [`MemoryStore`]; chaos and durability tests pass
//! their own through [`SimWorld::with_store`].

use warden_core::{
    MemoryStore, NonceConfig, NonceGuard, SessionAuthority, SessionPolicy, Store,
};
use warden_crypto::SigningKey;
use warden_server::Gate;

use crate::{client::SimClient, keys::server_keys, sim_env::SimEnv};

/// HMAC secret for harness credentials.
pub const TEST_SESSION_SECRET: &[u8] = b"harness-session-secret-0123456789abcdef";

/// Nonce key suffix for harness nonces.
pub const TEST_NONCE_SUFFIX: &str = "-harness-suffix";

/// Environment, store and gate for one simulation.
pub struct SimWorld<S: Store = MemoryStore<SimEnv>> {
    /// Shared virtual clock and RNG.
    pub env: SimEnv,
    /// Store every component shares.
    pub store: S,
    /// The boundary under test.
    pub gate: Gate<S, SimEnv>,
}

impl SimWorld {
    /// Memory-backed world with the default session policy.
    pub fn new(seed: u64) -> Self {
        Self::with_policy(seed, SessionPolicy::default())
    }

    /// Memory-backed world with a custom session policy.
    pub fn with_policy(seed: u64, policy: SessionPolicy) -> Self {
        let env = SimEnv::with_seed(seed);
        let store = MemoryStore::new(env.clone());
        Self::with_store(env, store, policy)
    }
}

impl<S: Store> SimWorld<S> {
    /// World over a caller-supplied store. `env` must be the environment the
    /// store reads its clock from.
    pub fn with_store(env: SimEnv, store: S, policy: SessionPolicy) -> Self {
        let nonces =
            NonceGuard::new(store.clone(), env.clone(), NonceConfig::new(TEST_NONCE_SUFFIX));
        let sessions = SessionAuthority::new(
            store.clone(),
            env.clone(),
            SigningKey::new(TEST_SESSION_SECRET),
            policy,
        );
        let gate = Gate::new(server_keys(), nonces, sessions, env.clone());

        Self { env, store, gate }
    }

    /// Nonce guard of the gate.
    pub fn nonces(&self) -> &NonceGuard<S, SimEnv> {
        self.gate.nonces()
    }

    /// Session authority of the gate.
    pub fn sessions(&self) -> &SessionAuthority<S, SimEnv> {
        self.gate.sessions()
    }

    /// A caller sealing to this world's server key.
    pub fn client(&self, seed: u64) -> SimClient {
        SimClient::new(self.gate.keys().public_key().clone(), seed)
    }
}
