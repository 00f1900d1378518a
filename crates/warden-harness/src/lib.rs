//! Deterministic simulation harness for Warden.
//!
//! [`SimEnv`] replaces the wall clock and OS RNG with a virtual clock and a
//! seeded ChaCha20 stream, so expiry, sliding refresh and entropy failures
//! can be driven step by step. [`SimWorld`] wires a complete gate over it and
//! [`SimClient`] plays the caller.
//!
//! # Invariant Testing
//!
//! The [`invariants`] module checks store-level properties that must hold
//! after any interleaving of operations, for example that no account index
//! ever exceeds the credential cap.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod invariants;
pub mod keys;
pub mod sim_env;
pub mod world;

pub use client::SimClient;
pub use invariants::{Violation, check_account};
pub use keys::{client_key, server_keys};
pub use sim_env::SimEnv;
pub use world::{SimWorld, TEST_NONCE_SUFFIX, TEST_SESSION_SECRET};
