//! Warden core: the stateful half of the security boundary.
//!
//! Session credentials and anti-replay nonces, both held in a shared TTL
//! key-value store so that any number of server processes can verify them.
//!
//! # Architecture
//!
//! ```text
//!  NonceGuard ─────┐
//!                  ├──► Store (memory / chaotic / redb ...)
//!  SessionAuthority┘
//!        │
//!        └──► Environment (wall clock, entropy)
//! ```
//!
//! Authorities keep no in-process state. Atomicity comes from two compound
//! store primitives:
//!
//! - [`Store::get_and_delete`]: a nonce is accepted at most once
//! - [`Store::push_bounded`]: an account never indexes more than the cap
//!
//! # Determinism
//!
//! Time and randomness come from [`Environment`]. Tests drive a virtual clock
//! and seeded RNG; production uses the OS. Entropy failure is an error
//! ([`EntropyUnavailable`]), never a silent fallback.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod error;
pub mod nonce;
pub mod session;
pub mod store;

pub use env::Environment;
pub use error::{EntropyUnavailable, NonceError, SessionError};
pub use nonce::{DEFAULT_NONCE_TTL, NonceConfig, NonceGuard};
pub use session::{
    AccountId, CredentialStatus, CredentialSummary, IssueContext, IssuedCredential,
    SessionAuthority, SessionPolicy, VerifiedSession,
};
pub use store::{ChaoticStore, MemoryStore, Store, StoreError};
