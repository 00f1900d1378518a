//! Warden production server.
//!
//! Production glue around [`warden_core`]: the real clock and OS RNG, a
//! durable Redb store, and the [`Gate`] every request and response passes
//! through.
//!
//! # Components
//!
//! - [`Gate`]: envelope, nonce and session checks in a fixed order
//! - [`RedbStore`]: durable single-node [`Store`](warden_core::Store)
//! - [`SystemEnv`]: production environment (real time, crypto RNG)
//! - [`WardenConfig`]: start-up configuration that assembles a gate
//! - [`commands`]: operator commands behind the `warden` binary

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
mod config;
mod error;
pub mod gate;
pub mod storage;
mod system_env;

pub use config::{RECOMMENDED_SECRET_LEN, Secrets, WardenConfig};
pub use error::ServerError;
pub use gate::{Gate, OpenedRequest, Rejection, SessionRequirement};
pub use storage::RedbStore;
pub use system_env::SystemEnv;
