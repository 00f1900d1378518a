//! Production store backends.
//!
//! The [`Store`](warden_core::Store) trait and the in-memory / chaotic
//! implementations live in `warden-core`; this module adds the durable
//! backend the `warden` binary runs on.

mod redb;

pub use self::redb::RedbStore;
