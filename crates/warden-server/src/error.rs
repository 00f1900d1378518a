//! Server error types.

use std::fmt;

use warden_core::{NonceError, SessionError, StoreError};
use warden_crypto::{AtRestError, EnvelopeError, KeyMaterialError};

/// Errors surfaced by server start-up and operator commands.
///
/// Request handling never returns these to callers; the gate maps failures
/// to a [`Rejection`](crate::gate::Rejection) instead.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error (missing key file, empty secret, bad policy).
    ///
    /// Fatal at start-up. Fix configuration and restart.
    Config(String),

    /// Filesystem error reading or writing key material.
    Io(std::io::Error),

    /// Store backend could not be opened or failed a call.
    Store(StoreError),

    /// Key material, envelope or at-rest codec failure.
    Crypto(String),

    /// Session credential operation failed.
    Session(SessionError),

    /// Nonce operation failed.
    Nonce(NonceError),

    /// Internal error (unexpected state, logic bug).
    ///
    /// Should never happen in a correct implementation.
    Internal(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Store(err) => write!(f, "store error: {err}"),
            Self::Crypto(msg) => write!(f, "crypto error: {msg}"),
            Self::Session(err) => write!(f, "session error: {err}"),
            Self::Nonce(err) => write!(f, "nonce error: {err}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::Nonce(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<SessionError> for ServerError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl From<NonceError> for ServerError {
    fn from(err: NonceError) -> Self {
        Self::Nonce(err)
    }
}

impl From<KeyMaterialError> for ServerError {
    fn from(err: KeyMaterialError) -> Self {
        Self::Crypto(err.to_string())
    }
}

impl From<EnvelopeError> for ServerError {
    fn from(err: EnvelopeError) -> Self {
        Self::Crypto(err.to_string())
    }
}

impl From<AtRestError> for ServerError {
    fn from(err: AtRestError) -> Self {
        Self::Crypto(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn display_prefixes_category() {
        assert_eq!(
            ServerError::Config("missing key".to_string()).to_string(),
            "configuration error: missing key"
        );
        assert_eq!(
            ServerError::from(SessionError::Revoked).to_string(),
            "session error: session credential revoked"
        );
    }

    #[test]
    fn wrapped_errors_expose_source() {
        let err = ServerError::from(StoreError::Unavailable("timeout".to_string()));
        assert!(err.source().is_some());
        assert!(ServerError::Internal("bug".to_string()).source().is_none());
    }
}
