//! Error types for the Warden core.
//!
//! One enum per authority. Variants map onto the caller-facing rejection
//! classes; the server layer collapses them further so that no response
//! reveals which cryptographic sub-check failed.

use thiserror::Error;

use crate::store::StoreError;

/// The environment could not supply cryptographically secure random bytes.
///
/// Never papered over with a weaker generator.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cryptographic randomness unavailable")]
pub struct EntropyUnavailable;

/// Errors from nonce issuance and verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NonceError {
    /// Could not draw random bytes for a new nonce.
    #[error("entropy unavailable for nonce generation")]
    EntropyUnavailable,

    /// Nonce was never issued, already consumed, or its record expired.
    #[error("nonce not found or expired")]
    NotFoundOrExpired,

    /// Nonce record was found (and consumed) but is older than the TTL.
    #[error("nonce expired")]
    Expired,

    /// Backing store failed or timed out.
    #[error("nonce store unavailable: {0}")]
    StoreUnavailable(String),
}

impl NonceError {
    /// Returns true if retrying the whole request may succeed.
    ///
    /// A nonce that failed verification is gone for good; only
    /// infrastructure failures are worth retrying (with a fresh nonce).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::EntropyUnavailable | Self::StoreUnavailable(_))
    }
}

impl From<EntropyUnavailable> for NonceError {
    fn from(_: EntropyUnavailable) -> Self {
        Self::EntropyUnavailable
    }
}

impl From<StoreError> for NonceError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

/// Errors from session credential operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Could not draw random bytes for a credential id.
    #[error("entropy unavailable for credential generation")]
    EntropyUnavailable,

    /// Token is not base64, has fewer than five `:`-separated fields, or a
    /// claim field is invalid.
    #[error("malformed session token")]
    MalformedToken,

    /// Signature does not match the claims, or the claims do not match the
    /// stored record.
    #[error("bad session token signature")]
    BadSignature,

    /// No live record for this credential (expired, evicted, or never
    /// issued).
    #[error("session credential not found or expired")]
    NotFoundOrExpired,

    /// Credential was explicitly revoked.
    #[error("session credential revoked")]
    Revoked,

    /// Backing store failed or timed out.
    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),

    /// Stored record could not be decoded.
    #[error("corrupt credential record: {reason}")]
    Corrupt {
        /// What failed to decode
        reason: String,
    },
}

impl SessionError {
    /// Returns true if retrying the whole request may succeed.
    ///
    /// Token-shaped failures (malformed, bad signature, revoked, not found)
    /// are never transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::EntropyUnavailable | Self::StoreUnavailable(_))
    }
}

impl From<EntropyUnavailable> for SessionError {
    fn from(_: EntropyUnavailable) -> Self {
        Self::EntropyUnavailable
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}
