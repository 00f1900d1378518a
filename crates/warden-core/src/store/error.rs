use thiserror::Error;

/// Errors from key-value store backends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend unreachable, timed out, or otherwise unable to serve the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Backend reported an error while executing the call.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded.
    #[error("store serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns true if the same call may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
