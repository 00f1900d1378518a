//! Error types for Warden cryptographic primitives.
//!
//! Variants are deliberately coarse where finer detail would hand an attacker
//! an oracle: padding failures carry no information about which byte was
//! wrong, and key-unwrap failures carry no RSA detail.

use thiserror::Error;

/// PKCS#7 padding was invalid.
///
/// Carries no detail. Wrong pad value, zero pad length, oversized pad length
/// and mismatched pad bytes are indistinguishable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid padding")]
pub struct PaddingError;

/// Errors from the hybrid RSA-OAEP / AES-CBC envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Sealing failed (RSA wrap or cipher setup). Never retried with a weaker
    /// scheme.
    #[error("envelope encryption failed: {reason}")]
    Encryption {
        /// What failed
        reason: String,
    },

    /// Input is not a structurally valid envelope.
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope {
        /// What was wrong with the input
        reason: String,
    },

    /// RSA-OAEP unwrap of the content key failed.
    #[error("content key unwrap failed")]
    KeyUnwrap,

    /// Body decrypted to invalid padding (wrong key or corrupted ciphertext).
    #[error("invalid padding")]
    Padding,
}

impl EnvelopeError {
    /// Whether this error means "ciphertext did not decrypt under our key".
    ///
    /// Callers must report these identically so the two checks can't be told
    /// apart from outside.
    pub fn is_invalid_ciphertext(&self) -> bool {
        matches!(self, Self::KeyUnwrap | Self::Padding)
    }
}

impl From<PaddingError> for EnvelopeError {
    fn from(_: PaddingError) -> Self {
        Self::Padding
    }
}

/// Errors from the deterministic at-rest codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AtRestError {
    /// Input is not valid base64, not a whole number of blocks, or not UTF-8
    /// when text was requested.
    #[error("undecodable at-rest ciphertext: {reason}")]
    Decode {
        /// What was wrong with the input
        reason: String,
    },

    /// Decrypted block had invalid padding.
    #[error("invalid padding")]
    Padding,
}

impl From<PaddingError> for AtRestError {
    fn from(_: PaddingError) -> Self {
        Self::Padding
    }
}

/// Errors loading or encoding key material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterialError {
    /// PEM (or its hex wrapper) could not be parsed as an RSA key.
    #[error("invalid RSA key: {reason}")]
    Pem {
        /// Parser message
        reason: String,
    },

    /// RSA modulus is below the minimum accepted size.
    #[error("RSA key too small: {bits} bits, need at least {min_bits}")]
    KeyTooSmall {
        /// Modulus size of the offered key
        bits: usize,
        /// Minimum accepted modulus size
        min_bits: usize,
    },

    /// Key could not be serialized.
    #[error("key encoding failed: {reason}")]
    Encoding {
        /// Encoder message
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrap_and_padding_are_invalid_ciphertext() {
        assert!(EnvelopeError::KeyUnwrap.is_invalid_ciphertext());
        assert!(EnvelopeError::Padding.is_invalid_ciphertext());
    }

    #[test]
    fn structural_errors_are_not_invalid_ciphertext() {
        let malformed = EnvelopeError::MalformedEnvelope { reason: "short".to_string() };
        assert!(!malformed.is_invalid_ciphertext());

        let encryption = EnvelopeError::Encryption { reason: "rsa".to_string() };
        assert!(!encryption.is_invalid_ciphertext());
    }

    #[test]
    fn unwrap_and_padding_display_carries_no_detail() {
        assert_eq!(EnvelopeError::KeyUnwrap.to_string(), "content key unwrap failed");
        assert_eq!(EnvelopeError::Padding.to_string(), "invalid padding");
        assert_eq!(PaddingError.to_string(), "invalid padding");
    }
}
