//! Warden Cryptographic Primitives
//!
//! Cryptographic building blocks for the Warden security boundary. Pure
//! functions with deterministic outputs. Callers provide random bytes for
//! deterministic testing.
//!
//! # Primitives
//!
//! ```text
//! Request payload
//!        │
//!        ▼
//! AES-128-CBC (fresh key + IV) ──► body
//!        │
//!        ▼
//! RSA-OAEP-SHA256 ──► wrapped key
//!        │
//!        ▼
//! hex(wrapped key ‖ IV ‖ body) ──► envelope
//! ```
//!
//! - [`envelope`]: hybrid envelope for request/response payloads
//! - [`at_rest`]: deterministic field codec for equality-indexed columns
//! - [`mac`]: HMAC-SHA256 credential signatures
//! - [`keys`]: RSA identity loading and PEM helpers
//! - [`padding`]: PKCS#7 with constant-time validation
//!
//! # Security
//!
//! Confidentiality:
//! - Content keys and IVs are never reused across envelopes
//! - Key bytes are zeroized when dropped
//!
//! Oracle resistance:
//! - Padding is validated in constant time over the whole final block
//! - Key-unwrap and padding failures collapse to one caller-facing class
//!   ([`EnvelopeError::is_invalid_ciphertext`])
//! - Credential tags are compared in constant time
//!
//! Known weakness:
//! - [`AtRestCodec`] is deterministic by construction, so equal plaintexts are
//!   observable as equal ciphertexts

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod at_rest;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod mac;
pub mod padding;

pub use at_rest::AtRestCodec;
pub use envelope::{ENVELOPE_ENTROPY_LEN, EnvelopeEntropy, open, seal};
pub use error::{AtRestError, EnvelopeError, KeyMaterialError, PaddingError};
pub use keys::{
    KEYGEN_SEED_SIZE, KeyMaterial, KeyPairPem, MIN_RSA_BITS, generate_key_pair_pem, modulus_bits,
    parse_private_key_pem, parse_public_key_hex, parse_public_key_pem,
    public_key_to_hex_pem,
};
pub use mac::SigningKey;
pub use rsa::{RsaPrivateKey, RsaPublicKey};
