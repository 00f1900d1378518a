//! Server key material.
//!
//! Loaded once at start-up and handed to components by reference. Nothing in
//! here is mutable after construction.

use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey},
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding},
    traits::PublicKeyParts,
};
use zeroize::Zeroizing;

use crate::{at_rest::AtRestCodec, error::KeyMaterialError};

/// Smallest RSA modulus accepted for the server identity.
pub const MIN_RSA_BITS: usize = 2048;

/// The server's RSA identity plus the at-rest field codec.
pub struct KeyMaterial {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    at_rest: AtRestCodec,
}

impl KeyMaterial {
    /// Build key material from an already-parsed private key.
    ///
    /// # Errors
    ///
    /// `KeyTooSmall` if the modulus is below [`MIN_RSA_BITS`].
    pub fn new(private_key: RsaPrivateKey, at_rest: AtRestCodec) -> Result<Self, KeyMaterialError> {
        let public_key = RsaPublicKey::from(&private_key);

        let bits = modulus_bits(&public_key);
        if bits < MIN_RSA_BITS {
            return Err(KeyMaterialError::KeyTooSmall { bits, min_bits: MIN_RSA_BITS });
        }

        Ok(Self { private_key, public_key, at_rest })
    }

    /// Parse a PEM private key (PKCS#8 or PKCS#1) and derive the codec.
    pub fn from_pem(
        private_pem: &str,
        at_rest_passphrase: &[u8],
        at_rest_iv_seed: &[u8],
    ) -> Result<Self, KeyMaterialError> {
        let private_key = parse_private_key_pem(private_pem)?;
        Self::new(private_key, AtRestCodec::new(at_rest_passphrase, at_rest_iv_seed))
    }

    /// Server private key, for opening envelopes.
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Server public key, for callers sealing requests.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Deterministic at-rest codec.
    pub fn at_rest(&self) -> &AtRestCodec {
        &self.at_rest
    }

    /// Public key as hex-encoded SPKI PEM, the form handed to callers.
    pub fn public_key_hex(&self) -> Result<String, KeyMaterialError> {
        public_key_to_hex_pem(&self.public_key)
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("modulus_bits", &modulus_bits(&self.public_key))
            .finish_non_exhaustive()
    }
}

/// Size of the seed for [`generate_key_pair_pem`].
pub const KEYGEN_SEED_SIZE: usize = 32;

/// A freshly generated identity in PEM form.
pub struct KeyPairPem {
    /// PKCS#8 private key. Zeroized on drop.
    pub private_pem: Zeroizing<String>,
    /// SPKI public key.
    pub public_pem: String,
}

/// Generate an RSA identity of `bits` from a caller-provided seed.
///
/// The seed must come from a cryptographically secure source; the same seed
/// always yields the same key.
pub fn generate_key_pair_pem(
    seed: [u8; KEYGEN_SEED_SIZE],
    bits: usize,
) -> Result<KeyPairPem, KeyMaterialError> {
    if bits < MIN_RSA_BITS {
        return Err(KeyMaterialError::KeyTooSmall { bits, min_bits: MIN_RSA_BITS });
    }

    let mut rng = ChaCha20Rng::from_seed(seed);
    let private_key = RsaPrivateKey::new(&mut rng, bits)
        .map_err(|e| KeyMaterialError::Encoding { reason: format!("key generation: {e}") })?;

    let private_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| KeyMaterialError::Encoding { reason: e.to_string() })?;
    let public_pem = RsaPublicKey::from(&private_key)
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyMaterialError::Encoding { reason: e.to_string() })?;

    Ok(KeyPairPem { private_pem, public_pem })
}

/// Parse a PEM private key, trying PKCS#8 then PKCS#1.
pub fn parse_private_key_pem(pem: &str) -> Result<RsaPrivateKey, KeyMaterialError> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| KeyMaterialError::Pem { reason: e.to_string() })
}

/// Parse a PEM public key, trying SPKI then PKCS#1.
pub fn parse_public_key_pem(pem: &str) -> Result<RsaPublicKey, KeyMaterialError> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| KeyMaterialError::Pem { reason: e.to_string() })
}

/// Parse a caller-supplied public key sent as hex-encoded PEM.
pub fn parse_public_key_hex(hex_pem: &str) -> Result<RsaPublicKey, KeyMaterialError> {
    let pem_bytes = hex::decode(hex_pem.trim())
        .map_err(|e| KeyMaterialError::Pem { reason: format!("not hex: {e}") })?;
    let pem = String::from_utf8(pem_bytes)
        .map_err(|e| KeyMaterialError::Pem { reason: format!("not UTF-8: {e}") })?;

    parse_public_key_pem(&pem)
}

/// Modulus size of a public key in bits.
pub fn modulus_bits(key: &RsaPublicKey) -> usize {
    key.size() * 8
}

/// Encode a public key as hex-encoded SPKI PEM.
pub fn public_key_to_hex_pem(key: &RsaPublicKey) -> Result<String, KeyMaterialError> {
    let pem = key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyMaterialError::Encoding { reason: e.to_string() })?;
    Ok(hex::encode(pem.as_bytes()))
}
