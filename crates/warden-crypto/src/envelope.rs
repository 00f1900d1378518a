//! Hybrid RSA-OAEP / AES-128-CBC message envelope.
//!
//! All functions are pure - random bytes must be provided by the caller via
//! [`EnvelopeEntropy`]. This keeps the crate free of an RNG dependency at
//! runtime and lets tests pin every byte of the output.
//!
//! Wire layout (hex encoded):
//!
//! ```text
//! +----------------------------+----------+---------------------------+
//! | RSA-OAEP-SHA256(aes key)   | IV (16)  | AES-128-CBC(PKCS7(plain)) |
//! | modulus-size bytes         |          | n * 16 bytes              |
//! +----------------------------+----------+---------------------------+
//! ```

use aes::{
    Aes128,
    cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::NoPadding},
};
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey, traits::PublicKeyParts};
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::{
    error::EnvelopeError,
    padding::{self, BLOCK_SIZE},
};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Size of the per-message AES content key (128 bits).
pub const CONTENT_KEY_SIZE: usize = 16;

/// Size of the CBC initialization vector.
pub const IV_SIZE: usize = 16;

/// Size of the seed for the OAEP padding RNG.
pub const WRAP_SEED_SIZE: usize = 32;

/// Total random bytes consumed by one [`seal`] call.
pub const ENVELOPE_ENTROPY_LEN: usize = CONTENT_KEY_SIZE + IV_SIZE + WRAP_SEED_SIZE;

/// Fresh randomness for a single envelope.
///
/// Must never be reused across messages. Zeroized on drop.
pub struct EnvelopeEntropy {
    content_key: [u8; CONTENT_KEY_SIZE],
    iv: [u8; IV_SIZE],
    wrap_seed: [u8; WRAP_SEED_SIZE],
}

impl EnvelopeEntropy {
    /// Split a buffer of cryptographically secure random bytes.
    pub fn from_bytes(bytes: &[u8; ENVELOPE_ENTROPY_LEN]) -> Self {
        let mut content_key = [0u8; CONTENT_KEY_SIZE];
        let mut iv = [0u8; IV_SIZE];
        let mut wrap_seed = [0u8; WRAP_SEED_SIZE];

        content_key.copy_from_slice(&bytes[..CONTENT_KEY_SIZE]);
        iv.copy_from_slice(&bytes[CONTENT_KEY_SIZE..CONTENT_KEY_SIZE + IV_SIZE]);
        wrap_seed.copy_from_slice(&bytes[CONTENT_KEY_SIZE + IV_SIZE..]);

        Self { content_key, iv, wrap_seed }
    }
}

impl Drop for EnvelopeEntropy {
    fn drop(&mut self) {
        self.content_key.zeroize();
        self.iv.zeroize();
        self.wrap_seed.zeroize();
    }
}

/// Seal `plaintext` for the holder of `recipient`'s private key.
///
/// Returns the hex-encoded envelope.
///
/// # Security
///
/// - Content key and IV come from `entropy`, which must be fresh per call
/// - OAEP randomness is derived from a separate seed in `entropy`
/// - No fallback: any failure aborts instead of sending weaker ciphertext
pub fn seal(
    plaintext: &[u8],
    recipient: &RsaPublicKey,
    entropy: &EnvelopeEntropy,
) -> Result<String, EnvelopeError> {
    let mut wrap_rng = ChaCha20Rng::from_seed(entropy.wrap_seed);
    let wrapped_key = recipient
        .encrypt(&mut wrap_rng, Oaep::new::<Sha256>(), &entropy.content_key)
        .map_err(|e| EnvelopeError::Encryption { reason: format!("key wrap: {e}") })?;

    debug_assert_eq!(wrapped_key.len(), recipient.size());

    let encryptor = Aes128CbcEnc::new_from_slices(&entropy.content_key, &entropy.iv)
        .map_err(|e| EnvelopeError::Encryption { reason: format!("cipher setup: {e}") })?;

    let mut body = padding::pad(plaintext);
    let body_len = body.len();
    encryptor
        .encrypt_padded_mut::<NoPadding>(&mut body, body_len)
        .map_err(|_| EnvelopeError::Encryption { reason: "block encryption".to_string() })?;

    let mut envelope = Vec::with_capacity(wrapped_key.len() + IV_SIZE + body.len());
    envelope.extend_from_slice(&wrapped_key);
    envelope.extend_from_slice(&entropy.iv);
    envelope.extend_from_slice(&body);

    Ok(hex::encode(envelope))
}

/// Open a hex-encoded envelope with the recipient's private key.
///
/// # Errors
///
/// - `MalformedEnvelope`: not hex, shorter than `modulus + 16` bytes, or
///   body is empty / not block aligned
/// - `KeyUnwrap`: OAEP unwrap failed or yielded a key of the wrong size
/// - `Padding`: body decrypted to invalid PKCS7 (wrong key or corruption)
pub fn open(envelope_hex: &str, recipient: &RsaPrivateKey) -> Result<Vec<u8>, EnvelopeError> {
    let raw = hex::decode(envelope_hex.trim())
        .map_err(|e| EnvelopeError::MalformedEnvelope { reason: format!("not hex: {e}") })?;

    let wrapped_len = recipient.size();
    let min_len = wrapped_len + IV_SIZE;
    if raw.len() < min_len {
        return Err(EnvelopeError::MalformedEnvelope {
            reason: format!("{} bytes, need at least {min_len}", raw.len()),
        });
    }

    let (wrapped_key, rest) = raw.split_at(wrapped_len);
    let (iv, body) = rest.split_at(IV_SIZE);

    if body.is_empty() || body.len() % BLOCK_SIZE != 0 {
        return Err(EnvelopeError::MalformedEnvelope {
            reason: format!("body of {} bytes is not whole blocks", body.len()),
        });
    }

    let content_key = Zeroizing::new(
        recipient
            .decrypt(Oaep::new::<Sha256>(), wrapped_key)
            .map_err(|_| EnvelopeError::KeyUnwrap)?,
    );
    if content_key.len() != CONTENT_KEY_SIZE {
        return Err(EnvelopeError::KeyUnwrap);
    }

    let decryptor =
        Aes128CbcDec::new_from_slices(&content_key, iv).map_err(|_| EnvelopeError::KeyUnwrap)?;

    let mut plaintext = body.to_vec();
    decryptor.decrypt_padded_mut::<NoPadding>(&mut plaintext).map_err(|_| {
        EnvelopeError::MalformedEnvelope { reason: "body is not whole blocks".to_string() }
    })?;

    let unpadded_len = padding::unpad(&plaintext)?.len();
    plaintext.truncate(unpadded_len);

    Ok(plaintext)
}
