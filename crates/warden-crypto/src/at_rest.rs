//! Deterministic AES-256-CBC codec for equality-searchable fields.
//!
//! Key is `SHA-256(passphrase)` and the IV is fixed, so equal plaintexts map
//! to equal ciphertexts. Storage callers rely on this to look rows up by an
//! encrypted column (e.g. "find account by encrypted phone").
//!
//! # Security
//!
//! This leaks plaintext equality to anyone who can read the column. The
//! behavior is kept for compatibility with existing rows. A hardened design
//! stores a keyed blind index (HMAC of the value) for lookups and encrypts the
//! recoverable value under a random IV.

use aes::{
    Aes256,
    cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::NoPadding},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::{
    error::AtRestError,
    padding::{self, BLOCK_SIZE},
};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Size of the fixed IV.
pub const AT_REST_IV_SIZE: usize = 16;

/// Deterministic field codec.
///
/// Cheap to clone; holds only the derived key and IV. Key bytes are zeroized
/// on drop.
#[derive(Clone)]
pub struct AtRestCodec {
    key: [u8; 32],
    iv: [u8; AT_REST_IV_SIZE],
}

impl AtRestCodec {
    /// Derive the codec from a passphrase and IV seed.
    ///
    /// IV seeds shorter than 16 bytes are zero-padded; longer ones are
    /// truncated.
    pub fn new(passphrase: &[u8], iv_seed: &[u8]) -> Self {
        let mut key = [0u8; 32];
        key.copy_from_slice(&Sha256::digest(passphrase));

        let mut iv = [0u8; AT_REST_IV_SIZE];
        let take = iv_seed.len().min(AT_REST_IV_SIZE);
        iv[..take].copy_from_slice(&iv_seed[..take]);

        Self { key, iv }
    }

    /// Encrypt a field, returning standard base64.
    ///
    /// Deterministic: the same input always yields the same output.
    pub fn encrypt(&self, plaintext: impl AsRef<[u8]>) -> String {
        let mut buf = padding::pad(plaintext.as_ref());
        let len = buf.len();

        let encryptor = Aes256CbcEnc::new(&self.key.into(), &self.iv.into());
        #[allow(clippy::expect_used)]
        encryptor
            .encrypt_padded_mut::<NoPadding>(&mut buf, len)
            .expect("invariant: pre-padded buffer is always block aligned");

        BASE64.encode(buf)
    }

    /// Decrypt a base64 field to raw bytes.
    ///
    /// # Errors
    ///
    /// - `Decode`: not base64, empty, or not a whole number of blocks
    /// - `Padding`: decrypted block has invalid padding
    pub fn decrypt(&self, ciphertext: &str) -> Result<Vec<u8>, AtRestError> {
        let mut buf = BASE64
            .decode(ciphertext.trim())
            .map_err(|e| AtRestError::Decode { reason: format!("not base64: {e}") })?;

        if buf.is_empty() || buf.len() % BLOCK_SIZE != 0 {
            return Err(AtRestError::Decode {
                reason: format!("{} bytes is not whole blocks", buf.len()),
            });
        }

        let decryptor = Aes256CbcDec::new(&self.key.into(), &self.iv.into());
        decryptor.decrypt_padded_mut::<NoPadding>(&mut buf).map_err(|_| AtRestError::Decode {
            reason: "ciphertext is not whole blocks".to_string(),
        })?;

        let unpadded_len = padding::unpad(&buf)?.len();
        buf.truncate(unpadded_len);

        Ok(buf)
    }

    /// Decrypt a base64 field that holds UTF-8 text.
    pub fn decrypt_utf8(&self, ciphertext: &str) -> Result<String, AtRestError> {
        let bytes = self.decrypt(ciphertext)?;
        String::from_utf8(bytes).map_err(|e| AtRestError::Decode { reason: e.to_string() })
    }
}

impl Drop for AtRestCodec {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for AtRestCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtRestCodec").finish_non_exhaustive()
    }
}
