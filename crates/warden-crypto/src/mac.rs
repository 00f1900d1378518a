//! HMAC-SHA256 signatures over session credential claims.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC-SHA256 tag in bytes.
pub const TAG_SIZE: usize = 32;

/// Secret key for credential signatures. Zeroized on drop.
#[derive(Clone)]
pub struct SigningKey {
    secret: Zeroizing<Vec<u8>>,
}

impl SigningKey {
    /// Wrap raw secret bytes.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: Zeroizing::new(secret.into()) }
    }

    /// Sign `message`, returning the lowercase hex tag.
    pub fn sign_hex(&self, message: &[u8]) -> String {
        hex::encode(self.mac(message).finalize().into_bytes())
    }

    /// Check a hex tag against `message` in constant time.
    ///
    /// Tags that are not valid hex or have the wrong length fail the same way
    /// as a wrong tag.
    pub fn verify_hex(&self, message: &[u8], tag_hex: impl AsRef<[u8]>) -> bool {
        let Ok(tag) = hex::decode(tag_hex) else {
            return false;
        };
        self.mac(message).verify_slice(&tag).is_ok()
    }

    #[allow(clippy::expect_used)]
    fn mac(&self, message: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("invariant: HMAC-SHA256 accepts any key size");
        mac.update(message);
        mac
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}
