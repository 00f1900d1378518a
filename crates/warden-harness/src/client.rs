//! Simulated caller: seals requests to the server and opens sealed replies.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde_json::{Value, json};
use warden_crypto::{
    ENVELOPE_ENTROPY_LEN, EnvelopeEntropy, EnvelopeError, RsaPublicKey, public_key_to_hex_pem,
};

use crate::keys::client_key;

/// A caller holding the server public key and its own reply key.
pub struct SimClient {
    server_key: RsaPublicKey,
    rng: ChaCha20Rng,
}

impl SimClient {
    /// Client sealing to `server_key`, randomness seeded by `seed`.
    pub fn new(server_key: RsaPublicKey, seed: u64) -> Self {
        Self { server_key, rng: ChaCha20Rng::seed_from_u64(seed) }
    }

    /// Seal `payload` into a request body `{"ciphertext": "<hex>"}`.
    pub fn seal_request(&mut self, payload: &Value) -> Result<String, EnvelopeError> {
        let mut bytes = [0u8; ENVELOPE_ENTROPY_LEN];
        self.rng.fill_bytes(&mut bytes);
        let entropy = EnvelopeEntropy::from_bytes(&bytes);

        let ciphertext =
            warden_crypto::seal(payload.to_string().as_bytes(), &self.server_key, &entropy)?;
        Ok(json!({ "ciphertext": ciphertext }).to_string())
    }

    /// Hex-encoded PEM of the client reply key, for the `public_key` field.
    #[allow(clippy::expect_used, reason = "harness key always encodes")]
    pub fn reply_key_hex(&self) -> String {
        public_key_to_hex_pem(&client_key().to_public_key()).expect("reply key encodes")
    }

    /// Open a sealed response body with the client reply key.
    pub fn open_response(&self, body: &str) -> Result<Value, EnvelopeError> {
        let malformed = |reason: String| EnvelopeError::MalformedEnvelope { reason };

        let envelope: Value = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
        let ciphertext = envelope
            .get("ciphertext")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("no ciphertext field".to_string()))?;

        let plaintext = warden_crypto::open(ciphertext, client_key())?;
        serde_json::from_slice(&plaintext).map_err(|e| malformed(e.to_string()))
    }
}
