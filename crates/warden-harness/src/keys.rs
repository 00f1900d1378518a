//! Fixed RSA identities shared by every test in a process.
//!
//! RSA key generation dominates test time, so each identity is generated
//! once from a constant seed and reused.

use std::sync::{Arc, OnceLock};

use warden_crypto::{
    AtRestCodec, KeyMaterial, MIN_RSA_BITS, RsaPrivateKey, generate_key_pair_pem,
    parse_private_key_pem,
};

/// At-rest passphrase used by harness key material.
pub const TEST_AT_REST_PASSPHRASE: &[u8] = b"harness at-rest passphrase";

/// At-rest IV seed used by harness key material.
pub const TEST_AT_REST_IV: &[u8] = b"harness-iv-seed";

const SERVER_SEED: [u8; 32] = [0x5E; 32];
const CLIENT_SEED: [u8; 32] = [0xC1; 32];

static SERVER_KEYS: OnceLock<Arc<KeyMaterial>> = OnceLock::new();
static CLIENT_KEY: OnceLock<RsaPrivateKey> = OnceLock::new();

#[allow(clippy::expect_used, reason = "fixed seeds always produce a usable key")]
fn generate(seed: [u8; 32]) -> RsaPrivateKey {
    let pair = generate_key_pair_pem(seed, MIN_RSA_BITS).expect("harness key generation");
    parse_private_key_pem(&pair.private_pem).expect("harness key parses")
}

/// Server key material.
#[allow(clippy::expect_used, reason = "generated keys meet the size minimum")]
pub fn server_keys() -> Arc<KeyMaterial> {
    SERVER_KEYS
        .get_or_init(|| {
            let codec = AtRestCodec::new(TEST_AT_REST_PASSPHRASE, TEST_AT_REST_IV);
            Arc::new(KeyMaterial::new(generate(SERVER_SEED), codec).expect("harness key material"))
        })
        .clone()
}

/// Client private key, for reply-key round trips.
pub fn client_key() -> &'static RsaPrivateKey {
    CLIENT_KEY.get_or_init(|| generate(CLIENT_SEED))
}
