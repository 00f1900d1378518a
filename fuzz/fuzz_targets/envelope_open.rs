//! Fuzz target for envelope decoding
//!
//! # Strategy
//!
//! - Raw: arbitrary strings handed straight to `open`
//! - Framed: a well-formed wrapped-key segment and IV followed by arbitrary
//!   body bytes, so the padding check is reached
//! - Truncated: a genuine envelope cut at an arbitrary point
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Wrong-key or corrupted bodies fail as `KeyUnwrap` or `Padding`, both of
//!   which report `is_invalid_ciphertext`

#![no_main]

use std::sync::OnceLock;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use warden_crypto::{
    generate_key_pair_pem, parse_private_key_pem, EnvelopeEntropy, EnvelopeError, RsaPrivateKey,
    ENVELOPE_ENTROPY_LEN, MIN_RSA_BITS,
};

static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();

fn key() -> &'static RsaPrivateKey {
    KEY.get_or_init(|| {
        let pair = generate_key_pair_pem([0xF0; 32], MIN_RSA_BITS).expect("fuzz key");
        parse_private_key_pem(&pair.private_pem).expect("fuzz key parses")
    })
}

#[derive(Debug, Arbitrary)]
enum Input {
    Raw(String),
    Framed { wrapped: Vec<u8>, body: Vec<u8> },
    Truncated { plaintext: Vec<u8>, cut: usize },
}

fuzz_target!(|input: Input| {
    let key = key();

    match input {
        Input::Raw(text) => {
            let _ = warden_crypto::open(&text, key);
        },
        Input::Framed { mut wrapped, body } => {
            wrapped.resize(key.size() + 16, 0);
            wrapped.extend_from_slice(&body);
            if let Err(err) = warden_crypto::open(&hex_encode(&wrapped), key) {
                assert!(
                    err.is_invalid_ciphertext()
                        || matches!(err, EnvelopeError::MalformedEnvelope { .. })
                );
            }
        },
        Input::Truncated { plaintext, cut } => {
            let entropy = EnvelopeEntropy::from_bytes(&[0x42; ENVELOPE_ENTROPY_LEN]);
            let sealed = warden_crypto::seal(&plaintext, &key.to_public_key(), &entropy)
                .expect("seal under a valid key");

            let cut = cut % (sealed.len() + 1);
            if cut == sealed.len() {
                assert_eq!(warden_crypto::open(&sealed, key).expect("intact envelope"), plaintext);
            } else {
                let _ = warden_crypto::open(&sealed[..cut], key);
            }
        },
    }
});

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
