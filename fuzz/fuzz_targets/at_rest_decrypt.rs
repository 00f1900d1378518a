//! Fuzz target for the at-rest field codec
//!
//! # Invariants
//!
//! - NEVER panic on arbitrary ciphertext
//! - Encryption is deterministic and round-trips

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use warden_crypto::AtRestCodec;

#[derive(Debug, Arbitrary)]
struct Input {
    ciphertext: String,
    plaintext: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let codec = AtRestCodec::new(b"fuzz passphrase", b"fuzz iv");

    let _ = codec.decrypt(&input.ciphertext);
    let _ = codec.decrypt_utf8(&input.ciphertext);

    let sealed = codec.encrypt(&input.plaintext);
    assert_eq!(sealed, codec.encrypt(&input.plaintext));
    assert_eq!(codec.decrypt(&sealed).expect("own ciphertext decrypts"), input.plaintext);
});
