//! Fuzz target for session token parsing
//!
//! # Invariants
//!
//! - NEVER panic on malformed tokens
//! - Parse errors are always `MalformedToken`
//! - A parsed token never verifies under a key it was not signed with
//! - Claims signed and re-parsed round-trip exactly

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use warden_core::{
    session::{CredentialClaims, ParsedToken},
    AccountId, SessionError,
};
use uuid::Uuid;
use warden_crypto::SigningKey;

#[derive(Debug, Arbitrary)]
enum Input {
    Raw(String),
    Claims { account: String, id: [u8; 16], issued_at: u64, ttl: u32 },
}

fuzz_target!(|input: Input| {
    let key = SigningKey::new(b"fuzz-secret".to_vec());

    match input {
        Input::Raw(token) => match ParsedToken::parse(&token) {
            Ok(parsed) => assert!(!parsed.verify_signature(&key)),
            Err(err) => assert_eq!(err, SessionError::MalformedToken),
        },
        Input::Claims { account, id, issued_at, ttl } => {
            let Ok(account_id) = AccountId::new(account) else { return };
            let claims = CredentialClaims {
                account_id,
                credential_id: Uuid::from_bytes(id),
                issued_at,
                nominal_expires_at: issued_at.saturating_add(u64::from(ttl)),
            };

            let parsed = ParsedToken::parse(&claims.sign(&key)).expect("signed token parses");
            assert_eq!(parsed.claims, claims);
            assert!(parsed.verify_signature(&key));
        },
    }
});
