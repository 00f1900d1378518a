//! Fuzz target for PKCS#7 unpadding
//!
//! # Invariants
//!
//! - NEVER panic, whatever the length
//! - Accepted input loses between 1 and 16 trailing bytes, all equal to the
//!   removed count
//! - `unpad(pad(x)) == x`

#![no_main]

use libfuzzer_sys::fuzz_target;
use warden_crypto::padding::{pad, unpad, BLOCK_SIZE};

fuzz_target!(|data: &[u8]| {
    if let Ok(stripped) = unpad(data) {
        let removed = data.len() - stripped.len();
        assert!((1..=BLOCK_SIZE).contains(&removed));
        assert!(data[stripped.len()..].iter().all(|&b| usize::from(b) == removed));
    }

    assert_eq!(unpad(&pad(data)), Ok(data));
});
