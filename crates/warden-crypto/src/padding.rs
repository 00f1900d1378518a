//! PKCS#7 padding with constant-time validation.
//!
//! Unpadding inspects every byte of the final block regardless of where the
//! first mismatch is, and folds all checks into a single [`Choice`]. The
//! ciphertext length is public, so only the length-is-block-multiple check
//! may short-circuit.

use subtle::{Choice, ConstantTimeEq, ConstantTimeGreater, ConstantTimeLess};

use crate::error::PaddingError;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Pad `data` to a whole number of blocks.
///
/// Always appends between 1 and [`BLOCK_SIZE`] bytes, so already-aligned
/// input gains a full block of padding.
pub fn pad(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_SIZE - data.len() % BLOCK_SIZE;

    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad_len, pad_len as u8);

    debug_assert_eq!(padded.len() % BLOCK_SIZE, 0);
    padded
}

/// Strip PKCS#7 padding, returning the unpadded prefix.
///
/// # Errors
///
/// `PaddingError` if the input is empty, not block aligned, the pad byte is
/// 0 or greater than [`BLOCK_SIZE`], or any padding byte differs from the pad
/// byte.
pub fn unpad(data: &[u8]) -> Result<&[u8], PaddingError> {
    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(PaddingError);
    }

    let last_block = &data[data.len() - BLOCK_SIZE..];
    let pad_byte = last_block[BLOCK_SIZE - 1];

    let mut valid: Choice = !pad_byte.ct_eq(&0) & !pad_byte.ct_gt(&(BLOCK_SIZE as u8));

    // Byte at distance `i` from the end is padding iff i < pad_byte
    for (i, byte) in last_block.iter().rev().enumerate() {
        let in_padding = (i as u8).ct_lt(&pad_byte);
        valid &= !in_padding | byte.ct_eq(&pad_byte);
    }

    if bool::from(valid) {
        Ok(&data[..data.len() - pad_byte as usize])
    } else {
        Err(PaddingError)
    }
}
