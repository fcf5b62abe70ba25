//! Minimal, tolerant ABI word-reading helpers for the non-indexed portion of
//! a log's `data` field.
//!
//! These events only ever carry `uint256`, `string` and `bytes` in their
//! non-indexed tail, so a full ABI-decoding crate is unneeded machinery; a
//! handful of word-offset readers cover it. Every reader here is infallible:
//! out-of-range or malformed offsets return the zero/empty value rather than
//! an error, per the decoder's "never drop the event" contract.

use alloy_primitives::{Bytes, U256};

const WORD: usize = 32;

/// Reads the 32-byte word at index `idx` (0-based) of the ABI tail,
/// returning zero if `data` is too short.
pub fn u256_at(data: &[u8], idx: usize) -> U256 {
    let start = idx * WORD;
    match data.get(start..start + WORD) {
        Some(word) => U256::from_be_slice(word),
        None => U256::ZERO,
    }
}

/// Reads a `uint256` tail word as a `u64`, saturating on overflow.
pub fn u64_at(data: &[u8], idx: usize) -> u64 {
    let v = u256_at(data, idx);
    if v > U256::from(u64::MAX) {
        u64::MAX
    } else {
        v.to::<u64>()
    }
}

/// Reads a dynamic `bytes` value whose offset is stored at tail word `idx`,
/// the offset being relative to the start of the tail. Returns empty bytes
/// if the offset, length, or payload run past the end of `data`.
pub fn dynamic_bytes_at(data: &[u8], idx: usize) -> Bytes {
    let offset = u256_at(data, idx).to::<u64>() as usize;
    let len = match data.get(offset..offset + WORD) {
        Some(word) => U256::from_be_slice(word).to::<u64>() as usize,
        None => return Bytes::new(),
    };
    match data.get(offset + WORD..offset + WORD + len) {
        Some(bytes) => Bytes::copy_from_slice(bytes),
        None => Bytes::new(),
    }
}

/// Reads a dynamic `string` value the same way as [`dynamic_bytes_at`],
/// lossily converting non-UTF-8 payloads rather than failing.
pub fn dynamic_string_at(data: &[u8], idx: usize) -> String {
    String::from_utf8_lossy(&dynamic_bytes_at(data, idx)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn word_from_u64(v: u64) -> [u8; 32] {
        U256::from(v).to_be_bytes::<32>()
    }

    #[test]
    fn reads_static_words() {
        let mut data = Vec::new();
        data.extend_from_slice(&word_from_u64(42));
        assert_eq!(u64_at(&data, 0), 42);
        assert_eq!(u64_at(&data, 1), 0); // out of range defaults to zero
    }

    #[test]
    fn reads_dynamic_bytes() {
        // tail: [offset=32][len=3]['a','b','c', padding...]
        let mut data = Vec::new();
        data.extend_from_slice(&word_from_u64(32));
        data.extend_from_slice(&word_from_u64(3));
        let mut payload = b"abc".to_vec();
        payload.resize(32, 0);
        data.extend_from_slice(&payload);
        assert_eq!(&dynamic_bytes_at(&data, 0)[..], b"abc");
    }

    #[test]
    fn truncated_dynamic_value_defaults_to_empty() {
        let data = word_from_u64(1024).to_vec(); // offset points past the buffer
        assert_eq!(dynamic_bytes_at(&data, 0).len(), 0);
        assert_eq!(dynamic_string_at(&data, 0), "");
    }
}
