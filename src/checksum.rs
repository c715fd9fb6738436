//! Telegram checksum.
//!
//! The checksum is the plain sum of every byte in front of it, truncated to 16 bits and sent big-endian.

/// Sum all bytes modulo 2^16.
pub fn compute(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, &byte| sum.wrapping_add(byte as u16))
}

/// Check `bytes` against a checksum received from the device.
pub fn verify(bytes: &[u8], expected: u16) -> bool {
    compute(bytes) == expected
}
