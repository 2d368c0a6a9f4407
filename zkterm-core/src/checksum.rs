//! Terminal packet checksum
//!
//! The checksum covers everything after the 8-byte stream prefix: command
//! code, checksum field, session id, reply counter and payload.
//!
//! 1. Pad an odd-length span with one zero byte
//! 2. Sum the span as unsigned 16-bit little-endian words
//! 3. Fold the carry (high 16 bits) back into the low 16 bits
//! 4. Take ones-complement: ~sum
//!
//! Because the checksum field sits inside the span it protects, a correctly
//! stamped packet checksums to zero.

use tracing::trace;

/// Calculate the 16-bit ones-complement checksum of `bytes`
///
/// # Algorithm
///
/// ```text
/// 1. Append 0x00 if len is odd
/// 2. Sum all 16-bit words (little-endian) into a u32
/// 3. sum = (sum & 0xFFFF) + (sum >> 16), until sum <= 0xFFFF
/// 4. Return !sum as u16
/// ```
///
/// # Examples
///
/// ```
/// use zkterm_core::checksum;
///
/// let checksum = checksum::checksum16(&[0xE8, 0x03, 0x00, 0x00]);
/// assert_eq!(checksum, !0x03E8u16);
/// ```
pub fn checksum16(bytes: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    for chunk in bytes.chunks(2) {
        let word = match *chunk {
            [lo, hi] => u16::from_le_bytes([lo, hi]),
            // Odd trailing byte, padded with zero
            [lo] => u16::from_le_bytes([lo, 0]),
            _ => 0,
        };
        sum += u32::from(word);
    }

    // A single fold can still carry for large spans
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    let checksum = !(sum as u16);

    trace!(
        len = bytes.len(),
        checksum = format!("0x{:04X}", checksum),
        "Calculated checksum"
    );

    checksum
}

/// Check a span that already contains its checksum field
///
/// Returns `true` iff the span checksums to zero.
pub fn is_valid_payload(bytes: &[u8]) -> bool {
    checksum16(bytes) == 0
}
