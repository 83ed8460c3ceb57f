//! Prefixed integer representation (RFC 7541 Section 5.1).

use bytes::{BufMut, BytesMut};

use crate::error::HpackError;

/// Largest integer accepted from the wire. Anything larger cannot be a valid
/// index, length or table size.
const MAX_DECODED: u64 = u32::MAX as u64;

/// Append `value` using the low `prefix_bits` of a first byte whose high bits
/// are `first_byte`.
pub fn encode(value: usize, prefix_bits: u8, first_byte: u8, dst: &mut BytesMut) {
    debug_assert!((1..=8).contains(&prefix_bits));
    let max_prefix = ((1u16 << prefix_bits) - 1) as usize;

    if value < max_prefix {
        dst.put_u8(first_byte | value as u8);
        return;
    }

    dst.put_u8(first_byte | max_prefix as u8);
    let mut remaining = value - max_prefix;
    while remaining >= 128 {
        dst.put_u8(0x80 | (remaining & 0x7f) as u8);
        remaining >>= 7;
    }
    dst.put_u8(remaining as u8);
}

/// Decode an integer with an N-bit prefix.
///
/// Returns `(value, bytes_consumed)`.
pub fn decode(src: &[u8], prefix_bits: u8) -> Result<(usize, usize), HpackError> {
    debug_assert!((1..=8).contains(&prefix_bits));
    let first = *src.first().ok_or(HpackError::Truncated)?;
    let max_prefix = ((1u16 << prefix_bits) - 1) as u8;

    let mut value = (first & max_prefix) as u64;
    if value < max_prefix as u64 {
        return Ok((value as usize, 1));
    }

    let mut shift = 0u32;
    let mut pos = 1;
    loop {
        let byte = *src.get(pos).ok_or(HpackError::Truncated)?;
        pos += 1;
        value += ((byte & 0x7f) as u64) << shift;
        if value > MAX_DECODED {
            return Err(HpackError::IntegerOverflow);
        }
        if byte & 0x80 == 0 {
            return Ok((value as usize, pos));
        }
        shift += 7;
        if shift > 28 {
            return Err(HpackError::IntegerOverflow);
        }
    }
}
