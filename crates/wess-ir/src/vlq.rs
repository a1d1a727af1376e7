//! Variable-length quantities used for delta times in track streams.
//!
//! Each byte carries 7 bits of payload, most significant group first.
//! A set top bit means another byte follows. A 32-bit value never needs
//! more than 5 bytes.

use alloc::vec::Vec;
use arrayvec::ArrayVec;

/// Longest encoding of a `u32`.
pub const MAX_VLQ_LEN: usize = 5;

/// An encoded quantity, stored inline.
pub type Vlq = ArrayVec<u8, MAX_VLQ_LEN>;

/// Decode the quantity starting at `offset`.
///
/// Returns the value and the number of bytes consumed, or `None` if the
/// stream ends before the final byte.
pub fn decode(bytes: &[u8], offset: usize) -> Option<(u32, usize)> {
    let first = *bytes.get(offset)?;
    let mut value = first as u32;
    let mut pos = offset + 1;

    if first & 0x80 != 0 {
        value &= 0x7F;
        loop {
            let byte = *bytes.get(pos)?;
            pos += 1;
            value = (value << 7) + (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                break;
            }
        }
    }

    Some((value, pos - offset))
}

/// Encode `value` into its shortest representation.
pub fn encode(value: u32) -> Vlq {
    // Gather 7-bit groups least significant first, then emit reversed.
    let mut groups = [0u8; MAX_VLQ_LEN];
    let mut count = 0;
    let mut rest = value;
    loop {
        groups[count] = (rest & 0x7F) as u8;
        count += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }

    let mut out = Vlq::new();
    for i in (0..count).rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        out.push(groups[i] | continuation);
    }
    out
}

/// Number of bytes `encode(value)` produces.
pub const fn encoded_len(value: u32) -> usize {
    let mut len = 1;
    let mut rest = value >> 7;
    while rest != 0 {
        len += 1;
        rest >>= 7;
    }
    len
}

/// Append the encoding of `value` to `out`.
pub fn write(value: u32, out: &mut Vec<u8>) {
    out.extend_from_slice(&encode(value));
}
