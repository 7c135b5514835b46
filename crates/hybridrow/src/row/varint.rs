// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! LEB128 variable-length integers.
//!
//! - `varuint`: unsigned LEB128 (7 data bits per byte, bit 7 = continuation)
//! - `varint`: signed values zigzag-mapped onto `varuint`
//!
//! Used for varint/varuint columns, utf8/binary length prefixes, sparse
//! paths and tuple type-argument counts.
//!
//! ```text
//! 300 = 0b1_0010_1100 -> [0xAC, 0x02]
//! -1  -> zigzag 1      -> [0x01]
//! ```

use crate::error::{RowError, RowResult};

/// Maximum bytes needed to encode a u64.
pub const MAX_VARINT_LEN: usize = 10;

const CONTINUATION_BIT: u8 = 0x80;
const DATA_MASK: u8 = 0x7F;

/// Encode into a fixed array, returning the used length.
#[inline]
pub fn encode_varuint(mut value: u64) -> ([u8; MAX_VARINT_LEN], usize) {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let mut i = 0;
    loop {
        let byte = (value & u64::from(DATA_MASK)) as u8;
        value >>= 7;
        if value == 0 {
            buf[i] = byte;
            return (buf, i + 1);
        }
        buf[i] = byte | CONTINUATION_BIT;
        i += 1;
    }
}

/// Append the encoding of `value` to `out`.
#[inline]
pub fn put_varuint(out: &mut Vec<u8>, value: u64) {
    let (buf, len) = encode_varuint(value);
    out.extend_from_slice(&buf[..len]);
}

#[inline]
pub fn put_varint(out: &mut Vec<u8>, value: i64) {
    put_varuint(out, zigzag_encode(value));
}

/// Number of bytes `value` encodes to.
#[inline]
#[must_use]
pub const fn varuint_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decode from the front of `buf`, returning `(value, bytes consumed)`.
pub fn get_varuint(buf: &[u8]) -> RowResult<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in buf.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(RowError::malformed("varint too long"));
        }
        let data = u64::from(byte & DATA_MASK);
        // 10th byte may only carry the top bit of a u64.
        if shift == 63 && data > 1 {
            return Err(RowError::malformed("varint overflows u64"));
        }
        result |= data << shift;
        if byte & CONTINUATION_BIT == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }
    Err(RowError::malformed("truncated varint"))
}

pub fn get_varint(buf: &[u8]) -> RowResult<(i64, usize)> {
    let (raw, used) = get_varuint(buf)?;
    Ok((zigzag_decode(raw), used))
}

#[inline]
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
