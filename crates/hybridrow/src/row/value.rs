// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive values and the scalar newtypes that have no std equivalent.

use crate::layout::{LayoutCode, LayoutType};
use std::cmp::Ordering;
use uuid::Uuid;

/// 128-bit IEEE binary128, stored as two little-endian halves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Float128 {
    pub low: u64,
    pub high: u64,
}

impl Float128 {
    pub const fn new(high: u64, low: u64) -> Self {
        Self { low, high }
    }

    /// IEEE total order over the 128-bit pattern, as `f64::total_cmp`.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        fn key(v: &Float128) -> i128 {
            let bits = ((u128::from(v.high) << 64) | u128::from(v.low)) as i128;
            bits ^ ((((bits >> 127) as u128) >> 1) as i128)
        }
        key(self).cmp(&key(other))
    }
}

/// Fixed-point decimal: `mantissa * 10^-scale`.
///
/// Packed into 16 bytes: a 120-bit two's-complement mantissa followed by
/// the scale byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Decimal {
    pub mantissa: i128,
    pub scale: u8,
}

impl Decimal {
    const MANTISSA_BITS: u32 = 120;
    pub const MAX_MANTISSA: i128 = (1i128 << (Self::MANTISSA_BITS - 1)) - 1;
    pub const MIN_MANTISSA: i128 = -(1i128 << (Self::MANTISSA_BITS - 1));

    pub const fn new(mantissa: i128, scale: u8) -> Self {
        Self { mantissa, scale }
    }

    pub const fn is_representable(&self) -> bool {
        self.mantissa >= Self::MIN_MANTISSA && self.mantissa <= Self::MAX_MANTISSA
    }

    /// Numeric order: `1` and `1.0` are equal, `2` sorts after `1.5`.
    pub fn numeric_cmp(&self, other: &Self) -> Ordering {
        if self.scale < other.scale {
            return other.numeric_cmp(self).reverse();
        }
        // Bring `other` up to `self.scale`.
        let shift = u32::from(self.scale - other.scale);
        if other.mantissa == 0 {
            return self.mantissa.cmp(&0);
        }
        match 10i128
            .checked_pow(shift)
            .and_then(|p| other.mantissa.checked_mul(p))
        {
            Some(scaled) => self.mantissa.cmp(&scaled),
            // `other` rescaled exceeds every mantissa in magnitude.
            None if other.mantissa < 0 => Ordering::Greater,
            None => Ordering::Less,
        }
    }

    pub(crate) fn to_bytes(self) -> [u8; 16] {
        let mut bytes = self.mantissa.to_le_bytes();
        bytes[15] = self.scale;
        bytes
    }

    pub(crate) fn from_bytes(mut bytes: [u8; 16]) -> Self {
        let scale = bytes[15];
        bytes[15] = 0;
        let raw = i128::from_le_bytes(bytes);
        // Sign-extend from 120 bits.
        let mantissa = (raw << 8) >> 8;
        Self { mantissa, scale }
    }
}

/// Ticks (100ns) since 0001-01-01T00:00:00.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateTime(pub i64);

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnixDateTime(pub i64);

/// 12-byte MongoDB ObjectId.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MongoDbObjectId(pub [u8; 12]);

/// A primitive value read from or written to a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    VarInt(i64),
    VarUInt(u64),
    Float32(f32),
    Float64(f64),
    Float128(Float128),
    Decimal(Decimal),
    DateTime(DateTime),
    UnixDateTime(UnixDateTime),
    Guid(Uuid),
    ObjectId(MongoDbObjectId),
    Utf8(String),
    Binary(Vec<u8>),
}

impl Value {
    /// Layout type this value encodes as.
    pub fn layout_type(&self) -> LayoutType {
        match self {
            Self::Null => LayoutType::Null,
            Self::Bool(_) => LayoutType::Boolean,
            Self::Int8(_) => LayoutType::Int8,
            Self::Int16(_) => LayoutType::Int16,
            Self::Int32(_) => LayoutType::Int32,
            Self::Int64(_) => LayoutType::Int64,
            Self::UInt8(_) => LayoutType::UInt8,
            Self::UInt16(_) => LayoutType::UInt16,
            Self::UInt32(_) => LayoutType::UInt32,
            Self::UInt64(_) => LayoutType::UInt64,
            Self::VarInt(_) => LayoutType::VarInt,
            Self::VarUInt(_) => LayoutType::VarUInt,
            Self::Float32(_) => LayoutType::Float32,
            Self::Float64(_) => LayoutType::Float64,
            Self::Float128(_) => LayoutType::Float128,
            Self::Decimal(_) => LayoutType::Decimal,
            Self::DateTime(_) => LayoutType::DateTime,
            Self::UnixDateTime(_) => LayoutType::UnixDateTime,
            Self::Guid(_) => LayoutType::Guid,
            Self::ObjectId(_) => LayoutType::MongoDbObjectId,
            Self::Utf8(_) => LayoutType::Utf8,
            Self::Binary(_) => LayoutType::Binary,
        }
    }

    pub fn code(&self) -> LayoutCode {
        match self {
            Self::Bool(false) => LayoutCode::BooleanFalse,
            other => other.layout_type().code(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Ordering used to keep set elements and map keys sorted.
    ///
    /// Numbers compare numerically, floats by `total_cmp`, text and byte
    /// strings lexicographically. Values of different kinds have no order.
    pub fn key_cmp(&self, other: &Value) -> Option<Ordering> {
        use Value as V;
        Some(match (self, other) {
            (V::Null, V::Null) => Ordering::Equal,
            (V::Bool(a), V::Bool(b)) => a.cmp(b),
            (V::Int8(a), V::Int8(b)) => a.cmp(b),
            (V::Int16(a), V::Int16(b)) => a.cmp(b),
            (V::Int32(a), V::Int32(b)) => a.cmp(b),
            (V::Int64(a), V::Int64(b)) | (V::VarInt(a), V::VarInt(b)) => a.cmp(b),
            (V::UInt8(a), V::UInt8(b)) => a.cmp(b),
            (V::UInt16(a), V::UInt16(b)) => a.cmp(b),
            (V::UInt32(a), V::UInt32(b)) => a.cmp(b),
            (V::UInt64(a), V::UInt64(b)) | (V::VarUInt(a), V::VarUInt(b)) => a.cmp(b),
            (V::Float32(a), V::Float32(b)) => a.total_cmp(b),
            (V::Float64(a), V::Float64(b)) => a.total_cmp(b),
            (V::Float128(a), V::Float128(b)) => a.total_cmp(b),
            (V::Decimal(a), V::Decimal(b)) => a.numeric_cmp(b),
            (V::DateTime(a), V::DateTime(b)) => a.cmp(b),
            (V::UnixDateTime(a), V::UnixDateTime(b)) => a.cmp(b),
            (V::Guid(a), V::Guid(b)) => a.as_bytes().cmp(b.as_bytes()),
            (V::ObjectId(a), V::ObjectId(b)) => a.cmp(b),
            (V::Utf8(a), V::Utf8(b)) => a.as_bytes().cmp(b.as_bytes()),
            (V::Binary(a), V::Binary(b)) => a.cmp(b),
            _ => return None,
        })
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_value!(
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    Float128 => Float128,
    Decimal => Decimal,
    DateTime => DateTime,
    UnixDateTime => UnixDateTime,
    Uuid => Guid,
    MongoDbObjectId => ObjectId,
    String => Utf8,
    Vec<u8> => Binary,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Binary(v.to_vec())
    }
}
