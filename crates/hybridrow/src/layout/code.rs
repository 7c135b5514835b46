// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! LayoutCode - one-byte type tag carried by every sparse item.

use std::fmt;

/// Wire type tag.
///
/// Scope codes come in pairs: the even code is the mutable variant and the
/// next odd code its immutable twin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum LayoutCode {
    Invalid = 0,
    Null = 1,
    BooleanFalse = 2,
    Boolean = 3,
    Int8 = 5,
    Int16 = 6,
    Int32 = 7,
    Int64 = 8,
    UInt8 = 9,
    UInt16 = 10,
    UInt32 = 11,
    UInt64 = 12,
    VarInt = 13,
    VarUInt = 14,
    Float32 = 15,
    Float64 = 16,
    Decimal = 17,
    DateTime = 18,
    Guid = 19,
    Utf8 = 20,
    Binary = 21,
    Float128 = 22,
    UnixDateTime = 23,
    MongoDbObjectId = 24,

    ObjectScope = 30,
    ImmutableObjectScope = 31,
    TypedArrayScope = 34,
    ImmutableTypedArrayScope = 35,
    TupleScope = 36,
    ImmutableTupleScope = 37,
    TypedTupleScope = 38,
    ImmutableTypedTupleScope = 39,
    TypedMapScope = 42,
    ImmutableTypedMapScope = 43,
    TypedSetScope = 46,
    ImmutableTypedSetScope = 47,
    NullableScope = 48,
    ImmutableNullableScope = 49,
    TaggedScope = 50,
    ImmutableTaggedScope = 51,
    Tagged2Scope = 52,
    ImmutableTagged2Scope = 53,

    Schema = 68,
    ImmutableSchema = 69,
}

impl LayoutCode {
    /// Decode a tag byte; unknown bytes yield `None`.
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Invalid,
            1 => Self::Null,
            2 => Self::BooleanFalse,
            3 => Self::Boolean,
            5 => Self::Int8,
            6 => Self::Int16,
            7 => Self::Int32,
            8 => Self::Int64,
            9 => Self::UInt8,
            10 => Self::UInt16,
            11 => Self::UInt32,
            12 => Self::UInt64,
            13 => Self::VarInt,
            14 => Self::VarUInt,
            15 => Self::Float32,
            16 => Self::Float64,
            17 => Self::Decimal,
            18 => Self::DateTime,
            19 => Self::Guid,
            20 => Self::Utf8,
            21 => Self::Binary,
            22 => Self::Float128,
            23 => Self::UnixDateTime,
            24 => Self::MongoDbObjectId,
            30 => Self::ObjectScope,
            31 => Self::ImmutableObjectScope,
            34 => Self::TypedArrayScope,
            35 => Self::ImmutableTypedArrayScope,
            36 => Self::TupleScope,
            37 => Self::ImmutableTupleScope,
            38 => Self::TypedTupleScope,
            39 => Self::ImmutableTypedTupleScope,
            42 => Self::TypedMapScope,
            43 => Self::ImmutableTypedMapScope,
            46 => Self::TypedSetScope,
            47 => Self::ImmutableTypedSetScope,
            48 => Self::NullableScope,
            49 => Self::ImmutableNullableScope,
            50 => Self::TaggedScope,
            51 => Self::ImmutableTaggedScope,
            52 => Self::Tagged2Scope,
            53 => Self::ImmutableTagged2Scope,
            68 => Self::Schema,
            69 => Self::ImmutableSchema,
            _ => return None,
        })
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Null => "null",
            Self::BooleanFalse | Self::Boolean => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::VarInt => "varint",
            Self::VarUInt => "varuint",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Decimal => "decimal",
            Self::DateTime => "datetime",
            Self::Guid => "guid",
            Self::Utf8 => "utf8",
            Self::Binary => "binary",
            Self::Float128 => "float128",
            Self::UnixDateTime => "unixdatetime",
            Self::MongoDbObjectId => "mongodbobjectid",
            Self::ObjectScope => "object",
            Self::ImmutableObjectScope => "im_object",
            Self::TypedArrayScope => "array_t",
            Self::ImmutableTypedArrayScope => "im_array_t",
            Self::TupleScope => "tuple",
            Self::ImmutableTupleScope => "im_tuple",
            Self::TypedTupleScope => "tuple_t",
            Self::ImmutableTypedTupleScope => "im_tuple_t",
            Self::TypedMapScope => "map_t",
            Self::ImmutableTypedMapScope => "im_map_t",
            Self::TypedSetScope => "set_t",
            Self::ImmutableTypedSetScope => "im_set_t",
            Self::NullableScope => "nullable",
            Self::ImmutableNullableScope => "im_nullable",
            Self::TaggedScope => "tagged_t",
            Self::ImmutableTaggedScope => "im_tagged_t",
            Self::Tagged2Scope => "tagged2_t",
            Self::ImmutableTagged2Scope => "im_tagged2_t",
            Self::Schema => "udt",
            Self::ImmutableSchema => "im_udt",
        }
    }
}

impl fmt::Display for LayoutCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
