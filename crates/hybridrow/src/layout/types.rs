// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! LayoutType and type arguments.
//!
//! [`LayoutType`] is the closed set of physical types a column or sparse
//! item can have. Parametric scopes carry a [`TypeArgumentList`]; UDT
//! scopes carry the referenced [`SchemaId`] instead.
//!
//! # Type-argument wire form
//!
//! ```text
//! array_t / set_t / nullable : [arg]
//! map_t                      : [key arg][value arg]
//! tuple / tuple_t            : [count: varuint][arg]...
//! tagged_t                   : [arg]          (implicit leading uint8)
//! tagged2_t                  : [arg][arg]     (implicit leading uint8)
//! udt                        : [SchemaId:4]
//! arg                        : [LayoutCode:1][arg's own type arguments]
//! ```

use super::LayoutCode;
use crate::config::{MAX_TYPE_ARG_DEPTH, SCHEMA_ID_SIZE};
use crate::error::{RowError, RowResult};
use crate::row::varint;
use crate::schema::SchemaId;
use std::fmt;

/// Physical type of a column, sparse item or scope element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutType {
    Null,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    VarInt,
    VarUInt,
    Float32,
    Float64,
    Float128,
    Decimal,
    DateTime,
    UnixDateTime,
    Guid,
    MongoDbObjectId,
    Utf8,
    Binary,
    Object { immutable: bool },
    TypedArray { immutable: bool },
    TypedSet { immutable: bool },
    TypedMap { immutable: bool },
    Tuple { immutable: bool },
    TypedTuple { immutable: bool },
    Tagged { immutable: bool },
    Tagged2 { immutable: bool },
    Nullable { immutable: bool },
    Udt { immutable: bool },
}

impl LayoutType {
    /// Wire tag. Booleans report `Boolean`; sparse `false` is tagged `BooleanFalse`.
    pub const fn code(self) -> LayoutCode {
        use LayoutCode as C;
        match self {
            Self::Null => C::Null,
            Self::Boolean => C::Boolean,
            Self::Int8 => C::Int8,
            Self::Int16 => C::Int16,
            Self::Int32 => C::Int32,
            Self::Int64 => C::Int64,
            Self::UInt8 => C::UInt8,
            Self::UInt16 => C::UInt16,
            Self::UInt32 => C::UInt32,
            Self::UInt64 => C::UInt64,
            Self::VarInt => C::VarInt,
            Self::VarUInt => C::VarUInt,
            Self::Float32 => C::Float32,
            Self::Float64 => C::Float64,
            Self::Float128 => C::Float128,
            Self::Decimal => C::Decimal,
            Self::DateTime => C::DateTime,
            Self::UnixDateTime => C::UnixDateTime,
            Self::Guid => C::Guid,
            Self::MongoDbObjectId => C::MongoDbObjectId,
            Self::Utf8 => C::Utf8,
            Self::Binary => C::Binary,
            Self::Object { immutable } => pick(immutable, C::ObjectScope, C::ImmutableObjectScope),
            Self::TypedArray { immutable } => {
                pick(immutable, C::TypedArrayScope, C::ImmutableTypedArrayScope)
            }
            Self::TypedSet { immutable } => {
                pick(immutable, C::TypedSetScope, C::ImmutableTypedSetScope)
            }
            Self::TypedMap { immutable } => {
                pick(immutable, C::TypedMapScope, C::ImmutableTypedMapScope)
            }
            Self::Tuple { immutable } => pick(immutable, C::TupleScope, C::ImmutableTupleScope),
            Self::TypedTuple { immutable } => {
                pick(immutable, C::TypedTupleScope, C::ImmutableTypedTupleScope)
            }
            Self::Tagged { immutable } => pick(immutable, C::TaggedScope, C::ImmutableTaggedScope),
            Self::Tagged2 { immutable } => {
                pick(immutable, C::Tagged2Scope, C::ImmutableTagged2Scope)
            }
            Self::Nullable { immutable } => {
                pick(immutable, C::NullableScope, C::ImmutableNullableScope)
            }
            Self::Udt { immutable } => pick(immutable, C::Schema, C::ImmutableSchema),
        }
    }

    /// Inverse of [`code`](Self::code). `Invalid` has no layout type.
    pub const fn from_code(code: LayoutCode) -> Option<Self> {
        use LayoutCode as C;
        Some(match code {
            C::Invalid => return None,
            C::Null => Self::Null,
            C::BooleanFalse | C::Boolean => Self::Boolean,
            C::Int8 => Self::Int8,
            C::Int16 => Self::Int16,
            C::Int32 => Self::Int32,
            C::Int64 => Self::Int64,
            C::UInt8 => Self::UInt8,
            C::UInt16 => Self::UInt16,
            C::UInt32 => Self::UInt32,
            C::UInt64 => Self::UInt64,
            C::VarInt => Self::VarInt,
            C::VarUInt => Self::VarUInt,
            C::Float32 => Self::Float32,
            C::Float64 => Self::Float64,
            C::Decimal => Self::Decimal,
            C::DateTime => Self::DateTime,
            C::Guid => Self::Guid,
            C::Utf8 => Self::Utf8,
            C::Binary => Self::Binary,
            C::Float128 => Self::Float128,
            C::UnixDateTime => Self::UnixDateTime,
            C::MongoDbObjectId => Self::MongoDbObjectId,
            C::ObjectScope => Self::Object { immutable: false },
            C::ImmutableObjectScope => Self::Object { immutable: true },
            C::TypedArrayScope => Self::TypedArray { immutable: false },
            C::ImmutableTypedArrayScope => Self::TypedArray { immutable: true },
            C::TupleScope => Self::Tuple { immutable: false },
            C::ImmutableTupleScope => Self::Tuple { immutable: true },
            C::TypedTupleScope => Self::TypedTuple { immutable: false },
            C::ImmutableTypedTupleScope => Self::TypedTuple { immutable: true },
            C::TypedMapScope => Self::TypedMap { immutable: false },
            C::ImmutableTypedMapScope => Self::TypedMap { immutable: true },
            C::TypedSetScope => Self::TypedSet { immutable: false },
            C::ImmutableTypedSetScope => Self::TypedSet { immutable: true },
            C::NullableScope => Self::Nullable { immutable: false },
            C::ImmutableNullableScope => Self::Nullable { immutable: true },
            C::TaggedScope => Self::Tagged { immutable: false },
            C::ImmutableTaggedScope => Self::Tagged { immutable: true },
            C::Tagged2Scope => Self::Tagged2 { immutable: false },
            C::ImmutableTagged2Scope => Self::Tagged2 { immutable: true },
            C::Schema => Self::Udt { immutable: false },
            C::ImmutableSchema => Self::Udt { immutable: true },
        })
    }

    pub const fn name(self) -> &'static str {
        self.code().name()
    }

    /// Size of the value in a fixed slot or untagged element, if constant.
    pub const fn fixed_size(self) -> Option<usize> {
        Some(match self {
            Self::Null => 0,
            Self::Boolean | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64
            | Self::UInt64
            | Self::Float64
            | Self::DateTime
            | Self::UnixDateTime => 8,
            Self::MongoDbObjectId => 12,
            Self::Float128 | Self::Decimal | Self::Guid => 16,
            _ => return None,
        })
    }

    pub const fn is_fixed(self) -> bool {
        self.fixed_size().is_some()
    }

    /// Types that may use variable storage.
    pub const fn is_variable(self) -> bool {
        matches!(self, Self::VarInt | Self::VarUInt | Self::Utf8 | Self::Binary)
    }

    pub const fn is_scope(self) -> bool {
        matches!(
            self,
            Self::Object { .. }
                | Self::TypedArray { .. }
                | Self::TypedSet { .. }
                | Self::TypedMap { .. }
                | Self::Tuple { .. }
                | Self::TypedTuple { .. }
                | Self::Tagged { .. }
                | Self::Tagged2 { .. }
                | Self::Nullable { .. }
                | Self::Udt { .. }
        )
    }

    pub const fn immutable(self) -> bool {
        match self {
            Self::Object { immutable }
            | Self::TypedArray { immutable }
            | Self::TypedSet { immutable }
            | Self::TypedMap { immutable }
            | Self::Tuple { immutable }
            | Self::TypedTuple { immutable }
            | Self::Tagged { immutable }
            | Self::Tagged2 { immutable }
            | Self::Nullable { immutable }
            | Self::Udt { immutable } => immutable,
            _ => false,
        }
    }

    /// Same scope kind with the immutable flag set (primitives unchanged).
    pub const fn to_immutable(self) -> Self {
        match self {
            Self::Object { .. } => Self::Object { immutable: true },
            Self::TypedArray { .. } => Self::TypedArray { immutable: true },
            Self::TypedSet { .. } => Self::TypedSet { immutable: true },
            Self::TypedMap { .. } => Self::TypedMap { immutable: true },
            Self::Tuple { .. } => Self::Tuple { immutable: true },
            Self::TypedTuple { .. } => Self::TypedTuple { immutable: true },
            Self::Tagged { .. } => Self::Tagged { immutable: true },
            Self::Tagged2 { .. } => Self::Tagged2 { immutable: true },
            Self::Nullable { .. } => Self::Nullable { immutable: true },
            Self::Udt { .. } => Self::Udt { immutable: true },
            other => other,
        }
    }

    /// Scopes whose items carry a path (root, UDT, object).
    pub const fn is_schematized(self) -> bool {
        matches!(self, Self::Object { .. } | Self::Udt { .. })
    }

    /// Scopes whose elements are addressed by position.
    pub const fn is_indexed(self) -> bool {
        self.is_scope() && !self.is_schematized()
    }

    /// Scopes whose elements are stored untagged, typed by the scope's arguments.
    pub const fn is_typed_scope(self) -> bool {
        matches!(
            self,
            Self::TypedArray { .. }
                | Self::TypedSet { .. }
                | Self::TypedMap { .. }
                | Self::TypedTuple { .. }
                | Self::Tagged { .. }
                | Self::Tagged2 { .. }
                | Self::Nullable { .. }
        )
    }

    /// Scopes whose elements must be unique (and are kept sorted).
    pub const fn is_unique_scope(self) -> bool {
        matches!(self, Self::TypedSet { .. } | Self::TypedMap { .. })
    }
}

const fn pick(immutable: bool, mutable_code: LayoutCode, immutable_code: LayoutCode) -> LayoutCode {
    if immutable {
        immutable_code
    } else {
        mutable_code
    }
}

impl fmt::Display for LayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A layout type together with its own type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeArgument {
    layout_type: LayoutType,
    args: TypeArgumentList,
}

impl TypeArgument {
    pub fn new(layout_type: LayoutType, args: TypeArgumentList) -> Self {
        Self { layout_type, args }
    }

    pub fn layout_type(&self) -> LayoutType {
        self.layout_type
    }

    pub fn type_args(&self) -> &TypeArgumentList {
        &self.args
    }

    pub fn array(item: TypeArgument) -> Self {
        Self::new(
            LayoutType::TypedArray { immutable: false },
            TypeArgumentList::new(vec![item]),
        )
    }

    pub fn set(item: TypeArgument) -> Self {
        Self::new(
            LayoutType::TypedSet { immutable: false },
            TypeArgumentList::new(vec![item]),
        )
    }

    pub fn map(key: TypeArgument, value: TypeArgument) -> Self {
        Self::new(
            LayoutType::TypedMap { immutable: false },
            TypeArgumentList::new(vec![key, value]),
        )
    }

    /// Untyped tuple; elements are self-describing.
    pub fn tuple(items: Vec<TypeArgument>) -> Self {
        Self::new(LayoutType::Tuple { immutable: false }, TypeArgumentList::new(items))
    }

    pub fn typed_tuple(items: Vec<TypeArgument>) -> Self {
        Self::new(
            LayoutType::TypedTuple { immutable: false },
            TypeArgumentList::new(items),
        )
    }

    /// Tagged value `(uint8 tag, item)`.
    pub fn tagged(item: TypeArgument) -> Self {
        Self::new(
            LayoutType::Tagged { immutable: false },
            TypeArgumentList::new(vec![LayoutType::UInt8.into(), item]),
        )
    }

    /// Tagged value `(uint8 tag, first, second)`.
    pub fn tagged2(first: TypeArgument, second: TypeArgument) -> Self {
        Self::new(
            LayoutType::Tagged2 { immutable: false },
            TypeArgumentList::new(vec![LayoutType::UInt8.into(), first, second]),
        )
    }

    pub fn nullable(item: TypeArgument) -> Self {
        Self::new(
            LayoutType::Nullable { immutable: false },
            TypeArgumentList::new(vec![item]),
        )
    }

    pub fn object() -> Self {
        LayoutType::Object { immutable: false }.into()
    }

    pub fn udt(schema_id: SchemaId) -> Self {
        Self::new(
            LayoutType::Udt { immutable: false },
            TypeArgumentList::from_schema_id(schema_id),
        )
    }

    /// Same argument with the immutable scope variant.
    pub fn immutable(mut self) -> Self {
        self.layout_type = self.layout_type.to_immutable();
        self
    }
}

impl From<LayoutType> for TypeArgument {
    fn from(layout_type: LayoutType) -> Self {
        Self::new(layout_type, TypeArgumentList::empty())
    }
}

impl fmt::Display for TypeArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.layout_type, self.args)
    }
}

/// Ordered type arguments of a parametric scope, or a UDT's SchemaId.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TypeArgumentList {
    args: Vec<TypeArgument>,
    schema_id: Option<SchemaId>,
}

impl TypeArgumentList {
    pub fn new(args: Vec<TypeArgument>) -> Self {
        Self {
            args,
            schema_id: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_schema_id(schema_id: SchemaId) -> Self {
        Self {
            args: Vec::new(),
            schema_id: Some(schema_id),
        }
    }

    pub fn schema_id(&self) -> Option<SchemaId> {
        self.schema_id
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TypeArgument> {
        self.args.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeArgument> {
        self.args.iter()
    }

    /// Append the wire form of `owner`'s arguments to `out`.
    pub(crate) fn encode(&self, owner: LayoutType, out: &mut Vec<u8>) {
        match owner {
            LayoutType::Tuple { .. } | LayoutType::TypedTuple { .. } => {
                varint::put_varuint(out, self.args.len() as u64);
                for arg in &self.args {
                    arg.encode(out);
                }
            }
            LayoutType::Tagged { .. } | LayoutType::Tagged2 { .. } => {
                for arg in self.args.iter().skip(1) {
                    arg.encode(out);
                }
            }
            LayoutType::TypedArray { .. }
            | LayoutType::TypedSet { .. }
            | LayoutType::TypedMap { .. }
            | LayoutType::Nullable { .. } => {
                for arg in &self.args {
                    arg.encode(out);
                }
            }
            LayoutType::Udt { .. } => {
                let id = self.schema_id.unwrap_or(SchemaId::INVALID);
                out.extend_from_slice(&id.to_le_bytes());
            }
            _ => {}
        }
    }

    /// Decode `owner`'s arguments from `bytes[*pos..]`, advancing `pos`.
    pub(crate) fn decode(owner: LayoutType, bytes: &[u8], pos: &mut usize) -> RowResult<Self> {
        Self::decode_at_depth(owner, bytes, pos, 0)
    }

    fn decode_at_depth(
        owner: LayoutType,
        bytes: &[u8],
        pos: &mut usize,
        depth: usize,
    ) -> RowResult<Self> {
        if depth > MAX_TYPE_ARG_DEPTH {
            return Err(RowError::malformed("type arguments nested too deeply"));
        }
        let fixed_count = match owner {
            LayoutType::TypedArray { .. }
            | LayoutType::TypedSet { .. }
            | LayoutType::Nullable { .. } => 1,
            LayoutType::TypedMap { .. } => 2,
            LayoutType::Tuple { .. } | LayoutType::TypedTuple { .. } => {
                let (count, used) = varint::get_varuint(bytes.get(*pos..).unwrap_or(&[]))?;
                *pos += used;
                let mut args = Vec::new();
                for _ in 0..count {
                    args.push(TypeArgument::decode(bytes, pos, depth + 1)?);
                }
                return Ok(Self::new(args));
            }
            LayoutType::Tagged { .. } | LayoutType::Tagged2 { .. } => {
                let count = if matches!(owner, LayoutType::Tagged { .. }) { 1 } else { 2 };
                let mut args = vec![TypeArgument::from(LayoutType::UInt8)];
                for _ in 0..count {
                    args.push(TypeArgument::decode(bytes, pos, depth + 1)?);
                }
                return Ok(Self::new(args));
            }
            LayoutType::Udt { .. } => {
                let raw = bytes
                    .get(*pos..*pos + SCHEMA_ID_SIZE)
                    .ok_or_else(|| RowError::malformed("truncated schema id"))?;
                let mut id = [0u8; SCHEMA_ID_SIZE];
                id.copy_from_slice(raw);
                *pos += SCHEMA_ID_SIZE;
                return Ok(Self::from_schema_id(SchemaId::from_le_bytes(id)));
            }
            _ => 0,
        };
        let mut args = Vec::with_capacity(fixed_count);
        for _ in 0..fixed_count {
            args.push(TypeArgument::decode(bytes, pos, depth + 1)?);
        }
        Ok(Self::new(args))
    }
}

impl TypeArgument {
    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.layout_type.code().as_u8());
        self.args.encode(self.layout_type, out);
    }

    fn decode(bytes: &[u8], pos: &mut usize, depth: usize) -> RowResult<Self> {
        let byte = *bytes
            .get(*pos)
            .ok_or_else(|| RowError::malformed("truncated type argument"))?;
        *pos += 1;
        let layout_type = LayoutCode::from_u8(byte)
            .and_then(LayoutType::from_code)
            .ok_or_else(|| RowError::malformed("unknown layout code in type argument"))?;
        let args = TypeArgumentList::decode_at_depth(layout_type, bytes, pos, depth)?;
        Ok(Self::new(layout_type, args))
    }
}

impl<'a> IntoIterator for &'a TypeArgumentList {
    type Item = &'a TypeArgument;
    type IntoIter = std::slice::Iter<'a, TypeArgument>;

    fn into_iter(self) -> Self::IntoIter {
        self.args.iter()
    }
}

impl fmt::Display for TypeArgumentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = self.schema_id {
            return write!(f, "<{}>", id);
        }
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_str("<")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(">")
    }
}
