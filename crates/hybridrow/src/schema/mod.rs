// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema model: namespaces, schemas, properties and their types.
//!
//! A [`Namespace`] owns every [`Schema`] a row can reference. User-defined
//! type properties point at other schemas by [`SchemaId`] only, so self and
//! mutual references never form ownership cycles; the id is looked up
//! through the namespace (or a [`LayoutResolver`](crate::layout::LayoutResolver))
//! when a layout is compiled or a UDT scope is entered.
//!
//! The model derives serde so an external loader can produce it from any
//! serde format.

mod builder;
pub mod hash;

pub use builder::SchemaBuilder;
pub use hash::SchemaHash;

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable 32-bit schema identifier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SchemaId(i32);

impl SchemaId {
    /// Reserved id that never names a schema.
    pub const INVALID: SchemaId = SchemaId(0);

    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    pub const fn id(self) -> i32 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    pub const fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub const fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self(i32::from_le_bytes(bytes))
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical type of a property or schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TypeKind {
    Null = 1,
    Boolean = 2,
    Int8 = 3,
    Int16 = 4,
    Int32 = 5,
    Int64 = 6,
    UInt8 = 7,
    UInt16 = 8,
    UInt32 = 9,
    UInt64 = 10,
    VarInt = 11,
    VarUInt = 12,
    Float32 = 13,
    Float64 = 14,
    Float128 = 15,
    Decimal = 16,
    DateTime = 17,
    UnixDateTime = 18,
    Guid = 19,
    MongoDbObjectId = 20,
    Utf8 = 21,
    Binary = 22,
    Object = 30,
    Array = 31,
    Set = 32,
    Map = 33,
    Tuple = 34,
    Tagged = 35,
    Schema = 36,
}

impl TypeKind {
    /// Returns true for kinds that can appear in [`PropertyType::Primitive`].
    pub const fn is_primitive(self) -> bool {
        (self as u8) < (TypeKind::Object as u8)
    }
}

/// Where a column's value lives in the row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum StorageKind {
    /// Located by scanning the tagged item chain.
    #[default]
    Sparse = 0,
    /// Fixed byte offset inside the fixed region.
    Fixed = 1,
    /// Addressed through the variable end-offset table.
    Variable = 2,
}

/// Schema-level flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    /// Reject writes to paths the layout does not declare.
    pub disallow_unschematized: bool,
    /// Keep a per-property timestamp alongside each value.
    pub enable_property_level_timestamp: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionKey {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimarySortKey {
    pub path: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticKey {
    pub path: String,
}

/// The type of a property.
///
/// Nested element types are owned; user-defined types are referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyType {
    Primitive {
        kind: TypeKind,
        #[serde(default)]
        storage: StorageKind,
        /// Fixed byte length for fixed-storage utf8/binary (0 otherwise).
        #[serde(default)]
        length: u32,
        #[serde(default)]
        nullable: bool,
    },
    Array {
        items: Box<PropertyType>,
        #[serde(default)]
        nullable: bool,
        #[serde(default)]
        immutable: bool,
    },
    Set {
        items: Box<PropertyType>,
        #[serde(default)]
        nullable: bool,
        #[serde(default)]
        immutable: bool,
    },
    Map {
        keys: Box<PropertyType>,
        values: Box<PropertyType>,
        #[serde(default)]
        nullable: bool,
        #[serde(default)]
        immutable: bool,
    },
    Tuple {
        items: Vec<PropertyType>,
        #[serde(default)]
        nullable: bool,
        #[serde(default)]
        immutable: bool,
    },
    Tagged {
        items: Vec<PropertyType>,
        #[serde(default)]
        nullable: bool,
        #[serde(default)]
        immutable: bool,
    },
    Object {
        properties: Vec<Property>,
        #[serde(default)]
        nullable: bool,
        #[serde(default)]
        immutable: bool,
    },
    Udt {
        /// Display name only; the id is authoritative.
        name: String,
        schema_id: SchemaId,
        #[serde(default)]
        nullable: bool,
        #[serde(default)]
        immutable: bool,
    },
}

impl PropertyType {
    pub fn type_kind(&self) -> TypeKind {
        match self {
            Self::Primitive { kind, .. } => *kind,
            Self::Array { .. } => TypeKind::Array,
            Self::Set { .. } => TypeKind::Set,
            Self::Map { .. } => TypeKind::Map,
            Self::Tuple { .. } => TypeKind::Tuple,
            Self::Tagged { .. } => TypeKind::Tagged,
            Self::Object { .. } => TypeKind::Object,
            Self::Udt { .. } => TypeKind::Schema,
        }
    }

    pub fn nullable(&self) -> bool {
        match self {
            Self::Primitive { nullable, .. }
            | Self::Array { nullable, .. }
            | Self::Set { nullable, .. }
            | Self::Map { nullable, .. }
            | Self::Tuple { nullable, .. }
            | Self::Tagged { nullable, .. }
            | Self::Object { nullable, .. }
            | Self::Udt { nullable, .. } => *nullable,
        }
    }

    /// Declared storage; every non-primitive lives in the sparse region.
    pub fn storage(&self) -> StorageKind {
        match self {
            Self::Primitive { storage, .. } => *storage,
            _ => StorageKind::Sparse,
        }
    }

    pub fn is_immutable(&self) -> bool {
        match self {
            Self::Primitive { .. } => false,
            Self::Array { immutable, .. }
            | Self::Set { immutable, .. }
            | Self::Map { immutable, .. }
            | Self::Tuple { immutable, .. }
            | Self::Tagged { immutable, .. }
            | Self::Object { immutable, .. }
            | Self::Udt { immutable, .. } => *immutable,
        }
    }
}

/// A named, typed member of a schema or object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
}

impl Property {
    pub fn new(path: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            path: path.into(),
            comment: None,
            property_type,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A user-defined type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub id: SchemaId,
    #[serde(default = "Schema::default_kind")]
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Declared schema-language version (display metadata).
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub options: SchemaOptions,
    #[serde(default)]
    pub partition_keys: Vec<PartitionKey>,
    #[serde(default)]
    pub primary_sort_keys: Vec<PrimarySortKey>,
    #[serde(default)]
    pub static_keys: Vec<StaticKey>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Schema {
    fn default_kind() -> TypeKind {
        TypeKind::Schema
    }

    pub fn property(&self, path: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.path == path)
    }
}

/// Owner of a set of schemas addressable by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    schemas: Vec<Schema>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 0,
            schemas: Vec::new(),
        }
    }

    /// Add a schema; ids must be valid and unique within the namespace.
    pub fn add(&mut self, schema: Schema) -> Result<(), SchemaError> {
        if !schema.id.is_valid() || self.find_by_id(schema.id).is_some() {
            return Err(SchemaError::DuplicateSchemaId(schema.id));
        }
        self.schemas.push(schema);
        Ok(())
    }

    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    pub fn find_by_id(&self, id: SchemaId) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    /// Check id uniqueness after deserialization.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for (i, schema) in self.schemas.iter().enumerate() {
            if !schema.id.is_valid() || self.schemas[..i].iter().any(|s| s.id == schema.id) {
                return Err(SchemaError::DuplicateSchemaId(schema.id));
            }
        }
        Ok(())
    }
}
