// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SchemaHash - structural fingerprint of a schema
//!
//! The hash is computed by applying MD5 to a canonical byte stream that
//! describes the *structure* of a schema:
//!
//! 1. Seed (low, high) as 16 little-endian bytes
//! 2. SchemaId, TypeKind, option flags
//! 3. Partition / primary-sort (with direction) / static key paths
//! 4. For every property: path, storage, nullability, recursive type
//!
//! Display metadata (schema name, comments, declared version, UDT display
//! name) never enters the stream, so renaming is a non-breaking change.
//! UDT references contribute only their SchemaId.

use super::{Property, PropertyType, Schema, SortDirection, StorageKind};
use md5::{Digest, Md5};
use std::fmt;

// Stream tags; one per structural element so adjacent fields cannot alias.
const TAG_SCHEMA: u8 = 0x01;
const TAG_OPTIONS: u8 = 0x02;
const TAG_PARTITION_KEY: u8 = 0x03;
const TAG_SORT_KEY: u8 = 0x04;
const TAG_STATIC_KEY: u8 = 0x05;
const TAG_PROPERTY: u8 = 0x06;
const TAG_PRIMITIVE: u8 = 0x10;
const TAG_ARRAY: u8 = 0x11;
const TAG_SET: u8 = 0x12;
const TAG_MAP: u8 = 0x13;
const TAG_TUPLE: u8 = 0x14;
const TAG_TAGGED: u8 = 0x15;
const TAG_OBJECT: u8 = 0x16;
const TAG_UDT: u8 = 0x17;

/// 128-bit structural hash of a [`Schema`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SchemaHash {
    pub low: u64,
    pub high: u64,
}

impl SchemaHash {
    pub const fn new(low: u64, high: u64) -> Self {
        Self { low, high }
    }

    /// Hash with a zero seed.
    pub fn compute(schema: &Schema) -> Self {
        Self::compute_seeded(schema, Self::default())
    }

    /// Hash seeded with a previous result, so hashes can be chained across schemas.
    pub fn compute_seeded(schema: &Schema, seed: SchemaHash) -> Self {
        let mut stream = HashStream::new();
        stream.u64(seed.low);
        stream.u64(seed.high);
        stream.schema(schema);

        let digest = stream.hasher.finalize();
        let mut low = [0u8; 8];
        let mut high = [0u8; 8];
        low.copy_from_slice(&digest[..8]);
        high.copy_from_slice(&digest[8..16]);
        Self {
            low: u64::from_le_bytes(low),
            high: u64::from_le_bytes(high),
        }
    }
}

impl fmt::Display for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.high, self.low)
    }
}

struct HashStream {
    hasher: Md5,
}

impl HashStream {
    fn new() -> Self {
        Self { hasher: Md5::new() }
    }

    fn u8(&mut self, v: u8) {
        self.hasher.update([v]);
    }

    fn u32(&mut self, v: u32) {
        self.hasher.update(v.to_le_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.hasher.update(v.to_le_bytes());
    }

    fn flag(&mut self, v: bool) {
        self.u8(u8::from(v));
    }

    fn str(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.hasher.update(s.as_bytes());
    }

    fn schema(&mut self, schema: &Schema) {
        self.u8(TAG_SCHEMA);
        self.u32(schema.id.id() as u32);
        self.u8(schema.kind as u8);

        self.u8(TAG_OPTIONS);
        self.flag(schema.options.disallow_unschematized);
        self.flag(schema.options.enable_property_level_timestamp);

        self.u32(schema.partition_keys.len() as u32);
        for key in &schema.partition_keys {
            self.u8(TAG_PARTITION_KEY);
            self.str(&key.path);
        }
        self.u32(schema.primary_sort_keys.len() as u32);
        for key in &schema.primary_sort_keys {
            self.u8(TAG_SORT_KEY);
            self.str(&key.path);
            self.u8(match key.direction {
                SortDirection::Ascending => 0,
                SortDirection::Descending => 1,
            });
        }
        self.u32(schema.static_keys.len() as u32);
        for key in &schema.static_keys {
            self.u8(TAG_STATIC_KEY);
            self.str(&key.path);
        }

        self.properties(&schema.properties);
    }

    fn properties(&mut self, properties: &[Property]) {
        self.u32(properties.len() as u32);
        for property in properties {
            self.u8(TAG_PROPERTY);
            self.str(&property.path);
            self.property_type(&property.property_type);
        }
    }

    fn property_type(&mut self, ty: &PropertyType) {
        match ty {
            PropertyType::Primitive {
                kind,
                storage,
                length,
                nullable,
            } => {
                self.u8(TAG_PRIMITIVE);
                self.u8(*kind as u8);
                self.u8(*storage as u8);
                self.u32(*length);
                self.flag(*nullable);
            }
            PropertyType::Array {
                items,
                nullable,
                immutable,
            } => {
                self.scope_header(TAG_ARRAY, *nullable, *immutable);
                self.property_type(items);
            }
            PropertyType::Set {
                items,
                nullable,
                immutable,
            } => {
                self.scope_header(TAG_SET, *nullable, *immutable);
                self.property_type(items);
            }
            PropertyType::Map {
                keys,
                values,
                nullable,
                immutable,
            } => {
                self.scope_header(TAG_MAP, *nullable, *immutable);
                self.property_type(keys);
                self.property_type(values);
            }
            PropertyType::Tuple {
                items,
                nullable,
                immutable,
            } => {
                self.scope_header(TAG_TUPLE, *nullable, *immutable);
                self.u32(items.len() as u32);
                for item in items {
                    self.property_type(item);
                }
            }
            PropertyType::Tagged {
                items,
                nullable,
                immutable,
            } => {
                self.scope_header(TAG_TAGGED, *nullable, *immutable);
                self.u32(items.len() as u32);
                for item in items {
                    self.property_type(item);
                }
            }
            PropertyType::Object {
                properties,
                nullable,
                immutable,
            } => {
                self.scope_header(TAG_OBJECT, *nullable, *immutable);
                self.properties(properties);
            }
            PropertyType::Udt {
                schema_id,
                nullable,
                immutable,
                ..
            } => {
                self.scope_header(TAG_UDT, *nullable, *immutable);
                self.u32(schema_id.id() as u32);
            }
        }
    }

    fn scope_header(&mut self, tag: u8, nullable: bool, immutable: bool) {
        self.u8(tag);
        self.u8(StorageKind::Sparse as u8);
        self.flag(nullable);
        self.flag(immutable);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaBuilder, SchemaId, TypeKind};

    fn base() -> SchemaBuilder {
        SchemaBuilder::new("Customer", SchemaId::new(10))
            .comment("v1 customer")
            .property(
                "id",
                PropertyType::primitive(TypeKind::Int64).with_storage(StorageKind::Fixed),
            )
            .property("name", PropertyType::primitive(TypeKind::Utf8).optional())
            .property("address", PropertyType::udt("Address", SchemaId::new(11)))
            .partition_key("id")
    }

    #[test]
    fn test_display_metadata_excluded() {
        let a = base().build();
        let b = base().comment("renamed").version(7).build();
        let mut c = base().build();
        c.name = "Client".to_string();
        if let PropertyType::Udt { name, .. } = &mut c.properties[2].property_type {
            *name = "PostalAddress".to_string();
        }
        assert_eq!(SchemaHash::compute(&a), SchemaHash::compute(&b));
        assert_eq!(SchemaHash::compute(&a), SchemaHash::compute(&c));
    }

    #[test]
    fn test_structure_changes_hash() {
        let a = SchemaHash::compute(&base().build());

        let mut storage = base().build();
        storage.properties[1].property_type =
            PropertyType::primitive(TypeKind::Utf8).with_storage(StorageKind::Variable).optional();
        assert_ne!(a, SchemaHash::compute(&storage));

        let mut nullable = base().build();
        nullable.properties[1].property_type = PropertyType::primitive(TypeKind::Utf8);
        assert_ne!(a, SchemaHash::compute(&nullable));

        let mut udt = base().build();
        udt.properties[2].property_type = PropertyType::udt("Address", SchemaId::new(12));
        assert_ne!(a, SchemaHash::compute(&udt));

        let key = base().partition_key("name").build();
        assert_ne!(a, SchemaHash::compute(&key));
    }

    #[test]
    fn test_seed_changes_hash() {
        let schema = base().build();
        let plain = SchemaHash::compute(&schema);
        let seeded = SchemaHash::compute_seeded(&schema, SchemaHash::new(1, 2));
        assert_ne!(plain, seeded);
        assert_eq!(seeded, SchemaHash::compute_seeded(&schema, SchemaHash::new(1, 2)));
        assert_eq!(plain.to_string().len(), 32);
    }
}
