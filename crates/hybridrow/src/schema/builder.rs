// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for schemas and property types.

use super::{
    PartitionKey, PrimarySortKey, Property, PropertyType, Schema, SchemaId, SchemaOptions,
    SortDirection, StaticKey, StorageKind, TypeKind,
};

/// Builder for creating [`Schema`] instances.
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Create a new builder for a user-defined type.
    pub fn new(name: impl Into<String>, id: SchemaId) -> Self {
        Self {
            schema: Schema {
                name: name.into(),
                id,
                kind: TypeKind::Schema,
                comment: None,
                version: 0,
                options: SchemaOptions::default(),
                partition_keys: Vec::new(),
                primary_sort_keys: Vec::new(),
                static_keys: Vec::new(),
                properties: Vec::new(),
            },
        }
    }

    /// Add a property.
    pub fn property(mut self, path: impl Into<String>, property_type: PropertyType) -> Self {
        self.schema
            .properties
            .push(Property::new(path, property_type));
        self
    }

    /// Add a fully-formed property (with comment).
    pub fn with_property(mut self, property: Property) -> Self {
        self.schema.properties.push(property);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.schema.comment = Some(comment.into());
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.schema.version = version;
        self
    }

    pub fn options(mut self, options: SchemaOptions) -> Self {
        self.schema.options = options;
        self
    }

    /// Reject writes to undeclared paths.
    pub fn disallow_unschematized(mut self) -> Self {
        self.schema.options.disallow_unschematized = true;
        self
    }

    pub fn partition_key(mut self, path: impl Into<String>) -> Self {
        self.schema
            .partition_keys
            .push(PartitionKey { path: path.into() });
        self
    }

    pub fn sort_key(mut self, path: impl Into<String>, direction: SortDirection) -> Self {
        self.schema.primary_sort_keys.push(PrimarySortKey {
            path: path.into(),
            direction,
        });
        self
    }

    pub fn static_key(mut self, path: impl Into<String>) -> Self {
        self.schema.static_keys.push(StaticKey { path: path.into() });
        self
    }

    /// Build the Schema.
    pub fn build(self) -> Schema {
        self.schema
    }
}

// Constructors for property types, chained with the `with_*` modifiers.
impl PropertyType {
    /// Sparse, non-nullable primitive.
    pub fn primitive(kind: TypeKind) -> Self {
        Self::Primitive {
            kind,
            storage: StorageKind::Sparse,
            length: 0,
            nullable: false,
        }
    }

    pub fn array(items: PropertyType) -> Self {
        Self::Array {
            items: Box::new(items),
            nullable: false,
            immutable: false,
        }
    }

    pub fn set(items: PropertyType) -> Self {
        Self::Set {
            items: Box::new(items),
            nullable: false,
            immutable: false,
        }
    }

    pub fn map(keys: PropertyType, values: PropertyType) -> Self {
        Self::Map {
            keys: Box::new(keys),
            values: Box::new(values),
            nullable: false,
            immutable: false,
        }
    }

    pub fn tuple(items: Vec<PropertyType>) -> Self {
        Self::Tuple {
            items,
            nullable: false,
            immutable: false,
        }
    }

    pub fn tagged(items: Vec<PropertyType>) -> Self {
        Self::Tagged {
            items,
            nullable: false,
            immutable: false,
        }
    }

    pub fn object(properties: Vec<Property>) -> Self {
        Self::Object {
            properties,
            nullable: false,
            immutable: false,
        }
    }

    pub fn udt(name: impl Into<String>, schema_id: SchemaId) -> Self {
        Self::Udt {
            name: name.into(),
            schema_id,
            nullable: false,
            immutable: false,
        }
    }

    /// Set the storage kind of a primitive (no-op on scopes, which are always sparse).
    pub fn with_storage(mut self, storage_kind: StorageKind) -> Self {
        if let Self::Primitive { storage, .. } = &mut self {
            *storage = storage_kind;
        }
        self
    }

    /// Set the fixed byte length of a utf8/binary primitive.
    pub fn with_length(mut self, bytes: u32) -> Self {
        if let Self::Primitive { length, .. } = &mut self {
            *length = bytes;
        }
        self
    }

    pub fn with_nullable(mut self, value: bool) -> Self {
        match &mut self {
            Self::Primitive { nullable, .. }
            | Self::Array { nullable, .. }
            | Self::Set { nullable, .. }
            | Self::Map { nullable, .. }
            | Self::Tuple { nullable, .. }
            | Self::Tagged { nullable, .. }
            | Self::Object { nullable, .. }
            | Self::Udt { nullable, .. } => *nullable = value,
        }
        self
    }

    pub fn optional(self) -> Self {
        self.with_nullable(true)
    }

    /// Mark a scope type immutable (no-op on primitives).
    pub fn immutable(mut self) -> Self {
        match &mut self {
            Self::Primitive { .. } => {}
            Self::Array { immutable, .. }
            | Self::Set { immutable, .. }
            | Self::Map { immutable, .. }
            | Self::Tuple { immutable, .. }
            | Self::Tagged { immutable, .. }
            | Self::Object { immutable, .. }
            | Self::Udt { immutable, .. } => *immutable = true,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_properties_and_keys() {
        let schema = SchemaBuilder::new("Order", SchemaId::new(9))
            .comment("an order")
            .version(2)
            .property(
                "id",
                PropertyType::primitive(TypeKind::Int64).with_storage(StorageKind::Fixed),
            )
            .property(
                "lines",
                PropertyType::array(PropertyType::primitive(TypeKind::Utf8)),
            )
            .partition_key("id")
            .sort_key("id", SortDirection::Descending)
            .disallow_unschematized()
            .build();

        assert_eq!(schema.properties.len(), 2);
        assert_eq!(schema.comment.as_deref(), Some("an order"));
        assert_eq!(schema.partition_keys[0].path, "id");
        assert_eq!(schema.primary_sort_keys[0].direction, SortDirection::Descending);
        assert!(schema.options.disallow_unschematized);
    }

    #[test]
    fn test_modifiers() {
        let ty = PropertyType::primitive(TypeKind::Utf8)
            .with_storage(StorageKind::Fixed)
            .with_length(8)
            .optional();
        assert_eq!(
            ty,
            PropertyType::Primitive {
                kind: TypeKind::Utf8,
                storage: StorageKind::Fixed,
                length: 8,
                nullable: true,
            }
        );

        let arr = PropertyType::array(PropertyType::primitive(TypeKind::Int8))
            .with_storage(StorageKind::Fixed)
            .immutable();
        assert_eq!(arr.storage(), StorageKind::Sparse);
        assert!(arr.is_immutable());
    }
}
