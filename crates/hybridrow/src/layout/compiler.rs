// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema -> Layout compilation.
//!
//! Columns are partitioned by storage kind. Fixed columns get contiguous
//! byte offsets in declaration order, nullable fixed columns and every
//! variable column get a presence bit, variable columns get sequential
//! slots in the end-offset table, and everything else is sparse. Object
//! properties are flattened into sparse columns with dotted paths.

use super::{Layout, LayoutBit, LayoutColumn, LayoutType, TypeArgument, TypeArgumentList};
use crate::error::SchemaError;
use crate::schema::{Namespace, Property, PropertyType, Schema, StorageKind, TypeKind};
use std::collections::HashMap;

/// Compiles schemas into layouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutCompiler;

impl LayoutCompiler {
    /// Compile `schema`, resolving UDT references through `namespace`.
    pub fn compile(namespace: &Namespace, schema: &Schema) -> Result<Layout, SchemaError> {
        let mut fixed = Vec::new();
        let mut variable = Vec::new();
        let mut sparse = Vec::new();

        for property in &schema.properties {
            let ty = &property.property_type;
            let arg = column_type(namespace, &property.path, ty)?;
            match ty.storage() {
                StorageKind::Fixed => {
                    let size = fixed_width(&property.path, ty, arg.layout_type())?;
                    fixed.push((property, arg, size));
                }
                StorageKind::Variable => {
                    if !arg.layout_type().is_variable() {
                        return Err(unsupported(&property.path, ty));
                    }
                    variable.push((property, arg));
                }
                StorageKind::Sparse => sparse.push((property, arg)),
            }
        }

        let mut columns = Vec::with_capacity(schema.properties.len());
        let mut next_bit = 0usize;
        let mut bits = Vec::new();
        for (property, _, _) in &fixed {
            bits.push(property.property_type.nullable().then(|| alloc(&mut next_bit)));
        }
        for _ in &variable {
            bits.push(Some(alloc(&mut next_bit)));
        }
        let num_bitmask_bytes = next_bit.div_ceil(8);

        let mut offset = num_bitmask_bytes;
        let mut bits = bits.into_iter();
        for (property, arg, size) in &fixed {
            let index = columns.len();
            columns.push(LayoutColumn {
                path: property.path.clone(),
                layout_type: arg.layout_type(),
                type_args: arg.type_args().clone(),
                storage: StorageKind::Fixed,
                offset,
                size: *size,
                null_bit: bits.next().flatten(),
                parent: None,
                index,
            });
            offset += size;
        }
        let fixed_size = offset - num_bitmask_bytes;

        for (slot, (property, arg)) in variable.iter().enumerate() {
            let index = columns.len();
            columns.push(LayoutColumn {
                path: property.path.clone(),
                layout_type: arg.layout_type(),
                type_args: arg.type_args().clone(),
                storage: StorageKind::Variable,
                offset: slot,
                size: 0,
                null_bit: bits.next().flatten(),
                parent: None,
                index,
            });
        }

        for (property, arg) in sparse {
            push_sparse(namespace, &mut columns, None, property.path.clone(), property, arg)?;
        }

        let mut path_index = HashMap::with_capacity(columns.len());
        for column in &columns {
            if path_index.insert(column.path.clone(), column.index).is_some() {
                return Err(SchemaError::DuplicatePath(column.path.clone()));
            }
        }

        let layout = Layout {
            name: schema.name.clone(),
            schema_id: schema.id,
            num_fixed: fixed.len(),
            num_variable: variable.len(),
            columns,
            path_index,
            num_bitmask_bytes,
            fixed_size,
            disallow_unschematized: schema.options.disallow_unschematized,
        };
        log::debug!(
            "[layout] compiled '{}' (id {}): {} fixed, {} variable, {} sparse, region {} bytes",
            layout.name,
            layout.schema_id,
            layout.num_fixed,
            layout.num_variable,
            layout.columns.len() - layout.num_fixed - layout.num_variable,
            layout.size()
        );
        Ok(layout)
    }
}

fn alloc(next: &mut usize) -> LayoutBit {
    let bit = LayoutBit::new(*next);
    *next += 1;
    bit
}

fn unsupported(path: &str, ty: &PropertyType) -> SchemaError {
    SchemaError::UnsupportedStorage {
        path: path.to_string(),
        storage: ty.storage(),
        kind: ty.type_kind(),
    }
}

fn fixed_width(path: &str, ty: &PropertyType, layout_type: LayoutType) -> Result<usize, SchemaError> {
    if let Some(size) = layout_type.fixed_size() {
        return Ok(size);
    }
    match (layout_type, ty) {
        (LayoutType::Utf8 | LayoutType::Binary, PropertyType::Primitive { length, .. }) => {
            if *length == 0 {
                Err(SchemaError::InvalidLength {
                    path: path.to_string(),
                    length: *length,
                })
            } else {
                Ok(*length as usize)
            }
        }
        _ => Err(unsupported(path, ty)),
    }
}

fn push_sparse(
    namespace: &Namespace,
    columns: &mut Vec<LayoutColumn>,
    parent: Option<usize>,
    path: String,
    property: &Property,
    arg: TypeArgument,
) -> Result<(), SchemaError> {
    let index = columns.len();
    columns.push(LayoutColumn {
        path: path.clone(),
        layout_type: arg.layout_type(),
        type_args: arg.type_args().clone(),
        storage: StorageKind::Sparse,
        offset: 0,
        size: 0,
        null_bit: None,
        parent,
        index,
    });

    if let PropertyType::Object { properties, .. } = &property.property_type {
        for child in properties {
            let child_path = format!("{}.{}", path, child.path);
            if child.property_type.storage() != StorageKind::Sparse {
                return Err(unsupported(&child_path, &child.property_type));
            }
            let child_arg = column_type(namespace, &child_path, &child.property_type)?;
            push_sparse(namespace, columns, Some(index), child_path, child, child_arg)?;
        }
    }
    Ok(())
}

/// Layout type of a column. Column-level nullability is presence, not a wrapper.
fn column_type(
    namespace: &Namespace,
    path: &str,
    ty: &PropertyType,
) -> Result<TypeArgument, SchemaError> {
    Ok(match ty {
        PropertyType::Primitive { kind, .. } => {
            TypeArgument::from(primitive_type(*kind).ok_or_else(|| unsupported(path, ty))?)
        }
        PropertyType::Array {
            items, immutable, ..
        } => TypeArgument::new(
            LayoutType::TypedArray {
                immutable: *immutable,
            },
            TypeArgumentList::new(vec![element_type(namespace, path, items)?]),
        ),
        PropertyType::Set {
            items, immutable, ..
        } => TypeArgument::new(
            LayoutType::TypedSet {
                immutable: *immutable,
            },
            TypeArgumentList::new(vec![element_type(namespace, path, items)?]),
        ),
        PropertyType::Map {
            keys,
            values,
            immutable,
            ..
        } => TypeArgument::new(
            LayoutType::TypedMap {
                immutable: *immutable,
            },
            TypeArgumentList::new(vec![
                element_type(namespace, path, keys)?,
                element_type(namespace, path, values)?,
            ]),
        ),
        PropertyType::Tuple {
            items, immutable, ..
        } => {
            if items.len() < 2 {
                return Err(SchemaError::InvalidArity {
                    kind: "tuple",
                    expected: "at least 2",
                    found: items.len(),
                });
            }
            let args = items
                .iter()
                .map(|item| element_type(namespace, path, item))
                .collect::<Result<Vec<_>, _>>()?;
            TypeArgument::new(
                LayoutType::TypedTuple {
                    immutable: *immutable,
                },
                TypeArgumentList::new(args),
            )
        }
        PropertyType::Tagged {
            items, immutable, ..
        } => {
            let layout_type = match items.len() {
                1 => LayoutType::Tagged {
                    immutable: *immutable,
                },
                2 => LayoutType::Tagged2 {
                    immutable: *immutable,
                },
                found => {
                    return Err(SchemaError::InvalidArity {
                        kind: "tagged",
                        expected: "1 or 2",
                        found,
                    })
                }
            };
            let mut args = vec![TypeArgument::from(LayoutType::UInt8)];
            for item in items {
                args.push(element_type(namespace, path, item)?);
            }
            TypeArgument::new(layout_type, TypeArgumentList::new(args))
        }
        PropertyType::Object { immutable, .. } => TypeArgument::from(LayoutType::Object {
            immutable: *immutable,
        }),
        PropertyType::Udt {
            schema_id,
            immutable,
            ..
        } => {
            if namespace.find_by_id(*schema_id).is_none() {
                return Err(SchemaError::UnresolvedSchema(*schema_id));
            }
            TypeArgument::new(
                LayoutType::Udt {
                    immutable: *immutable,
                },
                TypeArgumentList::from_schema_id(*schema_id),
            )
        }
    })
}

/// Layout type of a scope element; nullable elements are wrapped in a nullable scope.
fn element_type(
    namespace: &Namespace,
    path: &str,
    ty: &PropertyType,
) -> Result<TypeArgument, SchemaError> {
    if matches!(ty, PropertyType::Object { .. }) {
        return Err(unsupported(path, ty));
    }
    let arg = column_type(namespace, path, ty)?;
    Ok(if ty.nullable() {
        TypeArgument::nullable(arg)
    } else {
        arg
    })
}

fn primitive_type(kind: TypeKind) -> Option<LayoutType> {
    Some(match kind {
        TypeKind::Null => LayoutType::Null,
        TypeKind::Boolean => LayoutType::Boolean,
        TypeKind::Int8 => LayoutType::Int8,
        TypeKind::Int16 => LayoutType::Int16,
        TypeKind::Int32 => LayoutType::Int32,
        TypeKind::Int64 => LayoutType::Int64,
        TypeKind::UInt8 => LayoutType::UInt8,
        TypeKind::UInt16 => LayoutType::UInt16,
        TypeKind::UInt32 => LayoutType::UInt32,
        TypeKind::UInt64 => LayoutType::UInt64,
        TypeKind::VarInt => LayoutType::VarInt,
        TypeKind::VarUInt => LayoutType::VarUInt,
        TypeKind::Float32 => LayoutType::Float32,
        TypeKind::Float64 => LayoutType::Float64,
        TypeKind::Float128 => LayoutType::Float128,
        TypeKind::Decimal => LayoutType::Decimal,
        TypeKind::DateTime => LayoutType::DateTime,
        TypeKind::UnixDateTime => LayoutType::UnixDateTime,
        TypeKind::Guid => LayoutType::Guid,
        TypeKind::MongoDbObjectId => LayoutType::MongoDbObjectId,
        TypeKind::Utf8 => LayoutType::Utf8,
        TypeKind::Binary => LayoutType::Binary,
        TypeKind::Object
        | TypeKind::Array
        | TypeKind::Set
        | TypeKind::Map
        | TypeKind::Tuple
        | TypeKind::Tagged
        | TypeKind::Schema => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaBuilder, SchemaId};

    fn namespace_with(schemas: Vec<Schema>) -> Namespace {
        let mut ns = Namespace::new("test");
        for schema in schemas {
            ns.add(schema).expect("add schema");
        }
        ns
    }

    #[test]
    fn test_fixed_offsets_and_bits() {
        let schema = SchemaBuilder::new("Row", SchemaId::new(1))
            .property(
                "a",
                PropertyType::primitive(TypeKind::Int32).with_storage(StorageKind::Fixed),
            )
            .property("tail", PropertyType::primitive(TypeKind::Utf8))
            .property(
                "b",
                PropertyType::primitive(TypeKind::Int64)
                    .with_storage(StorageKind::Fixed)
                    .optional(),
            )
            .property(
                "name",
                PropertyType::primitive(TypeKind::Utf8).with_storage(StorageKind::Variable),
            )
            .property(
                "code",
                PropertyType::primitive(TypeKind::Binary)
                    .with_storage(StorageKind::Fixed)
                    .with_length(3),
            )
            .build();
        let ns = namespace_with(vec![schema.clone()]);
        let layout = LayoutCompiler::compile(&ns, &schema).expect("compile");

        // bits: b (fixed nullable), name (variable)
        assert_eq!(layout.num_bitmask_bytes(), 1);
        assert_eq!(layout.num_fixed(), 3);
        assert_eq!(layout.num_variable(), 1);

        let a = layout.find("a");
        let b = layout.find("b");
        let code = layout.find("code");
        assert_eq!((a.offset(), a.size(), a.null_bit()), (1, 4, None));
        assert_eq!((b.offset(), b.size()), (5, 8));
        assert_eq!(b.null_bit(), Some(LayoutBit::new(0)));
        assert_eq!((code.offset(), code.size()), (13, 3));
        assert_eq!(layout.fixed_size(), 15);

        let name = layout.find("name");
        assert_eq!(name.offset(), 0);
        assert_eq!(name.null_bit(), Some(LayoutBit::new(1)));
        assert_eq!(layout.size(), 1 + 15 + 4);
        assert_eq!(layout.find("tail").storage(), StorageKind::Sparse);
    }

    #[test]
    fn test_unresolved_udt_fails() {
        let schema = SchemaBuilder::new("Row", SchemaId::new(1))
            .property("x", PropertyType::udt("Missing", SchemaId::new(99)))
            .build();
        let ns = namespace_with(vec![schema.clone()]);
        assert_eq!(
            LayoutCompiler::compile(&ns, &schema),
            Err(SchemaError::UnresolvedSchema(SchemaId::new(99)))
        );
    }

    #[test]
    fn test_self_reference_compiles() {
        let node = SchemaBuilder::new("Node", SchemaId::new(4))
            .property("next", PropertyType::udt("Node", SchemaId::new(4)))
            .build();
        let ns = namespace_with(vec![node.clone()]);
        let layout = LayoutCompiler::compile(&ns, &node).expect("compile");
        assert_eq!(
            layout.find("next").type_args().schema_id(),
            Some(SchemaId::new(4))
        );
    }

    #[test]
    fn test_arity_and_storage_validation() {
        let bad_tuple = SchemaBuilder::new("T", SchemaId::new(1))
            .property(
                "t",
                PropertyType::tuple(vec![PropertyType::primitive(TypeKind::Int8)]),
            )
            .build();
        let ns = namespace_with(vec![bad_tuple.clone()]);
        assert!(matches!(
            LayoutCompiler::compile(&ns, &bad_tuple),
            Err(SchemaError::InvalidArity { kind: "tuple", .. })
        ));

        let bad_storage = SchemaBuilder::new("S", SchemaId::new(2))
            .property(
                "v",
                PropertyType::primitive(TypeKind::Float64).with_storage(StorageKind::Variable),
            )
            .build();
        assert!(matches!(
            LayoutCompiler::compile(&ns, &bad_storage),
            Err(SchemaError::UnsupportedStorage { .. })
        ));

        let no_length = SchemaBuilder::new("L", SchemaId::new(3))
            .property(
                "s",
                PropertyType::primitive(TypeKind::Utf8).with_storage(StorageKind::Fixed),
            )
            .build();
        assert!(matches!(
            LayoutCompiler::compile(&ns, &no_length),
            Err(SchemaError::InvalidLength { length: 0, .. })
        ));
    }

    #[test]
    fn test_object_properties_flatten() {
        let schema = SchemaBuilder::new("Row", SchemaId::new(1))
            .property(
                "addr",
                PropertyType::object(vec![
                    Property::new("city", PropertyType::primitive(TypeKind::Utf8)),
                    Property::new(
                        "geo",
                        PropertyType::object(vec![Property::new(
                            "lat",
                            PropertyType::primitive(TypeKind::Float64),
                        )]),
                    ),
                ]),
            )
            .property(
                "scores",
                PropertyType::array(PropertyType::primitive(TypeKind::Int32).optional()),
            )
            .build();
        let ns = namespace_with(vec![schema.clone()]);
        let layout = LayoutCompiler::compile(&ns, &schema).expect("compile");

        let addr = layout.find("addr").index();
        assert_eq!(layout.find("addr.city").parent(), Some(addr));
        let geo = layout.find("addr.geo");
        assert_eq!(layout.find("addr.geo.lat").parent(), Some(geo.index()));
        assert_eq!(layout.find("addr.geo.lat").name(), "lat");

        let scores = layout.find("scores");
        assert_eq!(
            scores.type_argument(),
            TypeArgument::array(TypeArgument::nullable(LayoutType::Int32.into()))
        );
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let schema = SchemaBuilder::new("Row", SchemaId::new(1))
            .property("x", PropertyType::primitive(TypeKind::Int8))
            .property("x", PropertyType::primitive(TypeKind::Int16))
            .build();
        let ns = namespace_with(vec![schema.clone()]);
        assert_eq!(
            LayoutCompiler::compile(&ns, &schema),
            Err(SchemaError::DuplicatePath("x".to_string()))
        );
    }

    #[test]
    #[should_panic(expected = "not declared")]
    fn test_find_undeclared_panics() {
        let schema = SchemaBuilder::new("Row", SchemaId::new(1)).build();
        let ns = namespace_with(vec![schema.clone()]);
        let layout = LayoutCompiler::compile(&ns, &schema).expect("compile");
        let _ = layout.find("nope");
    }
}
