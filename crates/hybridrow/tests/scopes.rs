// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::too_many_lines)] // Test code

//! Nested scopes: structure, arity, ordering, immutability and traversal.

use hybridrow::error::{ResultKind, RowError};
use hybridrow::io::{RowReader, RowWriter};
use hybridrow::layout::{LayoutResolver, LayoutType, NamespaceResolver, TypeArgument};
use hybridrow::row::{Decimal, Float128, HybridRowVersion, RowBuffer, UpdateOptions, Value};
use hybridrow::schema::{Namespace, PropertyType, SchemaBuilder, SchemaId, TypeKind};
use std::sync::Arc;

fn prim(kind: TypeKind) -> PropertyType {
    PropertyType::primitive(kind)
}

fn arg(ty: LayoutType) -> TypeArgument {
    TypeArgument::from(ty)
}

/// Row of a one-schema namespace.
fn row_with(builder: SchemaBuilder) -> RowBuffer {
    let schema = builder.build();
    let id = schema.id;
    let mut ns = Namespace::new("scopes");
    ns.add(schema).expect("add");
    let resolver: Arc<dyn LayoutResolver> = Arc::new(NamespaceResolver::new(Arc::new(ns)));
    let layout = resolver.resolve(id).expect("resolve");
    RowBuffer::with_layout(HybridRowVersion::V1, layout, resolver)
}

fn schema(props: Vec<(&str, PropertyType)>) -> SchemaBuilder {
    let mut builder = SchemaBuilder::new("Scopes", SchemaId::new(1));
    for (path, ty) in props {
        builder = builder.property(path, ty);
    }
    builder
}

/// Values of the primitive elements of the top-level scope at `path`.
fn elements(row: &RowBuffer, path: &str) -> Vec<Value> {
    let mut reader = RowReader::new(row);
    while reader.read().expect("read") {
        if reader.path() == Some(path) {
            return reader
                .read_scope((), |scope, ()| {
                    let mut out = Vec::new();
                    while scope.read()? {
                        out.push(scope.read_value()?);
                    }
                    Ok(out)
                })
                .expect("scope");
        }
    }
    panic!("no scope at '{}'", path);
}

fn write_i32_array(writer: &mut RowWriter<'_>, path: &str, scope: &TypeArgument, values: &[i32]) {
    writer
        .write_scope(Some(path), scope, values, |w, values| {
            for v in values {
                w.write_i32(None, *v)?;
            }
            Ok(())
        })
        .expect("array");
}

#[test]
fn test_nested_array_of_arrays() {
    let mut row = row_with(schema(vec![(
        "m",
        PropertyType::array(PropertyType::array(prim(TypeKind::Float32))),
    )]));
    let inner = TypeArgument::array(arg(LayoutType::Float32));
    let outer = TypeArgument::array(inner.clone());

    RowWriter::new(&mut row)
        .write_scope(Some("m"), &outer, (), |w, ()| {
            for _ in 0..2 {
                w.write_scope(None, &inner, (), |w, ()| {
                    for v in [1.0f32, 2.0, 3.0] {
                        w.write_f32(None, v)?;
                    }
                    Ok(())
                })?;
            }
            Ok(())
        })
        .expect("matrix");

    let mut reader = RowReader::new(&row);
    assert!(reader.read().expect("read"));
    let matrix = reader
        .read_scope((), |rows, ()| {
            let mut matrix = Vec::new();
            while rows.read()? {
                matrix.push(rows.read_scope((), |cols, ()| {
                    let mut line = Vec::new();
                    while cols.read()? {
                        line.push(cols.read_f32()?);
                    }
                    Ok(line)
                })?);
            }
            Ok(matrix)
        })
        .expect("read matrix");
    assert_eq!(matrix, vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]]);
}

#[test]
fn test_tuple_arity_checked_on_close() {
    let mut row = row_with(schema(vec![(
        "t",
        PropertyType::tuple(vec![prim(TypeKind::VarInt), prim(TypeKind::Int64)]),
    )]));
    let tuple = TypeArgument::typed_tuple(vec![arg(LayoutType::VarInt), arg(LayoutType::Int64)]);
    let mut writer = RowWriter::new(&mut row);

    let err = writer
        .write_scope(Some("t"), &tuple, (), |w, ()| w.write_varint(None, 5))
        .unwrap_err();
    assert_eq!(err.kind(), ResultKind::SchemaMismatch);

    let err = writer
        .write_scope(Some("t"), &tuple, (), |w, ()| {
            w.write_varint(None, 5)?;
            w.write_i64(None, 6)?;
            w.write_i64(None, 7)
        })
        .unwrap_err();
    assert_eq!(err.kind(), ResultKind::SchemaMismatch);

    writer
        .write_scope(Some("t"), &tuple, (), |w, ()| {
            w.write_varint(None, 5)?;
            w.write_i64(None, 6)
        })
        .expect("complete tuple");
    assert_eq!(elements(&row, "t"), vec![Value::VarInt(5), Value::Int64(6)]);
}

#[test]
fn test_tuple_element_type_checked_on_write() {
    let mut row = row_with(schema(vec![(
        "t",
        PropertyType::tuple(vec![prim(TypeKind::VarInt), prim(TypeKind::Int64)]),
    )]));
    let tuple = TypeArgument::typed_tuple(vec![arg(LayoutType::VarInt), arg(LayoutType::Int64)]);
    let err = RowWriter::new(&mut row)
        .write_scope(Some("t"), &tuple, (), |w, ()| w.write_i64(None, 1))
        .unwrap_err();
    assert_eq!(err.kind(), ResultKind::TypeMismatch);
}

#[test]
fn test_map_entry_with_only_a_key() {
    let mut row = row_with(schema(vec![(
        "m",
        PropertyType::map(prim(TypeKind::Utf8), prim(TypeKind::Int32)),
    )]));
    let map = TypeArgument::map(arg(LayoutType::Utf8), arg(LayoutType::Int32));
    let entry = TypeArgument::typed_tuple(vec![arg(LayoutType::Utf8), arg(LayoutType::Int32)]);

    let err = RowWriter::new(&mut row)
        .write_scope(Some("m"), &map, (), |w, ()| {
            w.write_scope(None, &entry, (), |e, ()| e.write_str(None, "lonely"))
        })
        .unwrap_err();
    assert_eq!(err.kind(), ResultKind::SchemaMismatch);
}

fn write_map(row: &mut RowBuffer, pairs: &[(&str, i32)]) -> Result<(), RowError> {
    let map = TypeArgument::map(arg(LayoutType::Utf8), arg(LayoutType::Int32));
    let entry = TypeArgument::typed_tuple(vec![arg(LayoutType::Utf8), arg(LayoutType::Int32)]);
    RowWriter::new(row).write_scope(Some("m"), &map, pairs, |w, pairs| {
        for (k, v) in pairs {
            w.write_scope(None, &entry, (), |e, ()| {
                e.write_str(None, k)?;
                e.write_i32(None, *v)
            })?;
        }
        Ok(())
    })
}

#[test]
fn test_map_sorted_by_key_on_close() {
    let mut row = row_with(schema(vec![(
        "m",
        PropertyType::map(prim(TypeKind::Utf8), prim(TypeKind::Int32)),
    )]));
    write_map(&mut row, &[("pear", 3), ("apple", 1), ("fig", 2)]).expect("map");

    let mut reader = RowReader::new(&row);
    assert!(reader.read().expect("read"));
    let pairs = reader
        .read_scope((), |map, ()| {
            let mut pairs = Vec::new();
            while map.read()? {
                pairs.push(map.read_scope((), |e, ()| {
                    e.read()?;
                    let k = e.read_str()?;
                    e.read()?;
                    Ok((k, e.read_i32()?))
                })?);
            }
            Ok(pairs)
        })
        .expect("pairs");
    assert_eq!(
        pairs,
        vec![
            ("apple".to_string(), 1),
            ("fig".to_string(), 2),
            ("pear".to_string(), 3)
        ]
    );
}

#[test]
fn test_map_duplicate_key_rejected() {
    let mut row = row_with(schema(vec![(
        "m",
        PropertyType::map(prim(TypeKind::Utf8), prim(TypeKind::Int32)),
    )]));
    let err = write_map(&mut row, &[("a", 1), ("a", 2)]).unwrap_err();
    assert_eq!(err.kind(), ResultKind::InvalidOperation);
}

#[test]
fn test_set_sorted_and_unique() {
    let mut row = row_with(schema(vec![
        ("s", PropertyType::set(prim(TypeKind::Int32))),
        ("d", PropertyType::set(prim(TypeKind::Int32))),
    ]));
    let set = TypeArgument::set(arg(LayoutType::Int32));
    let mut writer = RowWriter::new(&mut row);
    write_i32_array(&mut writer, "s", &set, &[30, -5, 12, 0]);

    let err = writer
        .write_scope(Some("d"), &set, (), |w, ()| {
            w.write_i32(None, 4)?;
            w.write_i32(None, 4)
        })
        .unwrap_err();
    assert_eq!(err, RowError::InvalidOperation("duplicate key in unique scope"));

    assert_eq!(
        elements(&row, "s"),
        vec![
            Value::Int32(-5),
            Value::Int32(0),
            Value::Int32(12),
            Value::Int32(30)
        ]
    );
}

#[test]
fn test_immutable_scope_rejects_later_writes() {
    let mut row = row_with(schema(vec![(
        "frozen",
        PropertyType::array(prim(TypeKind::Int32)).immutable(),
    )]));
    let scope = TypeArgument::array(arg(LayoutType::Int32)).immutable();
    write_i32_array(&mut RowWriter::new(&mut row), "frozen", &scope, &[1, 2]);

    let mut root = row.cursor();
    assert!(root.find(&row, "frozen").expect("find"));
    let child = row.read_scope(&root).expect("open");
    assert!(child.immutable());

    let mut writer = RowWriter::at(&mut row, child.clone());
    assert_eq!(
        writer.write_i32(None, 3),
        Err(RowError::InvalidOperation("scope is immutable"))
    );
    assert!(writer.move_next().expect("move"));
    assert_eq!(writer.delete(None).unwrap_err().kind(), ResultKind::InvalidOperation);
    assert_eq!(elements(&row, "frozen"), vec![Value::Int32(1), Value::Int32(2)]);
}

#[test]
fn test_nullable_elements() {
    let mut row = row_with(schema(vec![(
        "opt",
        PropertyType::array(prim(TypeKind::Int32).optional()),
    )]));
    let item = arg(LayoutType::Int32);
    let scope = TypeArgument::array(TypeArgument::nullable(item.clone()));
    RowWriter::new(&mut row)
        .write_scope(Some("opt"), &scope, (), |w, ()| {
            w.write_nullable(None, &item, Some(&Value::Int32(5)))?;
            w.write_nullable(None, &item, None)
        })
        .expect("nullable array");

    let mut reader = RowReader::new(&row);
    assert!(reader.read().expect("read"));
    let seen = reader
        .read_scope((), |array, ()| {
            let mut seen = Vec::new();
            while array.read()? {
                seen.push(array.read_scope((), |nullable, ()| {
                    if !nullable.has_value()? {
                        assert!(!nullable.read()?);
                        return Ok(None);
                    }
                    assert!(nullable.read()?);
                    nullable.read_i32().map(Some)
                })?);
            }
            Ok(seen)
        })
        .expect("read");
    assert_eq!(seen, vec![Some(5), None]);
}

#[test]
fn test_nullable_holds_one_value() {
    let mut row = row_with(schema(vec![]));
    let scope = TypeArgument::nullable(arg(LayoutType::Int32));
    let err = RowWriter::new(&mut row)
        .write_scope(Some("n"), &scope, (), |w, ()| {
            w.write_i32(None, 1)?;
            w.write_i32(None, 2)
        })
        .unwrap_err();
    assert_eq!(err.kind(), ResultKind::InvalidOperation);
}

#[test]
fn test_tagged_union() {
    let mut row = row_with(schema(vec![(
        "tg",
        PropertyType::tagged(vec![prim(TypeKind::Utf8)]),
    )]));
    let tagged = TypeArgument::tagged(arg(LayoutType::Utf8));
    RowWriter::new(&mut row)
        .write_scope(Some("tg"), &tagged, (), |w, ()| {
            w.write_u8(None, 7)?;
            w.write_str(None, "seven")
        })
        .expect("tagged");
    assert_eq!(elements(&row, "tg"), vec![Value::UInt8(7), Value::from("seven")]);
}

#[test]
fn test_untyped_tuple_elements_are_tagged() {
    let mut row = row_with(schema(vec![]));
    RowWriter::new(&mut row)
        .write_scope(Some("mixed"), &TypeArgument::tuple(vec![]), (), |w, ()| {
            w.write_bool(None, false)?;
            w.write_str(None, "x")?;
            w.write_null(None)
        })
        .expect("tuple");
    assert_eq!(
        elements(&row, "mixed"),
        vec![Value::Bool(false), Value::from("x"), Value::Null]
    );
}

#[test]
fn test_skip_scope_only_while_parent_is_on_it() {
    let mut row = row_with(schema(vec![
        ("arr", PropertyType::array(prim(TypeKind::Int32))),
        ("after", prim(TypeKind::Int32)),
    ]));
    let mut writer = RowWriter::new(&mut row);
    write_i32_array(&mut writer, "arr", &TypeArgument::array(arg(LayoutType::Int32)), &[1, 2, 3]);
    writer.write_i32(Some("after"), 9).expect("after");

    let mut reader = RowReader::new(&row);
    assert!(reader.read().expect("read"));
    let mut child = reader.open_scope().expect("open");
    assert!(child.read().expect("first element"));
    reader.skip_scope(&mut child).expect("skip");
    assert!(!child.read().expect("child at end"));
    assert!(reader.read().expect("read"));
    assert_eq!(reader.path(), Some("after"));

    let mut reader = RowReader::new(&row);
    assert!(reader.read().expect("read"));
    let mut child = reader.open_scope().expect("open");
    assert!(reader.read().expect("parent moves on"));
    assert_eq!(
        reader.skip_scope(&mut child),
        Err(RowError::InvalidOperation("parent reader has moved past the scope"))
    );
}

#[test]
fn test_update_options_in_indexed_scope() {
    let mut row = row_with(schema(vec![("arr", PropertyType::array(prim(TypeKind::Int32)))]));
    let scope = TypeArgument::array(arg(LayoutType::Int32));
    write_i32_array(&mut RowWriter::new(&mut row), "arr", &scope, &[1, 3]);

    let mut root = row.cursor();
    assert!(root.find(&row, "arr").expect("find"));
    let child = row.read_scope(&root).expect("open");
    let mut writer = RowWriter::at(&mut row, child);

    assert!(writer.move_next().expect("1"));
    assert!(writer.move_next().expect("3"));
    writer
        .write_with(None, &Value::Int32(2), UpdateOptions::InsertAt)
        .expect("insert before 3");
    assert_eq!(writer.cursor().index(), 2);
    assert_eq!(
        writer.write_with(None, &Value::Int32(4), UpdateOptions::Insert),
        Err(RowError::Exists)
    );

    writer.reset();
    assert!(writer.move_next().expect("1"));
    writer.write_i32(None, 10).expect("replace");
    assert_eq!(
        elements(&row, "arr"),
        vec![Value::Int32(10), Value::Int32(2), Value::Int32(3)]
    );

    let child = {
        let mut root = row.cursor();
        assert!(root.find(&row, "arr").expect("find"));
        row.read_scope(&root).expect("open")
    };
    let mut writer = RowWriter::at(&mut row, child);
    while writer.move_next().expect("walk") {}
    assert_eq!(
        writer.write_with(None, &Value::Int32(4), UpdateOptions::Update),
        Err(RowError::NotFound)
    );
}

#[test]
fn test_delete_scope_from_parent() {
    let mut row = row_with(schema(vec![
        ("arr", PropertyType::array(prim(TypeKind::Int32))),
        ("after", prim(TypeKind::Int32)),
    ]));
    let empty = row.len();
    let mut writer = RowWriter::new(&mut row);
    write_i32_array(&mut writer, "arr", &TypeArgument::array(arg(LayoutType::Int32)), &[1, 2, 3]);
    writer.delete(Some("arr")).expect("delete scope");
    assert_eq!(writer.delete(Some("arr")), Err(RowError::NotFound));
    writer.write_i32(Some("after"), 1).expect("after");
    writer.delete(Some("after")).expect("delete item");
    assert_eq!(row.len(), empty);
}

#[test]
fn test_untyped_tuple_with_declared_arguments() {
    let mut row = row_with(schema(vec![]));
    let pair = TypeArgument::tuple(vec![arg(LayoutType::VarInt), arg(LayoutType::Int64)]);
    let mut writer = RowWriter::new(&mut row);

    let err = writer
        .write_scope(Some("pair"), &pair, (), |w, ()| w.write_varint(None, 1))
        .unwrap_err();
    assert_eq!(err.kind(), ResultKind::SchemaMismatch);

    let err = writer
        .write_scope(Some("pair"), &pair, (), |w, ()| w.write_str(None, "one"))
        .unwrap_err();
    assert_eq!(err.kind(), ResultKind::TypeMismatch);

    let err = writer
        .write_scope(Some("pair"), &pair, (), |w, ()| {
            w.write_varint(None, 1)?;
            w.write_i64(None, 2)?;
            w.write_null(None)
        })
        .unwrap_err();
    assert_eq!(err.kind(), ResultKind::SchemaMismatch);

    writer
        .write_scope(Some("pair"), &pair, (), |w, ()| {
            w.write_varint(None, 1)?;
            w.write_i64(None, 2)
        })
        .expect("declared pair");
    assert_eq!(elements(&row, "pair"), vec![Value::VarInt(1), Value::Int64(2)]);
}

fn write_scope_keyed_map(row: &mut RowBuffer, pairs: &[(i32, i32)]) -> Result<(), RowError> {
    let key = TypeArgument::array(arg(LayoutType::Int32));
    let map = TypeArgument::map(key.clone(), arg(LayoutType::Int32));
    let entry = TypeArgument::typed_tuple(vec![key.clone(), arg(LayoutType::Int32)]);
    RowWriter::new(row).write_scope(Some("m"), &map, pairs, |w, pairs| {
        for (k, v) in pairs {
            w.write_scope(None, &entry, (), |e, ()| {
                e.write_scope(None, &key, (), |a, ()| a.write_i32(None, *k))?;
                e.write_i32(None, *v)
            })?;
        }
        Ok(())
    })
}

#[test]
fn test_map_with_scope_keys_compares_keys_only() {
    let mut row = row_with(schema(vec![]));
    let err = write_scope_keyed_map(&mut row, &[(7, 1), (7, 2)]).unwrap_err();
    assert_eq!(err, RowError::InvalidOperation("duplicate key in unique scope"));

    let mut row = row_with(schema(vec![]));
    write_scope_keyed_map(&mut row, &[(7, 1), (3, 2)]).expect("distinct keys");
    let mut reader = RowReader::new(&row);
    assert!(reader.read().expect("read"));
    let values = reader
        .read_scope((), |map, ()| {
            let mut values = Vec::new();
            while map.read()? {
                values.push(map.read_scope((), |e, ()| {
                    e.read()?;
                    e.read()?;
                    e.read_i32()
                })?);
            }
            Ok(values)
        })
        .expect("entries");
    assert_eq!(values, vec![2, 1], "entry keyed [3] sorts first");
}

#[test]
fn test_set_of_decimals_orders_numerically() {
    let mut row = row_with(schema(vec![]));
    let set = TypeArgument::set(arg(LayoutType::Decimal));
    let mut writer = RowWriter::new(&mut row);

    let err = writer
        .write_scope(Some("dup"), &set, (), |w, ()| {
            w.write_decimal(None, Decimal::new(10, 1))?;
            w.write_decimal(None, Decimal::new(2, 0))?;
            w.write_decimal(None, Decimal::new(1, 0))
        })
        .unwrap_err();
    assert_eq!(err.kind(), ResultKind::InvalidOperation);

    writer
        .write_scope(Some("d"), &set, (), |w, ()| {
            w.write_decimal(None, Decimal::new(2, 0))?;
            w.write_decimal(None, Decimal::new(15, 1))?;
            w.write_decimal(None, Decimal::new(-5, 1))
        })
        .expect("decimals");
    assert_eq!(
        elements(&row, "d"),
        vec![
            Value::Decimal(Decimal::new(-5, 1)),
            Value::Decimal(Decimal::new(15, 1)),
            Value::Decimal(Decimal::new(2, 0)),
        ]
    );
}

#[test]
fn test_set_of_floats_orders_negatives_first() {
    let mut row = row_with(schema(vec![]));
    let neg_one = Float128::new(0xBFFF_0000_0000_0000, 0);
    let one = Float128::new(0x3FFF_0000_0000_0000, 0);
    let mut writer = RowWriter::new(&mut row);
    writer
        .write_scope(Some("wide"), &TypeArgument::set(arg(LayoutType::Float128)), (), |w, ()| {
            w.write_float128(None, one)?;
            w.write_float128(None, neg_one)
        })
        .expect("float128 set");
    writer
        .write_scope(Some("f"), &TypeArgument::set(arg(LayoutType::Float64)), (), |w, ()| {
            w.write_f64(None, 0.5)?;
            w.write_f64(None, -3.0)?;
            w.write_f64(None, -1.0)
        })
        .expect("f64 set");

    assert_eq!(
        elements(&row, "wide"),
        vec![Value::Float128(neg_one), Value::Float128(one)]
    );
    assert_eq!(
        elements(&row, "f"),
        vec![Value::Float64(-3.0), Value::Float64(-1.0), Value::Float64(0.5)]
    );
}

#[test]
fn test_duplicate_key_keeps_written_bytes() {
    let mut row = row_with(schema(vec![]));
    let set = TypeArgument::set(arg(LayoutType::Int32));
    let err = RowWriter::new(&mut row)
        .write_scope(Some("d"), &set, (), |w, ()| {
            w.write_i32(None, 9)?;
            w.write_i32(None, 4)?;
            w.write_i32(None, 9)
        })
        .unwrap_err();
    assert_eq!(err.kind(), ResultKind::InvalidOperation);

    // Nothing is rolled back: the scope stays in write order.
    assert_eq!(
        elements(&row, "d"),
        vec![Value::Int32(9), Value::Int32(4), Value::Int32(9)]
    );
}
