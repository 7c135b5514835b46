// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use hybridrow::layout::{LayoutResolver, NamespaceResolver};
use hybridrow::schema::{SchemaBuilder, StorageKind, TypeKind};
use hybridrow::{
    HybridRowVersion, Namespace, PropertyType, RowBuffer, RowReader, RowResult, SchemaId,
};
use libfuzzer_sys::fuzz_target;
use std::sync::{Arc, OnceLock};

const MAX_DEPTH: usize = 16;

fn resolver() -> Arc<dyn LayoutResolver> {
    static RESOLVER: OnceLock<Arc<dyn LayoutResolver>> = OnceLock::new();
    Arc::clone(RESOLVER.get_or_init(|| {
        let inner = SchemaBuilder::new("Inner", SchemaId::new(2))
            .property(
                "n",
                PropertyType::primitive(TypeKind::Int32)
                    .with_storage(StorageKind::Fixed)
                    .optional(),
            )
            .property(
                "s",
                PropertyType::primitive(TypeKind::Utf8).with_storage(StorageKind::Variable),
            )
            .build();
        let outer = SchemaBuilder::new("Outer", SchemaId::new(1))
            .property(
                "id",
                PropertyType::primitive(TypeKind::Int64).with_storage(StorageKind::Fixed),
            )
            .property(
                "name",
                PropertyType::primitive(TypeKind::Utf8).with_storage(StorageKind::Variable),
            )
            .property("inner", PropertyType::udt("Inner", SchemaId::new(2)))
            .property(
                "list",
                PropertyType::map(
                    PropertyType::primitive(TypeKind::Utf8),
                    PropertyType::array(PropertyType::primitive(TypeKind::VarInt).optional()),
                ),
            )
            .build();
        let mut ns = Namespace::new("fuzz");
        let _ = ns.add(inner);
        let _ = ns.add(outer);
        Arc::new(NamespaceResolver::new(Arc::new(ns)))
    }))
}

/// Visit every field, descending into scopes up to `MAX_DEPTH`.
fn walk(reader: &mut RowReader<'_>, depth: usize) -> RowResult<()> {
    while reader.read()? {
        let is_scope = reader.layout_type().is_some_and(|ty| ty.is_scope());
        if !is_scope {
            let _ = reader.read_value()?;
        } else if depth < MAX_DEPTH {
            reader.read_scope(depth + 1, |child, depth| walk(child, depth))?;
        }
    }
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    // Any input either fails to parse or walks cleanly; panics are bugs.
    if let Ok(row) = RowBuffer::from_bytes(data, HybridRowVersion::V1, resolver()) {
        let _ = walk(&mut RowReader::new(&row), 0);
    }
});
