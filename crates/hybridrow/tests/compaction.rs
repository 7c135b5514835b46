// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::cast_possible_truncation)] // Test parameters

//! Randomized deletes: every removal compacts the row by exactly the
//! removed item's span and keeps the survivors in order.

use hybridrow::io::{RowReader, RowWriter};
use hybridrow::layout::{LayoutResolver, LayoutType, NamespaceResolver, TypeArgument};
use hybridrow::row::{HybridRowVersion, RowBuffer, RowCursor};
use hybridrow::schema::{Namespace, PropertyType, SchemaBuilder, SchemaId, StorageKind, TypeKind};
use std::sync::Arc;

const SEED: u64 = 0x5eed_1234;

fn row() -> RowBuffer {
    let schema = SchemaBuilder::new("Bag", SchemaId::new(1))
        .property(
            "before",
            PropertyType::primitive(TypeKind::Utf8).with_storage(StorageKind::Variable),
        )
        .property(
            "words",
            PropertyType::array(PropertyType::primitive(TypeKind::Utf8)),
        )
        .build();
    let mut ns = Namespace::new("compaction");
    ns.add(schema).expect("add");
    let resolver: Arc<dyn LayoutResolver> = Arc::new(NamespaceResolver::new(Arc::new(ns)));
    let layout = resolver.resolve(SchemaId::new(1)).expect("resolve");
    RowBuffer::with_layout(HybridRowVersion::V1, layout, resolver)
}

fn words_cursor(row: &RowBuffer) -> RowCursor {
    let mut root = row.cursor();
    assert!(root.find(row, "words").expect("find"));
    row.read_scope(&root).expect("open")
}

fn read_words(row: &RowBuffer) -> Vec<String> {
    let mut reader = RowReader::with_cursor(row, words_cursor(row));
    let mut out = Vec::new();
    while reader.read().expect("read") {
        out.push(reader.read_str().expect("word"));
    }
    out
}

fn random_word(rng: &mut fastrand::Rng) -> String {
    let len = rng.usize(0..40);
    (0..len).map(|_| rng.alphanumeric()).collect()
}

#[test]
fn test_random_deletes_compact_exactly() {
    let mut rng = fastrand::Rng::with_seed(SEED);
    let mut row = row();
    let mut expected: Vec<String> = (0..64).map(|_| random_word(&mut rng)).collect();

    let scope = TypeArgument::array(LayoutType::Utf8.into());
    let mut writer = RowWriter::new(&mut row);
    writer.write_str(Some("before"), "header").expect("before");
    writer
        .write_scope(Some("words"), &scope, &expected, |w, words| {
            for word in words {
                w.write_str(None, word)?;
            }
            Ok(())
        })
        .expect("words");
    assert_eq!(read_words(&row), expected);

    while !expected.is_empty() {
        let victim = rng.usize(0..expected.len());
        let cursor = words_cursor(&row);
        let before = row.len();

        let mut writer = RowWriter::at(&mut row, cursor);
        for _ in 0..=victim {
            assert!(writer.move_next().expect("walk"));
        }
        let (start, end) = writer.cursor().item_span().expect("span");
        writer.delete(None).expect("delete");
        assert_eq!(writer.cursor().index(), victim);

        expected.remove(victim);
        assert_eq!(row.len(), before - (end - start), "delete #{}", victim);
        assert_eq!(read_words(&row), expected);
    }

    let mut reader = RowReader::new(&row);
    assert!(reader.read().expect("read"));
    assert_eq!(reader.read_str().as_deref(), Ok("header"));
}

#[test]
fn test_variable_rewrites_keep_neighbours() {
    let mut rng = fastrand::Rng::with_seed(SEED ^ 0xff);
    let mut row = row();
    let scope = TypeArgument::array(LayoutType::Utf8.into());
    let tail = vec!["x".to_string(), "y".to_string()];
    RowWriter::new(&mut row)
        .write_scope(Some("words"), &scope, &tail, |w, words| {
            for word in words {
                w.write_str(None, word)?;
            }
            Ok(())
        })
        .expect("words");

    for _ in 0..32 {
        let value = random_word(&mut rng);
        RowWriter::new(&mut row)
            .write_str(Some("before"), &value)
            .expect("rewrite");
        let mut reader = RowReader::new(&row);
        assert!(reader.read().expect("read"));
        assert_eq!(reader.read_str(), Ok(value));
        assert_eq!(read_words(&row), tail);
    }

    RowWriter::new(&mut row).delete(Some("before")).expect("delete");
    let mut reader = RowReader::new(&row);
    assert!(reader.read().expect("read"));
    assert_eq!(reader.path(), Some("words"));
}
