// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scope items: open, create and close nested scopes.

use super::{check_element, item_header, place_item, primitive, Item};
use crate::config::{SCHEMA_ID_SIZE, SCOPE_SIZE_LEN};
use crate::error::{RowError, RowResult};
use crate::layout::{LayoutType, TypeArgument, TypeArgumentList};
use crate::row::{RowBuffer, RowCursor, UpdateOptions, Value};
use crate::schema::SchemaId;
use std::cmp::Ordering;
use std::sync::Arc;

fn arity_error(ty: LayoutType, expected: &str, found: usize) -> RowError {
    RowError::SchemaMismatch(format!(
        "{} takes {} type arguments, got {}",
        ty, expected, found
    ))
}

/// Reject argument lists a scope of type `ty` cannot be built from.
fn check_args(ty: LayoutType, args: &TypeArgumentList) -> RowResult<()> {
    let n = args.len();
    match ty {
        LayoutType::TypedArray { .. } | LayoutType::TypedSet { .. } | LayoutType::Nullable { .. }
            if n != 1 =>
        {
            Err(arity_error(ty, "1", n))
        }
        LayoutType::TypedMap { .. } if n != 2 => Err(arity_error(ty, "2", n)),
        LayoutType::TypedTuple { .. } if n < 2 => Err(arity_error(ty, "at least 2", n)),
        LayoutType::Tuple { .. } if n == 1 => Err(arity_error(ty, "none or at least 2", n)),
        LayoutType::Tagged { .. } | LayoutType::Tagged2 { .. } => {
            let want = if matches!(ty, LayoutType::Tagged { .. }) { 2 } else { 3 };
            let tag_ok = args
                .get(0)
                .is_some_and(|arg| arg.layout_type() == LayoutType::UInt8);
            if n != want || !tag_ok {
                return Err(arity_error(ty, "a uint8 tag plus its items as", n));
            }
            Ok(())
        }
        LayoutType::Udt { .. } if args.schema_id().is_none() => Err(RowError::SchemaMismatch(
            "udt scope needs a schema id".to_string(),
        )),
        _ => Ok(()),
    }
}

pub(super) fn read_scope(ty: LayoutType, row: &RowBuffer, edit: &RowCursor) -> RowResult<RowCursor> {
    let item = edit.current().ok_or(RowError::NotFound)?;
    if item.layout_type != ty {
        return Err(RowError::TypeMismatch {
            expected: ty.code(),
            found: item.code,
        });
    }
    open(row, edit, item)
}

fn open(row: &RowBuffer, edit: &RowCursor, item: &Item) -> RowResult<RowCursor> {
    let size_offset = item.value_offset;
    let arg = TypeArgument::new(item.layout_type, item.type_args.clone());
    let layout = match item.layout_type {
        LayoutType::Udt { .. } => {
            let raw = row.bytes(size_offset + SCOPE_SIZE_LEN, SCHEMA_ID_SIZE)?;
            let mut id = [0u8; SCHEMA_ID_SIZE];
            id.copy_from_slice(raw);
            let stored = SchemaId::from_le_bytes(id);
            if Some(stored) != item.type_args.schema_id() {
                return Err(RowError::SchemaMismatch(format!(
                    "udt payload carries schema {} but its type names {}",
                    stored,
                    item.type_args.schema_id().unwrap_or(SchemaId::INVALID)
                )));
            }
            let layout = row.resolver().resolve(stored)?;
            let size = row.read_u32(size_offset)? as usize;
            if size < SCHEMA_ID_SIZE + layout.size() {
                return Err(RowError::malformed("udt scope smaller than its layout"));
            }
            layout
        }
        _ => Arc::clone(&edit.layout),
    };
    Ok(edit.child(layout, &arg, item.offset, size_offset, item.path.as_deref()))
}

pub(super) fn write_scope(
    ty: LayoutType,
    row: &mut RowBuffer,
    edit: &mut RowCursor,
    type_args: &TypeArgumentList,
    options: UpdateOptions,
) -> RowResult<RowCursor> {
    check_args(ty, type_args)?;
    let arg = TypeArgument::new(ty, type_args.clone());
    check_element(edit, &arg)?;

    let (layout, payload) = match ty {
        LayoutType::Udt { .. } => {
            let id = type_args.schema_id().unwrap_or(SchemaId::INVALID);
            let layout = row.resolver().resolve(id)?;
            let mut payload = id.to_le_bytes().to_vec();
            payload.extend_from_slice(&layout.initial_region());
            (layout, payload)
        }
        LayoutType::Nullable { .. } => (Arc::clone(&edit.layout), vec![0]),
        _ => (Arc::clone(&edit.layout), Vec::new()),
    };

    let mut bytes = item_header(edit, ty.code(), ty, type_args)?;
    let size_at = bytes.len();
    let size = u32::try_from(payload.len())
        .map_err(|_| RowError::TooBig { capacity: u32::MAX as usize })?;
    bytes.extend_from_slice(&size.to_le_bytes());
    bytes.extend_from_slice(&payload);

    let at = place_item(row, edit, &bytes, options)?;
    let path = edit.write_path.clone();
    let mut child = edit.child(layout, &arg, at, at + size_at, path.as_deref());
    // A scope just written is open for population even if its type is immutable.
    child.immutable = false;
    log::trace!("[row] opened {} at offset {}", arg, at);
    Ok(child)
}

/// Whether a nullable scope holds a value.
pub(crate) fn nullable_has_value(row: &RowBuffer, scope: &RowCursor) -> RowResult<bool> {
    assert!(
        matches!(scope.scope_type, LayoutType::Nullable { .. }),
        "has_value on a {} scope",
        scope.scope_type
    );
    Ok(row.read_u8(scope.start)? != 0)
}

/// A sortable element of a set or map: its bytes, the bytes of its key
/// (the whole element for sets, the first child for map entries) and, for
/// primitive keys, the key value.
struct Entry {
    start: usize,
    end: usize,
    key_span: (usize, usize),
    key: Option<Value>,
}

fn elements(row: &RowBuffer, scope: &RowCursor) -> RowResult<Vec<Item>> {
    let mut walk = scope.clone();
    walk.reset();
    let mut items = Vec::new();
    while walk.move_next(row)? {
        if let Some(item) = walk.current() {
            items.push(item.clone());
        }
    }
    Ok(items)
}

fn entry_of(row: &RowBuffer, scope: &RowCursor, item: &Item) -> RowResult<Entry> {
    let key_item = match item.layout_type {
        LayoutType::TypedTuple { .. } if matches!(scope.scope_type, LayoutType::TypedMap { .. }) => {
            let mut entry = open(row, scope, item)?;
            if !entry.move_next(row)? {
                return Err(RowError::SchemaMismatch("map entry has no key".to_string()));
            }
            entry.current().cloned().ok_or(RowError::NotFound)?
        }
        _ => item.clone(),
    };
    let key = if key_item.layout_type.is_scope() {
        None
    } else {
        Some(primitive::read_item(row, &key_item)?)
    };
    Ok(Entry {
        start: item.offset,
        end: item.end,
        key_span: (key_item.offset, key_item.end),
        key,
    })
}

fn compare(row: &RowBuffer, a: &Entry, b: &Entry) -> Ordering {
    let by_key = match (&a.key, &b.key) {
        (Some(x), Some(y)) => x.key_cmp(y),
        _ => None,
    };
    by_key.unwrap_or_else(|| {
        let span =
            move |(start, end): (usize, usize)| row.bytes(start, end - start).unwrap_or(&[]);
        span(a.key_span).cmp(span(b.key_span))
    })
}

/// Validate a scope the writer is done with; sets and maps are sorted in place.
pub(crate) fn close_scope(row: &mut RowBuffer, scope: &RowCursor) -> RowResult<()> {
    let ty = scope.scope_type;
    match ty {
        LayoutType::Tuple { .. } if scope.type_args.is_empty() => Ok(()),
        LayoutType::Tuple { .. }
        | LayoutType::TypedTuple { .. }
        | LayoutType::Tagged { .. }
        | LayoutType::Tagged2 { .. } => {
            let count = elements(row, scope)?.len();
            if count != scope.type_args.len() {
                return Err(RowError::SchemaMismatch(format!(
                    "{} closed with {} of {} elements",
                    ty,
                    count,
                    scope.type_args.len()
                )));
            }
            Ok(())
        }
        LayoutType::Nullable { .. } => {
            let has_value = nullable_has_value(row, scope)?;
            let holds = scope.elements_start(row)? < scope.scope_end(row)?;
            if has_value != holds {
                return Err(RowError::SchemaMismatch(
                    "nullable flag disagrees with its contents".to_string(),
                ));
            }
            Ok(())
        }
        LayoutType::TypedSet { .. } | LayoutType::TypedMap { .. } => sort_unique(row, scope),
        _ => Ok(()),
    }
}

fn sort_unique(row: &mut RowBuffer, scope: &RowCursor) -> RowResult<()> {
    let items = elements(row, scope)?;
    let mut entries = Vec::with_capacity(items.len());
    for item in &items {
        if matches!(scope.scope_type, LayoutType::TypedMap { .. }) {
            let entry = open(row, scope, item)?;
            let count = elements(row, &entry)?.len();
            if count != 2 {
                return Err(RowError::SchemaMismatch(format!(
                    "map entry closed with {} of 2 elements",
                    count
                )));
            }
        }
        entries.push(entry_of(row, scope, item)?);
    }

    let frozen: &RowBuffer = row;
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by(|a, b| compare(frozen, a, b));
    if sorted
        .windows(2)
        .any(|pair| compare(frozen, pair[0], pair[1]) == Ordering::Equal)
    {
        log::warn!("[row] duplicate key in {} at offset {}", scope.scope_type, scope.start);
        return Err(RowError::InvalidOperation("duplicate key in unique scope"));
    }
    if sorted.iter().zip(&entries).all(|(a, b)| a.start == b.start) {
        return Ok(());
    }

    let mut payload = Vec::new();
    for entry in &sorted {
        payload.extend_from_slice(frozen.bytes(entry.start, entry.end - entry.start)?);
    }
    let at = scope.elements_start(row)?;
    row.write_at(at, &payload)
}
