// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type read/write/delete contract.
//!
//! Every [`LayoutType`] answers the same set of operations, resolved by
//! matching on the variant:
//!
//! | operation                                | valid for                        |
//! |------------------------------------------|----------------------------------|
//! | `read_fixed` / `write_fixed` / `delete_fixed` | fixed-size primitives, fixed-length utf8/binary |
//! | `read_variable` / `write_variable` / `delete_variable` | varint, varuint, utf8, binary |
//! | `read_sparse` / `write_sparse` / `delete_sparse` | every primitive            |
//! | `read_scope` / `write_scope` / `delete_scope` | every scope type             |
//!
//! Calling an operation a type does not support fails with
//! `InvalidOperation`. Sparse and scope operations act on the item the
//! edit cursor is positioned on (or the insertion point when it is not on
//! an item).

mod primitive;
mod scope;

pub(crate) use scope::{close_scope, nullable_has_value};

use super::cursor::{CursorState, RowCursor};
use super::{RowBuffer, UpdateOptions, Value};
use crate::config::SCOPE_SIZE_LEN;
use crate::error::{RowError, RowResult};
use crate::layout::{LayoutCode, LayoutColumn, LayoutType, TypeArgument, TypeArgumentList};
use crate::row::varint;
use crate::schema::StorageKind;

/// A parsed sparse item (or typed scope element).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Item {
    /// First byte of the item (tag byte, or value for untagged elements).
    pub offset: usize,
    pub layout_type: LayoutType,
    pub type_args: TypeArgumentList,
    /// Tag as stored; distinguishes `BooleanFalse` from `Boolean`.
    pub code: LayoutCode,
    pub path: Option<String>,
    /// Stored with a type tag (false inside typed scopes).
    pub tagged: bool,
    /// First byte of the body.
    pub value_offset: usize,
    /// Exclusive end.
    pub end: usize,
}

/// Byte length of a body of type `ty` starting at `at`.
pub(crate) fn value_len(
    row: &RowBuffer,
    ty: LayoutType,
    at: usize,
    limit: usize,
    tagged: bool,
) -> RowResult<usize> {
    match ty {
        LayoutType::Null | LayoutType::Boolean => Ok(if tagged { 0 } else { 1 }),
        LayoutType::VarInt | LayoutType::VarUInt => {
            let (_, used) = varint::get_varuint(row.bytes(at, limit.saturating_sub(at))?)?;
            Ok(used)
        }
        LayoutType::Utf8 | LayoutType::Binary => {
            let (len, used) = varint::get_varuint(row.bytes(at, limit.saturating_sub(at))?)?;
            usize::try_from(len)
                .ok()
                .and_then(|len| len.checked_add(used))
                .ok_or_else(|| RowError::malformed("length prefix overflows"))
        }
        ty if ty.is_scope() => Ok(SCOPE_SIZE_LEN + row.read_u32(at)? as usize),
        ty => ty
            .fixed_size()
            .ok_or_else(|| RowError::malformed("type has no body length")),
    }
}

impl LayoutType {
    /// Read a fixed column of the schematized scope `scope`.
    pub fn read_fixed(
        self,
        row: &RowBuffer,
        scope: &RowCursor,
        column: &LayoutColumn,
    ) -> RowResult<Value> {
        assert_eq!(column.storage(), StorageKind::Fixed, "'{}' is not fixed", column.path());
        match self {
            ty if ty.is_scope() || (ty.is_variable() && !ty.is_fixed_length_text()) => {
                Err(RowError::InvalidOperation("type does not support fixed storage"))
            }
            ty => primitive::read_fixed(ty, row, scope, column),
        }
    }

    pub fn write_fixed(
        self,
        row: &mut RowBuffer,
        scope: &RowCursor,
        column: &LayoutColumn,
        value: &Value,
    ) -> RowResult<()> {
        assert_eq!(column.storage(), StorageKind::Fixed, "'{}' is not fixed", column.path());
        match self {
            ty if ty.is_scope() || (ty.is_variable() && !ty.is_fixed_length_text()) => {
                Err(RowError::InvalidOperation("type does not support fixed storage"))
            }
            ty => primitive::write_fixed(ty, row, scope, column, value),
        }
    }

    /// Clear a nullable fixed column.
    pub fn delete_fixed(
        self,
        row: &mut RowBuffer,
        scope: &RowCursor,
        column: &LayoutColumn,
    ) -> RowResult<()> {
        assert_eq!(column.storage(), StorageKind::Fixed, "'{}' is not fixed", column.path());
        primitive::delete_fixed(row, scope, column)
    }

    pub fn read_variable(
        self,
        row: &RowBuffer,
        scope: &RowCursor,
        column: &LayoutColumn,
    ) -> RowResult<Value> {
        assert_eq!(
            column.storage(),
            StorageKind::Variable,
            "'{}' is not variable",
            column.path()
        );
        if !self.is_variable() {
            return Err(RowError::InvalidOperation("type does not support variable storage"));
        }
        primitive::read_variable(self, row, scope, column)
    }

    pub fn write_variable(
        self,
        row: &mut RowBuffer,
        scope: &RowCursor,
        column: &LayoutColumn,
        value: &Value,
    ) -> RowResult<()> {
        assert_eq!(
            column.storage(),
            StorageKind::Variable,
            "'{}' is not variable",
            column.path()
        );
        if !self.is_variable() {
            return Err(RowError::InvalidOperation("type does not support variable storage"));
        }
        primitive::write_variable(self, row, scope, column, value)
    }

    pub fn delete_variable(
        self,
        row: &mut RowBuffer,
        scope: &RowCursor,
        column: &LayoutColumn,
    ) -> RowResult<()> {
        assert_eq!(
            column.storage(),
            StorageKind::Variable,
            "'{}' is not variable",
            column.path()
        );
        primitive::delete_variable(row, scope, column)
    }

    /// Read the primitive item the cursor is positioned on.
    pub fn read_sparse(self, row: &RowBuffer, edit: &RowCursor) -> RowResult<Value> {
        if self.is_scope() {
            return Err(RowError::InvalidOperation("scope types are read with read_scope"));
        }
        let item = edit.current().ok_or(RowError::NotFound)?;
        if item.layout_type != self {
            return Err(RowError::TypeMismatch {
                expected: self.code(),
                found: item.code,
            });
        }
        primitive::read_item(row, item)
    }

    /// Write a primitive at the cursor: replaces the current item or inserts at the
    /// insertion point, as `options` allow.
    pub fn write_sparse(
        self,
        row: &mut RowBuffer,
        edit: &mut RowCursor,
        value: &Value,
        options: UpdateOptions,
    ) -> RowResult<()> {
        if self.is_scope() {
            return Err(RowError::InvalidOperation("scope types are written with write_scope"));
        }
        check_element(edit, &TypeArgument::from(self))?;
        let mut bytes = item_header(edit, primitive::tag_of(self, value), self, &TypeArgumentList::empty())?;
        primitive::encode_body(self, value, !edit.is_typed(), &mut bytes)?;
        place_item(row, edit, &bytes, options)?;
        Ok(())
    }

    pub fn delete_sparse(self, row: &mut RowBuffer, edit: &mut RowCursor) -> RowResult<()> {
        check_current(self, edit)?;
        remove_item(row, edit)
    }

    /// Open a cursor over the scope item the cursor is positioned on.
    pub fn read_scope(self, row: &RowBuffer, edit: &RowCursor) -> RowResult<RowCursor> {
        if !self.is_scope() {
            return Err(RowError::InvalidOperation("not a scope type"));
        }
        scope::read_scope(self, row, edit)
    }

    /// Create an empty scope at the cursor and return a cursor to populate it.
    pub fn write_scope(
        self,
        row: &mut RowBuffer,
        edit: &mut RowCursor,
        type_args: &TypeArgumentList,
        options: UpdateOptions,
    ) -> RowResult<RowCursor> {
        if !self.is_scope() {
            return Err(RowError::InvalidOperation("not a scope type"));
        }
        scope::write_scope(self, row, edit, type_args, options)
    }

    pub fn delete_scope(self, row: &mut RowBuffer, edit: &mut RowCursor) -> RowResult<()> {
        if !self.is_scope() {
            return Err(RowError::InvalidOperation("not a scope type"));
        }
        check_current(self, edit)?;
        remove_item(row, edit)
    }

    const fn is_fixed_length_text(self) -> bool {
        matches!(self, Self::Utf8 | Self::Binary)
    }
}

fn check_current(ty: LayoutType, edit: &RowCursor) -> RowResult<()> {
    let item = edit.current().ok_or(RowError::NotFound)?;
    if item.layout_type != ty {
        return Err(RowError::TypeMismatch {
            expected: ty.code(),
            found: item.code,
        });
    }
    Ok(())
}

/// Elements of typed scopes (and of tuples declaring arguments) must match
/// the scope's declared argument.
fn check_element(edit: &RowCursor, arg: &TypeArgument) -> RowResult<()> {
    if !edit.declares_elements() {
        return Ok(());
    }
    let expected = edit.element_type(edit.index).ok_or_else(|| {
        RowError::SchemaMismatch(format!(
            "{} holds more elements than its type arguments allow",
            edit.scope_type
        ))
    })?;
    if expected != *arg {
        return Err(RowError::TypeMismatch {
            expected: expected.layout_type().code(),
            found: arg.layout_type().code(),
        });
    }
    Ok(())
}

/// `[code][args][path]` for tagged scopes; nothing inside typed scopes.
fn item_header(
    edit: &RowCursor,
    code: LayoutCode,
    ty: LayoutType,
    args: &TypeArgumentList,
) -> RowResult<Vec<u8>> {
    let mut out = Vec::new();
    if edit.is_typed() {
        return Ok(out);
    }
    out.push(code.as_u8());
    args.encode(ty, &mut out);
    if edit.is_schematized() {
        let path = edit.write_path.as_deref().ok_or(RowError::InvalidOperation(
            "writes in a schematized scope need a path",
        ))?;
        varint::put_varuint(&mut out, path.len() as u64);
        out.extend_from_slice(path.as_bytes());
    }
    Ok(out)
}

/// Insert or replace `bytes` at the cursor; leaves the cursor on the new item.
fn place_item(
    row: &mut RowBuffer,
    edit: &mut RowCursor,
    bytes: &[u8],
    options: UpdateOptions,
) -> RowResult<usize> {
    if edit.immutable {
        return Err(RowError::InvalidOperation("scope is immutable"));
    }
    let nullable = matches!(edit.scope_type, LayoutType::Nullable { .. });
    let at = match (edit.state, options) {
        (CursorState::At(_), UpdateOptions::Insert) => return Err(RowError::Exists),
        (CursorState::At(at), UpdateOptions::InsertAt) => {
            if !edit.scope_type.is_indexed() {
                return Err(RowError::InvalidOperation("insert-at needs an indexed scope"));
            }
            if nullable {
                return Err(RowError::InvalidOperation("nullable holds at most one value"));
            }
            row.splice(edit, at, 0, bytes)?;
            at
        }
        (CursorState::At(at), _) => {
            let old_end = edit.parse_item(row, at, edit.index)?.end;
            row.splice(edit, at, old_end - at, bytes)?;
            at
        }
        (_, UpdateOptions::Update) => return Err(RowError::NotFound),
        _ => {
            if nullable && edit.elements_start(row)? < edit.scope_end(row)? {
                return Err(RowError::InvalidOperation("nullable holds at most one value"));
            }
            let at = edit.insertion_point(row)?;
            row.splice(edit, at, 0, bytes)?;
            at
        }
    };
    if nullable {
        row.write_u8(edit.start, 1)?;
    }
    edit.position_at(row, at)?;
    Ok(at)
}

/// Remove the current item and compact; the cursor is left before the next item.
fn remove_item(row: &mut RowBuffer, edit: &mut RowCursor) -> RowResult<()> {
    if edit.immutable {
        return Err(RowError::InvalidOperation("scope is immutable"));
    }
    let CursorState::At(at) = edit.state else {
        return Err(RowError::NotFound);
    };
    let end = edit.parse_item(row, at, edit.index)?.end;
    row.splice(edit, at, end - at, &[])?;
    if matches!(edit.scope_type, LayoutType::Nullable { .. }) {
        row.write_u8(edit.start, 0)?;
    }
    edit.state = CursorState::Before(at);
    edit.item = None;
    Ok(())
}
