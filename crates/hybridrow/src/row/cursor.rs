// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RowCursor - traversal handle bound to one scope.
//!
//! A cursor is a plain value: byte offsets plus the scope's type. It holds
//! no reference into the buffer, so every operation takes the
//! [`RowBuffer`] explicitly. Scope ends and the start of the sparse chain
//! are recomputed from the bytes on each call, and the current item is
//! re-parsed before advancing, so a cursor survives mutations *inside* the
//! item it is positioned on (nested scope writes). Mutations of earlier
//! items in the same scope invalidate it.
//!
//! # State machine
//!
//! ```text
//! BeforeFirst --move_next--> At(item) --move_next--> At(item) ... --> End
//!      \                                                             ^
//!       +---------------------- (empty scope) -----------------------+
//! ```
//!
//! `Before(offset)` is an insertion point left behind by a delete.

use super::dispatch::{self, Item};
use super::RowBuffer;
use crate::config::{HEADER_SIZE, SCHEMA_ID_SIZE, SCOPE_SIZE_LEN, VAR_OFFSET_LEN};
use crate::error::{RowError, RowResult};
use crate::layout::{Layout, LayoutCode, LayoutType, TypeArgument, TypeArgumentList};
use crate::row::varint;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CursorState {
    BeforeFirst,
    /// Between items; the next item (if any) starts here.
    Before(usize),
    At(usize),
    End,
}

/// Traversal handle bound to one scope's byte extent.
#[derive(Debug, Clone)]
pub struct RowCursor {
    /// Layout of the enclosing schematized scope (root or UDT).
    pub(crate) layout: Arc<Layout>,
    pub(crate) scope_type: LayoutType,
    pub(crate) type_args: TypeArgumentList,
    pub(crate) immutable: bool,
    /// First payload byte (after the size field).
    pub(crate) start: usize,
    /// Start of the schematized region (UDT and root scopes).
    pub(crate) region_start: usize,
    /// Offset of this scope's size field; `None` for the root.
    pub(crate) size_offset: Option<usize>,
    /// Size fields of every enclosing scope, outermost first.
    pub(crate) ancestors: Vec<usize>,
    /// Offset of the item that holds this scope in its parent.
    pub(crate) item_offset: Option<usize>,
    /// Dotted path of an object scope, for declared-column lookups.
    pub(crate) path_prefix: Option<String>,
    /// Path of the next sparse write, recorded by `find`.
    pub(crate) write_path: Option<String>,
    pub(crate) state: CursorState,
    pub(crate) index: usize,
    pub(crate) item: Option<Item>,
}

impl RowCursor {
    /// Cursor over the whole row.
    pub fn create(row: &RowBuffer) -> Self {
        Self {
            layout: Arc::clone(row.layout()),
            scope_type: LayoutType::Udt { immutable: false },
            type_args: TypeArgumentList::from_schema_id(row.schema_id()),
            immutable: false,
            start: HEADER_SIZE,
            region_start: HEADER_SIZE,
            size_offset: None,
            ancestors: Vec::new(),
            item_offset: None,
            path_prefix: None,
            write_path: None,
            state: CursorState::BeforeFirst,
            index: 0,
            item: None,
        }
    }

    /// Child cursor over the scope whose size field sits at `size_offset`.
    pub(crate) fn child(
        &self,
        layout: Arc<Layout>,
        scope: &TypeArgument,
        item_offset: usize,
        size_offset: usize,
        path: Option<&str>,
    ) -> Self {
        let mut ancestors = self.ancestors.clone();
        if let Some(own) = self.size_offset {
            ancestors.push(own);
        }
        let start = size_offset + SCOPE_SIZE_LEN;
        let scope_type = scope.layout_type();
        let path_prefix = match (scope_type, path) {
            (LayoutType::Object { .. }, Some(path)) => self.column_path(path),
            _ => None,
        };
        Self {
            layout,
            scope_type,
            type_args: scope.type_args().clone(),
            immutable: self.immutable || scope_type.immutable(),
            start,
            region_start: start + SCHEMA_ID_SIZE,
            size_offset: Some(size_offset),
            ancestors,
            item_offset: Some(item_offset),
            path_prefix,
            write_path: None,
            state: CursorState::BeforeFirst,
            index: 0,
            item: None,
        }
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// Type of the scope this cursor is bound to (the root is a UDT scope).
    pub fn scope_type(&self) -> LayoutType {
        self.scope_type
    }

    pub fn scope_args(&self) -> &TypeArgumentList {
        &self.type_args
    }

    pub fn immutable(&self) -> bool {
        self.immutable
    }

    pub fn is_root(&self) -> bool {
        self.size_offset.is_none()
    }

    /// Position of the current item (or of the next insertion) within the scope.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn at_end(&self) -> bool {
        self.state == CursorState::End
    }

    /// Type of the current item.
    pub fn item_type(&self) -> Option<LayoutType> {
        self.current().map(|item| item.layout_type)
    }

    pub fn item_args(&self) -> Option<&TypeArgumentList> {
        self.current().map(|item| &item.type_args)
    }

    /// Path of the current item (schematized scopes only).
    pub fn path(&self) -> Option<&str> {
        self.current().and_then(|item| item.path.as_deref())
    }

    /// `[start, end)` byte span of the current item as last parsed.
    pub fn item_span(&self) -> Option<(usize, usize)> {
        self.current().map(|item| (item.offset, item.end))
    }

    pub(crate) fn current(&self) -> Option<&Item> {
        match self.state {
            CursorState::At(_) => self.item.as_ref(),
            _ => None,
        }
    }

    /// Items of this scope carry a path.
    pub(crate) fn is_schematized(&self) -> bool {
        self.scope_type.is_schematized()
    }

    /// Items of this scope are stored without a type tag.
    pub(crate) fn is_typed(&self) -> bool {
        self.scope_type.is_typed_scope()
    }

    /// Elements are checked against the scope's type arguments: typed
    /// scopes always, untyped tuples when they declare arguments.
    pub(crate) fn declares_elements(&self) -> bool {
        self.is_typed()
            || (matches!(self.scope_type, LayoutType::Tuple { .. }) && !self.type_args.is_empty())
    }

    pub(crate) fn is_udt(&self) -> bool {
        matches!(self.scope_type, LayoutType::Udt { .. })
    }

    /// Layout path of `path` inside this scope, if the scope can have declared columns.
    pub(crate) fn column_path(&self, path: &str) -> Option<String> {
        match (self.scope_type, &self.path_prefix) {
            (LayoutType::Udt { .. }, _) => Some(path.to_string()),
            (LayoutType::Object { .. }, Some(prefix)) => Some(format!("{}.{}", prefix, path)),
            _ => None,
        }
    }

    /// Type of element `index` in a typed scope.
    pub(crate) fn element_type(&self, index: usize) -> Option<TypeArgument> {
        match self.scope_type {
            LayoutType::TypedArray { .. }
            | LayoutType::TypedSet { .. }
            | LayoutType::Nullable { .. } => self.type_args.get(0).cloned(),
            LayoutType::TypedMap { .. } => Some(TypeArgument::new(
                LayoutType::TypedTuple { immutable: false },
                self.type_args.clone(),
            )),
            LayoutType::Tuple { .. }
            | LayoutType::TypedTuple { .. }
            | LayoutType::Tagged { .. }
            | LayoutType::Tagged2 { .. } => self.type_args.get(index).cloned(),
            _ => None,
        }
    }

    /// Exclusive end of the scope.
    pub(crate) fn scope_end(&self, row: &RowBuffer) -> RowResult<usize> {
        match self.size_offset {
            None => Ok(row.len()),
            Some(at) => {
                let end = self.start + row.read_u32(at)? as usize;
                if end > row.len() {
                    return Err(RowError::malformed("scope extends past the row"));
                }
                Ok(end)
            }
        }
    }

    /// Offset of the first item (after schematized region, variable bytes, nullable flag).
    pub(crate) fn elements_start(&self, row: &RowBuffer) -> RowResult<usize> {
        match self.scope_type {
            LayoutType::Udt { .. } => {
                let layout = &self.layout;
                let var_end = match layout.num_variable() {
                    0 => layout.size(),
                    n => {
                        let at = self.region_start
                            + layout.var_table_offset()
                            + (n - 1) * VAR_OFFSET_LEN;
                        row.read_u32(at)? as usize
                    }
                };
                let start = self.region_start + var_end;
                if var_end < layout.size() || start > self.scope_end(row)? {
                    return Err(RowError::malformed("variable table out of bounds"));
                }
                Ok(start)
            }
            LayoutType::Nullable { .. } => Ok(self.start + 1),
            _ => Ok(self.start),
        }
    }

    /// Where the next write lands when the cursor is not on an item.
    pub(crate) fn insertion_point(&self, row: &RowBuffer) -> RowResult<usize> {
        match self.state {
            CursorState::BeforeFirst => self.elements_start(row),
            CursorState::Before(at) | CursorState::At(at) => Ok(at),
            CursorState::End => self.scope_end(row),
        }
    }

    /// Parse the item starting at `offset`.
    pub(crate) fn parse_item(&self, row: &RowBuffer, offset: usize, index: usize) -> RowResult<Item> {
        let scope_end = self.scope_end(row)?;
        let (layout_type, type_args, code, path, value_offset) = if self.is_typed() {
            let arg = self.element_type(index).ok_or_else(|| {
                RowError::SchemaMismatch(format!(
                    "{} holds more elements than its type arguments allow",
                    self.scope_type
                ))
            })?;
            let ty = arg.layout_type();
            (ty, arg.type_args().clone(), ty.code(), None, offset)
        } else {
            let byte = row.read_u8(offset)?;
            let code = LayoutCode::from_u8(byte)
                .ok_or_else(|| RowError::malformed("unknown layout code"))?;
            let ty = LayoutType::from_code(code)
                .ok_or_else(|| RowError::malformed("invalid layout code"))?;
            let mut pos = offset + 1;
            let args = TypeArgumentList::decode(ty, row.bytes(0, scope_end)?, &mut pos)?;
            let path = if self.is_schematized() {
                let (len, used) = varint::get_varuint(row.bytes(pos, scope_end.saturating_sub(pos))?)?;
                let len = usize::try_from(len).map_err(|_| RowError::malformed("path length"))?;
                let raw = row.bytes(pos + used, len)?;
                let text = std::str::from_utf8(raw)
                    .map_err(|_| RowError::malformed("path is not utf8"))?;
                pos += used + len;
                Some(text.to_string())
            } else {
                None
            };
            (ty, args, code, path, pos)
        };

        let len = dispatch::value_len(row, layout_type, value_offset, scope_end, !self.is_typed())?;
        let end = value_offset
            .checked_add(len)
            .filter(|&end| end <= scope_end)
            .ok_or_else(|| RowError::malformed("item extends past its scope"))?;
        Ok(Item {
            offset,
            layout_type,
            type_args,
            code,
            path,
            tagged: !self.is_typed(),
            value_offset,
            end,
        })
    }

    /// Advance to the next item of this scope. Returns false at the end of the scope.
    pub fn move_next(&mut self, row: &RowBuffer) -> RowResult<bool> {
        let (next, index) = match self.state {
            CursorState::BeforeFirst => (self.elements_start(row)?, 0),
            CursorState::Before(at) => (at, self.index),
            CursorState::At(at) => (self.parse_item(row, at, self.index)?.end, self.index + 1),
            CursorState::End => return Ok(false),
        };
        self.index = index;
        if next >= self.scope_end(row)? {
            self.state = CursorState::End;
            self.item = None;
            return Ok(false);
        }
        let item = self.parse_item(row, next, index)?;
        self.state = CursorState::At(next);
        self.item = Some(item);
        Ok(true)
    }

    /// Position on the item at `path` in a schematized scope.
    ///
    /// Returns false (and positions at the end, ready to append) if absent.
    pub fn find(&mut self, row: &RowBuffer, path: &str) -> RowResult<bool> {
        assert!(
            self.is_schematized(),
            "find by path on a {} scope",
            self.scope_type
        );
        self.write_path = Some(path.to_string());
        self.state = CursorState::BeforeFirst;
        self.item = None;
        while self.move_next(row)? {
            if self.path() == Some(path) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Rewind to before the first item.
    pub fn reset(&mut self) {
        self.state = CursorState::BeforeFirst;
        self.index = 0;
        self.item = None;
        self.write_path = None;
    }

    /// Jump to End-of-scope without visiting the remaining items.
    pub(crate) fn skip_to_end(&mut self) {
        self.state = CursorState::End;
        self.item = None;
    }

    /// Re-parse and position on the item at `offset`.
    pub(crate) fn position_at(&mut self, row: &RowBuffer, offset: usize) -> RowResult<()> {
        let item = self.parse_item(row, offset, self.index)?;
        self.state = CursorState::At(offset);
        self.item = Some(item);
        Ok(())
    }
}
