// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RowReader - generic (path, type, value) iteration.

use crate::error::{RowError, RowResult};
use crate::layout::{LayoutCode, LayoutColumn, LayoutType, TypeArgumentList};
use crate::row::{
    DateTime, Decimal, Float128, MongoDbObjectId, RowBuffer, RowCursor, UnixDateTime, Value,
};
use crate::schema::StorageKind;
use std::sync::Arc;
use uuid::Uuid;

/// What the reader is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    /// Declared fixed or variable column, by layout index.
    Column(usize),
    /// The cursor's current sparse item.
    Sparse,
}

/// Generate typed accessors over [`RowReader::read_value`].
macro_rules! impl_read_typed {
    ($name:ident, $variant:ident, $type:ty, $code:ident) => {
        pub fn $name(&self) -> RowResult<$type> {
            match self.read_value()? {
                Value::$variant(v) => Ok(v),
                other => Err(RowError::TypeMismatch {
                    expected: LayoutCode::$code,
                    found: other.code(),
                }),
            }
        }
    };
}

/// Forward-only reader bound to one scope.
///
/// In the root and in UDT scopes it yields the present fixed columns, then
/// the present variable columns, then the sparse items. Elsewhere it yields
/// the scope's elements in order.
pub struct RowReader<'a> {
    row: &'a RowBuffer,
    cursor: RowCursor,
    next_column: usize,
    field: Field,
}

impl<'a> RowReader<'a> {
    /// Reader over the root scope.
    pub fn new(row: &'a RowBuffer) -> Self {
        Self::with_cursor(row, RowCursor::create(row))
    }

    pub fn with_cursor(row: &'a RowBuffer, cursor: RowCursor) -> Self {
        Self {
            row,
            cursor,
            next_column: 0,
            field: Field::None,
        }
    }

    pub fn cursor(&self) -> &RowCursor {
        &self.cursor
    }

    fn declared_columns(&self) -> usize {
        if self.cursor.is_udt() {
            self.cursor.layout.num_fixed() + self.cursor.layout.num_variable()
        } else {
            0
        }
    }

    fn column(&self) -> Option<&LayoutColumn> {
        match self.field {
            Field::Column(index) => self.cursor.layout.column(index),
            _ => None,
        }
    }

    /// Advance to the next present field. Returns false at the end of the scope.
    pub fn read(&mut self) -> RowResult<bool> {
        let layout = Arc::clone(&self.cursor.layout);
        while self.next_column < self.declared_columns() {
            let index = self.next_column;
            self.next_column += 1;
            let present = match layout.column(index).and_then(LayoutColumn::null_bit) {
                Some(bit) => self.row.is_bit_set(&self.cursor, bit)?,
                None => true,
            };
            if present {
                self.field = Field::Column(index);
                return Ok(true);
            }
        }
        if self.cursor.move_next(self.row)? {
            self.field = Field::Sparse;
            Ok(true)
        } else {
            self.field = Field::None;
            Ok(false)
        }
    }

    /// Path of the current field (schematized scopes only).
    pub fn path(&self) -> Option<&str> {
        match self.field {
            Field::Column(_) => self.column().map(LayoutColumn::path),
            Field::Sparse => self.cursor.path(),
            Field::None => None,
        }
    }

    /// Element index of the current sparse item.
    pub fn index(&self) -> usize {
        self.cursor.index()
    }

    pub fn layout_type(&self) -> Option<LayoutType> {
        match self.field {
            Field::Column(_) => self.column().map(LayoutColumn::layout_type),
            Field::Sparse => self.cursor.item_type(),
            Field::None => None,
        }
    }

    pub fn type_args(&self) -> Option<&TypeArgumentList> {
        match self.field {
            Field::Column(_) => self.column().map(LayoutColumn::type_args),
            Field::Sparse => self.cursor.item_args(),
            Field::None => None,
        }
    }

    pub fn storage(&self) -> Option<StorageKind> {
        match self.field {
            Field::Column(_) => self.column().map(LayoutColumn::storage),
            Field::Sparse => Some(StorageKind::Sparse),
            Field::None => None,
        }
    }

    /// Value of the current primitive field.
    pub fn read_value(&self) -> RowResult<Value> {
        match self.field {
            Field::Column(_) => {
                let column = self.column().ok_or(RowError::NotFound)?;
                match column.storage() {
                    StorageKind::Fixed => self.row.read_fixed(&self.cursor, column),
                    _ => self.row.read_variable(&self.cursor, column),
                }
            }
            Field::Sparse => {
                let ty = self.cursor.item_type().ok_or(RowError::NotFound)?;
                self.row.read_sparse(&self.cursor, ty)
            }
            Field::None => Err(RowError::NotFound),
        }
    }

    impl_read_typed!(read_bool, Bool, bool, Boolean);
    impl_read_typed!(read_i8, Int8, i8, Int8);
    impl_read_typed!(read_i16, Int16, i16, Int16);
    impl_read_typed!(read_i32, Int32, i32, Int32);
    impl_read_typed!(read_i64, Int64, i64, Int64);
    impl_read_typed!(read_u8, UInt8, u8, UInt8);
    impl_read_typed!(read_u16, UInt16, u16, UInt16);
    impl_read_typed!(read_u32, UInt32, u32, UInt32);
    impl_read_typed!(read_u64, UInt64, u64, UInt64);
    impl_read_typed!(read_varint, VarInt, i64, VarInt);
    impl_read_typed!(read_varuint, VarUInt, u64, VarUInt);
    impl_read_typed!(read_f32, Float32, f32, Float32);
    impl_read_typed!(read_f64, Float64, f64, Float64);
    impl_read_typed!(read_float128, Float128, Float128, Float128);
    impl_read_typed!(read_decimal, Decimal, Decimal, Decimal);
    impl_read_typed!(read_datetime, DateTime, DateTime, DateTime);
    impl_read_typed!(read_unix_datetime, UnixDateTime, UnixDateTime, UnixDateTime);
    impl_read_typed!(read_guid, Guid, Uuid, Guid);
    impl_read_typed!(read_object_id, ObjectId, MongoDbObjectId, MongoDbObjectId);
    impl_read_typed!(read_str, Utf8, String, Utf8);
    impl_read_typed!(read_bytes, Binary, Vec<u8>, Binary);

    /// Reader bound to the scope the reader is positioned on.
    pub fn open_scope(&self) -> RowResult<RowReader<'a>> {
        if self.field != Field::Sparse {
            return Err(RowError::InvalidOperation("reader is not on a scope item"));
        }
        let child = self.row.read_scope(&self.cursor)?;
        Ok(RowReader::with_cursor(self.row, child))
    }

    /// Hand a reader over the current scope item to `f`. However much `f`
    /// consumes, the next [`read`](Self::read) continues after the scope.
    pub fn read_scope<C, T, F>(&mut self, context: C, f: F) -> RowResult<T>
    where
        F: FnOnce(&mut RowReader<'a>, C) -> RowResult<T>,
    {
        let mut nested = self.open_scope()?;
        f(&mut nested, context)
    }

    /// Fast-forward `nested` to its end. Fails once this reader has moved
    /// past the item `nested` was opened on.
    pub fn skip_scope(&self, nested: &mut RowReader<'a>) -> RowResult<()> {
        let on_item = match (self.field, self.cursor.item_span(), nested.cursor.item_offset) {
            (Field::Sparse, Some((start, _)), Some(item)) => start == item,
            _ => false,
        };
        if !on_item {
            return Err(RowError::InvalidOperation(
                "parent reader has moved past the scope",
            ));
        }
        nested.next_column = nested.declared_columns();
        nested.field = Field::None;
        nested.cursor.skip_to_end();
        Ok(())
    }

    /// Whether the nullable scope this reader is bound to holds a value.
    pub fn has_value(&self) -> RowResult<bool> {
        match self.row.has_value(&self.cursor) {
            Ok(()) => Ok(true),
            Err(RowError::NotFound) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for RowReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowReader")
            .field("scope", &self.cursor.scope_type())
            .field("index", &self.cursor.index())
            .field("path", &self.path())
            .finish()
    }
}
