// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RowWriter - forward-only construction of a row.

use crate::error::{RowError, RowResult};
use crate::layout::{LayoutColumn, TypeArgument};
use crate::row::{
    DateTime, Decimal, Float128, MongoDbObjectId, RowBuffer, RowCursor, UnixDateTime,
    UpdateOptions, Value,
};
use crate::schema::StorageKind;
use uuid::Uuid;

/// Where a write lands.
enum Target {
    /// Declared fixed or variable column.
    Column(LayoutColumn),
    /// Sparse item at the cursor, with its declared column if any.
    Sparse(Option<LayoutColumn>),
}

/// Generate typed writers over [`RowWriter::write`].
macro_rules! impl_write_typed {
    ($name:ident, $type:ty, $variant:ident) => {
        pub fn $name(&mut self, path: Option<&str>, value: $type) -> RowResult<()> {
            self.write(path, &Value::$variant(value))
        }
    };
}

/// Forward-only writer bound to one scope.
///
/// In schematized scopes (root, UDT, object) every write names a path:
/// declared fixed and variable columns are written in place, anything else
/// becomes a sparse item. In indexed scopes writes take no path and append
/// at the cursor, which then moves past the new element.
pub struct RowWriter<'a> {
    row: &'a mut RowBuffer,
    cursor: RowCursor,
}

impl<'a> RowWriter<'a> {
    /// Writer over the root scope.
    pub fn new(row: &'a mut RowBuffer) -> Self {
        let cursor = RowCursor::create(row);
        Self { row, cursor }
    }

    /// Writer over the scope `cursor` is bound to.
    pub fn at(row: &'a mut RowBuffer, cursor: RowCursor) -> Self {
        Self { row, cursor }
    }

    pub fn cursor(&self) -> &RowCursor {
        &self.cursor
    }

    /// Give back the cursor, e.g. to close the scope by hand.
    pub fn into_cursor(self) -> RowCursor {
        self.cursor
    }

    /// Advance the cursor to the next existing element (indexed scopes).
    pub fn move_next(&mut self) -> RowResult<bool> {
        self.cursor.move_next(self.row)
    }

    pub fn reset(&mut self) {
        self.cursor.reset();
    }

    fn target(&mut self, path: Option<&str>) -> RowResult<Target> {
        if !self.cursor.is_schematized() {
            return Ok(Target::Sparse(None));
        }
        let path = path.ok_or(RowError::InvalidOperation(
            "writes in a schematized scope need a path",
        ))?;
        let column = self
            .cursor
            .column_path(path)
            .and_then(|full| self.cursor.layout.try_find(&full).cloned());
        match column {
            Some(column) if column.storage() != StorageKind::Sparse => {
                return Ok(Target::Column(column));
            }
            None if self.cursor.is_udt() && self.cursor.layout.disallow_unschematized() => {
                return Err(RowError::SchemaMismatch(format!(
                    "'{}' is not declared in '{}'",
                    path,
                    self.cursor.layout.name()
                )));
            }
            _ => {}
        }
        self.cursor.find(self.row, path)?;
        Ok(Target::Sparse(column))
    }

    /// Indexed scopes step past the element just written.
    fn advance(&mut self) -> RowResult<()> {
        if self.cursor.scope_type().is_indexed() {
            self.cursor.move_next(self.row)?;
        }
        Ok(())
    }

    pub fn write(&mut self, path: Option<&str>, value: &Value) -> RowResult<()> {
        self.write_with(path, value, UpdateOptions::Upsert)
    }

    pub fn write_with(
        &mut self,
        path: Option<&str>,
        value: &Value,
        options: UpdateOptions,
    ) -> RowResult<()> {
        let ty = value.layout_type();
        match self.target(path)? {
            Target::Column(column) => {
                if column.layout_type() != ty {
                    return Err(RowError::TypeMismatch {
                        expected: column.layout_type().code(),
                        found: value.code(),
                    });
                }
                let present = match column.null_bit() {
                    Some(bit) => self.row.is_bit_set(&self.cursor, bit)?,
                    None => true,
                };
                match (options, present) {
                    (UpdateOptions::Insert, true) => return Err(RowError::Exists),
                    (UpdateOptions::Update, false) => return Err(RowError::NotFound),
                    _ => {}
                }
                match column.storage() {
                    StorageKind::Fixed => self.row.write_fixed(&self.cursor, &column, value),
                    _ => self.row.write_variable(&self.cursor, &column, value),
                }
            }
            Target::Sparse(column) => {
                if let Some(column) = column {
                    if column.layout_type() != ty {
                        return Err(RowError::TypeMismatch {
                            expected: column.layout_type().code(),
                            found: value.code(),
                        });
                    }
                }
                self.row.write_sparse(&mut self.cursor, ty, value, options)?;
                self.advance()
            }
        }
    }

    impl_write_typed!(write_bool, bool, Bool);
    impl_write_typed!(write_i8, i8, Int8);
    impl_write_typed!(write_i16, i16, Int16);
    impl_write_typed!(write_i32, i32, Int32);
    impl_write_typed!(write_i64, i64, Int64);
    impl_write_typed!(write_u8, u8, UInt8);
    impl_write_typed!(write_u16, u16, UInt16);
    impl_write_typed!(write_u32, u32, UInt32);
    impl_write_typed!(write_u64, u64, UInt64);
    impl_write_typed!(write_varint, i64, VarInt);
    impl_write_typed!(write_varuint, u64, VarUInt);
    impl_write_typed!(write_f32, f32, Float32);
    impl_write_typed!(write_f64, f64, Float64);
    impl_write_typed!(write_float128, Float128, Float128);
    impl_write_typed!(write_decimal, Decimal, Decimal);
    impl_write_typed!(write_datetime, DateTime, DateTime);
    impl_write_typed!(write_unix_datetime, UnixDateTime, UnixDateTime);
    impl_write_typed!(write_guid, Uuid, Guid);
    impl_write_typed!(write_object_id, MongoDbObjectId, ObjectId);

    pub fn write_str(&mut self, path: Option<&str>, value: &str) -> RowResult<()> {
        self.write(path, &Value::Utf8(value.to_string()))
    }

    pub fn write_bytes(&mut self, path: Option<&str>, value: &[u8]) -> RowResult<()> {
        self.write(path, &Value::Binary(value.to_vec()))
    }

    pub fn write_null(&mut self, path: Option<&str>) -> RowResult<()> {
        self.write(path, &Value::Null)
    }

    /// Open a scope of type `scope`, let `f` populate it, then close it.
    ///
    /// Closing validates the scope's arity and sorts set and map entries;
    /// a failure there is returned after `f`'s writes have been made.
    pub fn write_scope<C, T, F>(
        &mut self,
        path: Option<&str>,
        scope: &TypeArgument,
        context: C,
        f: F,
    ) -> RowResult<T>
    where
        F: FnOnce(&mut RowWriter<'_>, C) -> RowResult<T>,
    {
        self.write_scope_with(path, scope, UpdateOptions::Upsert, context, f)
    }

    pub fn write_scope_with<C, T, F>(
        &mut self,
        path: Option<&str>,
        scope: &TypeArgument,
        options: UpdateOptions,
        context: C,
        f: F,
    ) -> RowResult<T>
    where
        F: FnOnce(&mut RowWriter<'_>, C) -> RowResult<T>,
    {
        match self.target(path)? {
            Target::Column(_) => {
                return Err(RowError::InvalidOperation(
                    "scopes cannot live in fixed or variable columns",
                ))
            }
            Target::Sparse(Some(column)) if column.type_argument() != *scope => {
                return Err(RowError::TypeMismatch {
                    expected: column.layout_type().code(),
                    found: scope.layout_type().code(),
                });
            }
            Target::Sparse(_) => {}
        }

        let child = self.row.write_scope(
            &mut self.cursor,
            scope.layout_type(),
            scope.type_args(),
            options,
        )?;
        let mut nested = RowWriter::at(&mut *self.row, child);
        let out = f(&mut nested, context)?;
        let child = nested.into_cursor();
        self.row.close_scope(&child)?;

        // The item grew while it was populated.
        if let Some(at) = child.item_offset {
            self.cursor.position_at(self.row, at)?;
        }
        self.advance()?;
        Ok(out)
    }

    /// Write a nullable scope holding `value`, or an empty one for `None`.
    pub fn write_nullable(
        &mut self,
        path: Option<&str>,
        item: &TypeArgument,
        value: Option<&Value>,
    ) -> RowResult<()> {
        let scope = TypeArgument::nullable(item.clone());
        self.write_scope(path, &scope, value, |w, value| match value {
            Some(value) => w.write(None, value),
            None => Ok(()),
        })
    }

    /// Delete the value at `path` (schematized scopes) or the current element.
    pub fn delete(&mut self, path: Option<&str>) -> RowResult<()> {
        match self.target(path)? {
            Target::Column(column) => match column.storage() {
                StorageKind::Fixed => self.row.delete_fixed(&self.cursor, &column),
                _ => self.row.delete_variable(&self.cursor, &column),
            },
            Target::Sparse(_) => match self.cursor.item_type() {
                Some(ty) if ty.is_scope() => self.row.delete_scope(&mut self.cursor),
                Some(_) => self.row.delete_sparse(&mut self.cursor),
                None => Err(RowError::NotFound),
            },
        }
    }
}

impl std::fmt::Debug for RowWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowWriter")
            .field("scope", &self.cursor.scope_type())
            .field("index", &self.cursor.index())
            .finish()
    }
}
