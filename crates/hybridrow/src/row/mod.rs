// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Row storage and the encode/decode engine.
//!
//! [`RowBuffer`] owns the bytes of one row. Every mutation goes through
//! [`RowBuffer::splice`], which keeps the size fields of the edited scope
//! and all of its ancestors in step with the bytes inserted or removed, so
//! the extent of every scope stays consistent after each write.
//!
//! Reads and writes are expressed against a [`RowCursor`] and dispatched
//! per [`LayoutType`](crate::layout::LayoutType).

mod cursor;
mod dispatch;
mod header;
mod resizer;
mod value;
pub mod varint;

pub use cursor::RowCursor;
pub use header::{HybridRowHeader, HybridRowVersion};
pub use resizer::{MemoryResizer, RowResizer};
pub use value::{DateTime, Decimal, Float128, MongoDbObjectId, UnixDateTime, Value};

use crate::config::{RowConfig, DEFAULT_INITIAL_CAPACITY, HEADER_SIZE, MAX_SCOPE_SIZE, VAR_OFFSET_LEN};
use crate::error::{RowError, RowResult};
use crate::layout::{Layout, LayoutBit, LayoutColumn, LayoutResolver, LayoutType, TypeArgumentList};
use crate::schema::SchemaId;
use std::sync::Arc;

/// How a write treats an existing value at the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdateOptions {
    /// Replace if present, insert otherwise.
    #[default]
    Upsert,
    /// Fail with `Exists` if present.
    Insert,
    /// Fail with `NotFound` if absent.
    Update,
    /// Indexed scopes only: insert before the current element.
    InsertAt,
}

/// Generate bounds-checked little-endian readers.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub(crate) fn $name(&self, offset: usize) -> RowResult<$type> {
            let raw = self.bytes(offset, $size)?;
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(raw);
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Generate bounds-checked little-endian in-place writers.
macro_rules! impl_write_le {
    ($name:ident, $type:ty) => {
        pub(crate) fn $name(&mut self, offset: usize, value: $type) -> RowResult<()> {
            self.write_at(offset, &value.to_le_bytes())
        }
    };
}

/// The bytes of one encoded row plus the layout and resolver that interpret them.
pub struct RowBuffer {
    buffer: Vec<u8>,
    version: HybridRowVersion,
    layout: Arc<Layout>,
    resolver: Arc<dyn LayoutResolver>,
    resizer: Box<dyn RowResizer>,
}

impl RowBuffer {
    /// Empty row of `layout` with an unbounded heap resizer.
    pub fn with_layout(
        version: HybridRowVersion,
        layout: Arc<Layout>,
        resolver: Arc<dyn LayoutResolver>,
    ) -> Self {
        Self::with_resizer(version, layout, resolver, Box::new(MemoryResizer::unbounded()))
    }

    /// Empty row sized and bounded by `config`.
    pub fn with_config(
        version: HybridRowVersion,
        layout: Arc<Layout>,
        resolver: Arc<dyn LayoutResolver>,
        config: &RowConfig,
    ) -> Self {
        Self::build(
            version,
            layout,
            resolver,
            Box::new(config.resizer()),
            config.initial_capacity,
        )
    }

    /// Empty row with a caller-provided growth strategy.
    pub fn with_resizer(
        version: HybridRowVersion,
        layout: Arc<Layout>,
        resolver: Arc<dyn LayoutResolver>,
        resizer: Box<dyn RowResizer>,
    ) -> Self {
        Self::build(version, layout, resolver, resizer, DEFAULT_INITIAL_CAPACITY)
    }

    fn build(
        version: HybridRowVersion,
        layout: Arc<Layout>,
        resolver: Arc<dyn LayoutResolver>,
        resizer: Box<dyn RowResizer>,
        capacity: usize,
    ) -> Self {
        let capacity = capacity.max(HEADER_SIZE + layout.size());
        let mut row = Self {
            buffer: Vec::with_capacity(capacity),
            version,
            layout: Arc::clone(&layout),
            resolver: Arc::clone(&resolver),
            resizer,
        };
        row.init_layout(version, layout, resolver);
        row
    }

    /// Reset to an empty row of `layout`: header, cleared bitmask, zeroed
    /// fixed slots, empty variable columns, no sparse items.
    pub fn init_layout(
        &mut self,
        version: HybridRowVersion,
        layout: Arc<Layout>,
        resolver: Arc<dyn LayoutResolver>,
    ) {
        self.buffer.clear();
        self.buffer
            .extend_from_slice(&HybridRowHeader::new(version, layout.schema_id()).encode());
        self.buffer.extend_from_slice(&layout.initial_region());
        self.version = version;
        self.layout = layout;
        self.resolver = resolver;
    }

    /// Adopt an encoded row. The header must carry `version` and a SchemaId
    /// that `resolver` knows; the root region must fit the resolved layout.
    pub fn from_bytes(
        bytes: &[u8],
        version: HybridRowVersion,
        resolver: Arc<dyn LayoutResolver>,
    ) -> RowResult<Self> {
        let header = HybridRowHeader::decode(bytes)?;
        if header.version != version {
            return Err(RowError::SchemaMismatch(format!(
                "row version 0x{:02x}, expected 0x{:02x}",
                header.version as u8, version as u8
            )));
        }
        let layout = resolver.resolve(header.schema_id)?;
        let region_len = bytes.len() - HEADER_SIZE;
        if region_len < layout.size() {
            return Err(RowError::malformed("row shorter than its layout"));
        }

        let mut previous = layout.size();
        for slot in 0..layout.num_variable() {
            let at = HEADER_SIZE + layout.var_table_offset() + slot * VAR_OFFSET_LEN;
            let mut raw = [0u8; VAR_OFFSET_LEN];
            raw.copy_from_slice(&bytes[at..at + VAR_OFFSET_LEN]);
            let end = u32::from_le_bytes(raw) as usize;
            if end < previous || end > region_len {
                return Err(RowError::malformed("variable table out of bounds"));
            }
            previous = end;
        }

        let mut buffer = Vec::with_capacity(bytes.len().max(DEFAULT_INITIAL_CAPACITY));
        buffer.extend_from_slice(bytes);
        Ok(Self {
            buffer,
            version,
            layout,
            resolver,
            resizer: Box::new(MemoryResizer::unbounded()),
        })
    }

    /// Replace the growth strategy.
    pub fn set_resizer(&mut self, resizer: Box<dyn RowResizer>) {
        self.resizer = resizer;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.clone()
    }

    pub fn header(&self) -> HybridRowHeader {
        HybridRowHeader::new(self.version, self.layout.schema_id())
    }

    pub fn schema_id(&self) -> SchemaId {
        self.layout.schema_id()
    }

    pub fn version(&self) -> HybridRowVersion {
        self.version
    }

    /// Layout of the root scope.
    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn resolver(&self) -> &Arc<dyn LayoutResolver> {
        &self.resolver
    }

    /// Cursor over the root scope.
    pub fn cursor(&self) -> RowCursor {
        RowCursor::create(self)
    }

    // ===================================================================
    // Column and item access
    // ===================================================================

    pub fn read_fixed(&self, scope: &RowCursor, column: &LayoutColumn) -> RowResult<Value> {
        column.layout_type().read_fixed(self, scope, column)
    }

    pub fn write_fixed(
        &mut self,
        scope: &RowCursor,
        column: &LayoutColumn,
        value: &Value,
    ) -> RowResult<()> {
        column.layout_type().write_fixed(self, scope, column, value)
    }

    pub fn delete_fixed(&mut self, scope: &RowCursor, column: &LayoutColumn) -> RowResult<()> {
        column.layout_type().delete_fixed(self, scope, column)
    }

    pub fn read_variable(&self, scope: &RowCursor, column: &LayoutColumn) -> RowResult<Value> {
        column.layout_type().read_variable(self, scope, column)
    }

    pub fn write_variable(
        &mut self,
        scope: &RowCursor,
        column: &LayoutColumn,
        value: &Value,
    ) -> RowResult<()> {
        column.layout_type().write_variable(self, scope, column, value)
    }

    pub fn delete_variable(&mut self, scope: &RowCursor, column: &LayoutColumn) -> RowResult<()> {
        column.layout_type().delete_variable(self, scope, column)
    }

    /// Read the primitive the cursor is on, which must be of type `ty`.
    pub fn read_sparse(&self, edit: &RowCursor, ty: LayoutType) -> RowResult<Value> {
        ty.read_sparse(self, edit)
    }

    pub fn write_sparse(
        &mut self,
        edit: &mut RowCursor,
        ty: LayoutType,
        value: &Value,
        options: UpdateOptions,
    ) -> RowResult<()> {
        ty.write_sparse(self, edit, value, options)
    }

    /// Delete the primitive the cursor is on.
    pub fn delete_sparse(&mut self, edit: &mut RowCursor) -> RowResult<()> {
        let ty = edit.item_type().ok_or(RowError::NotFound)?;
        ty.delete_sparse(self, edit)
    }

    /// Open the scope the cursor is on.
    pub fn read_scope(&self, edit: &RowCursor) -> RowResult<RowCursor> {
        let ty = edit.item_type().ok_or(RowError::NotFound)?;
        ty.read_scope(self, edit)
    }

    pub fn write_scope(
        &mut self,
        edit: &mut RowCursor,
        ty: LayoutType,
        type_args: &TypeArgumentList,
        options: UpdateOptions,
    ) -> RowResult<RowCursor> {
        ty.write_scope(self, edit, type_args, options)
    }

    /// Delete the scope the cursor is on, with everything inside it.
    pub fn delete_scope(&mut self, edit: &mut RowCursor) -> RowResult<()> {
        let ty = edit.item_type().ok_or(RowError::NotFound)?;
        ty.delete_scope(self, edit)
    }

    /// Validate a populated scope; sets and maps are sorted by key.
    pub fn close_scope(&mut self, scope: &RowCursor) -> RowResult<()> {
        dispatch::close_scope(self, scope)
    }

    /// `NotFound` unless the nullable scope `scope` holds a value.
    pub fn has_value(&self, scope: &RowCursor) -> RowResult<()> {
        if dispatch::nullable_has_value(self, scope)? {
            Ok(())
        } else {
            Err(RowError::NotFound)
        }
    }

    // ===================================================================
    // Byte access
    // ===================================================================

    pub(crate) fn bytes(&self, offset: usize, len: usize) -> RowResult<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.buffer.get(offset..end))
            .ok_or_else(|| RowError::malformed("read past the end of the row"))
    }

    pub(crate) fn read_u8(&self, offset: usize) -> RowResult<u8> {
        self.buffer
            .get(offset)
            .copied()
            .ok_or_else(|| RowError::malformed("read past the end of the row"))
    }

    impl_read_le!(read_u32, u32, 4);

    pub(crate) fn write_u8(&mut self, offset: usize, value: u8) -> RowResult<()> {
        self.write_at(offset, &[value])
    }

    impl_write_le!(write_u32, u32);

    /// Overwrite bytes in place; the row length does not change.
    pub(crate) fn write_at(&mut self, offset: usize, data: &[u8]) -> RowResult<()> {
        let slot = offset
            .checked_add(data.len())
            .and_then(|end| self.buffer.get_mut(offset..end))
            .ok_or_else(|| RowError::malformed("write past the end of the row"))?;
        slot.copy_from_slice(data);
        Ok(())
    }

    pub(crate) fn is_bit_set(&self, scope: &RowCursor, bit: LayoutBit) -> RowResult<bool> {
        Ok(self.read_u8(scope.region_start + bit.offset())? & bit.mask() != 0)
    }

    pub(crate) fn set_bit(&mut self, scope: &RowCursor, bit: LayoutBit, on: bool) -> RowResult<()> {
        let at = scope.region_start + bit.offset();
        let byte = self.read_u8(at)?;
        let byte = if on { byte | bit.mask() } else { byte & !bit.mask() };
        self.write_u8(at, byte)
    }

    /// Replace `remove` bytes at `at` with `insert` inside `scope`, growing
    /// through the resizer when needed. The size fields of `scope` and all
    /// of its ancestors absorb the length change.
    pub(crate) fn splice(
        &mut self,
        scope: &RowCursor,
        at: usize,
        remove: usize,
        insert: &[u8],
    ) -> RowResult<()> {
        let end = at
            .checked_add(remove)
            .filter(|&end| end <= self.buffer.len())
            .ok_or_else(|| RowError::malformed("splice past the end of the row"))?;
        let delta = insert.len() as i64 - remove as i64;

        let requested = self.buffer.len() - remove + insert.len();
        if requested > self.buffer.capacity() {
            let grown = self
                .resizer
                .ensure_capacity(&self.buffer, requested)
                .filter(|grown| grown.capacity() >= requested && grown.len() == self.buffer.len())
                .ok_or(RowError::InsufficientSpace { requested })?;
            self.buffer = grown;
        }

        // Validate every size field before touching the bytes.
        let size_fields: Vec<usize> = scope
            .ancestors
            .iter()
            .copied()
            .chain(scope.size_offset)
            .collect();
        let mut resized = Vec::with_capacity(size_fields.len());
        for &field in &size_fields {
            let size = i64::from(self.read_u32(field)?) + delta;
            if size < 0 || size > MAX_SCOPE_SIZE as i64 {
                return Err(RowError::TooBig {
                    capacity: MAX_SCOPE_SIZE,
                });
            }
            resized.push(size as u32);
        }

        self.buffer.splice(at..end, insert.iter().copied());
        for (field, size) in size_fields.into_iter().zip(resized) {
            self.write_u32(field, size)?;
        }
        if delta < 0 {
            log::trace!("[row] compacted {} bytes at offset {}", -delta, at);
        }
        Ok(())
    }
}

impl std::fmt::Debug for RowBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowBuffer")
            .field("version", &self.version)
            .field("schema_id", &self.layout.schema_id())
            .field("len", &self.buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResultKind;
    use crate::layout::NamespaceResolver;
    use crate::schema::{Namespace, PropertyType, SchemaBuilder, StorageKind, TypeKind};

    fn resolver() -> Arc<dyn LayoutResolver> {
        let schema = SchemaBuilder::new("Row", SchemaId::new(3))
            .property(
                "a",
                PropertyType::primitive(TypeKind::Int32)
                    .with_storage(StorageKind::Fixed)
                    .optional(),
            )
            .property(
                "s",
                PropertyType::primitive(TypeKind::Utf8).with_storage(StorageKind::Variable),
            )
            .property(
                "t",
                PropertyType::primitive(TypeKind::Binary).with_storage(StorageKind::Variable),
            )
            .build();
        let mut ns = Namespace::new("ns");
        ns.add(schema).expect("add");
        Arc::new(NamespaceResolver::new(Arc::new(ns)))
    }

    fn empty_row() -> RowBuffer {
        let resolver = resolver();
        let layout = resolver.resolve(SchemaId::new(3)).expect("resolve");
        RowBuffer::with_layout(HybridRowVersion::V1, layout, resolver)
    }

    #[test]
    fn test_empty_row_shape() {
        let row = empty_row();
        let layout = Arc::clone(row.layout());
        assert_eq!(row.len(), HEADER_SIZE + layout.size());
        assert_eq!(row.header().schema_id, SchemaId::new(3));
        assert_eq!(row.as_bytes()[0], 0x81);
    }

    #[test]
    fn test_fixed_presence_bit() {
        let mut row = empty_row();
        let scope = row.cursor();
        let column = row.layout().find("a").clone();
        assert_eq!(row.read_fixed(&scope, &column), Err(RowError::NotFound));

        row.write_fixed(&scope, &column, &Value::Int32(-9)).expect("write");
        assert_eq!(row.read_fixed(&scope, &column), Ok(Value::Int32(-9)));

        row.delete_fixed(&scope, &column).expect("delete");
        assert_eq!(row.read_fixed(&scope, &column), Err(RowError::NotFound));
    }

    #[test]
    fn test_variable_columns_shift_on_growth() {
        let mut row = empty_row();
        let scope = row.cursor();
        let s = row.layout().find("s").clone();
        let t = row.layout().find("t").clone();

        row.write_variable(&scope, &t, &Value::Binary(vec![1, 2, 3])).expect("t");
        row.write_variable(&scope, &s, &Value::from("hello")).expect("s");
        assert_eq!(row.read_variable(&scope, &t), Ok(Value::Binary(vec![1, 2, 3])));

        let before = row.len();
        row.write_variable(&scope, &s, &Value::from("hi")).expect("shrink");
        assert_eq!(row.len(), before - 3);
        assert_eq!(row.read_variable(&scope, &s), Ok(Value::from("hi")));
        assert_eq!(row.read_variable(&scope, &t), Ok(Value::Binary(vec![1, 2, 3])));

        row.delete_variable(&scope, &s).expect("delete");
        assert_eq!(row.read_variable(&scope, &s), Err(RowError::NotFound));
        assert_eq!(row.read_variable(&scope, &t), Ok(Value::Binary(vec![1, 2, 3])));
    }

    #[test]
    fn test_from_bytes_validates_header_and_table() {
        let mut row = empty_row();
        let scope = row.cursor();
        let s = row.layout().find("s").clone();
        row.write_variable(&scope, &s, &Value::from("abc")).expect("write");
        let bytes = row.to_bytes();

        let parsed = RowBuffer::from_bytes(&bytes, HybridRowVersion::V1, resolver()).expect("parse");
        assert_eq!(parsed.read_variable(&parsed.cursor(), &s), Ok(Value::from("abc")));

        let truncated = &bytes[..bytes.len() - 1];
        let err = RowBuffer::from_bytes(truncated, HybridRowVersion::V1, resolver()).unwrap_err();
        assert_eq!(err.kind(), ResultKind::SchemaMismatch);

        let mut unknown = bytes.clone();
        unknown[1] = 99;
        assert!(RowBuffer::from_bytes(&unknown, HybridRowVersion::V1, resolver()).is_err());
    }

    #[test]
    fn test_resizer_refusal_is_insufficient_space() {
        let resolver = resolver();
        let layout = resolver.resolve(SchemaId::new(3)).expect("resolve");
        let floor = HEADER_SIZE + layout.size();
        let config = RowConfig {
            initial_capacity: floor,
            max_capacity: Some(floor + 4),
            ..RowConfig::default()
        };
        let mut row = RowBuffer::with_config(HybridRowVersion::V1, layout, resolver, &config);
        let scope = row.cursor();
        let s = row.layout().find("s").clone();
        let before = row.to_bytes();

        let err = row
            .write_variable(&scope, &s, &Value::from("far too long for the ceiling"))
            .unwrap_err();
        assert_eq!(err.kind(), ResultKind::InsufficientSpace);
        assert_eq!(row.as_bytes(), &before[..]);
    }

    #[test]
    fn test_set_resizer_caps_adopted_row() {
        let bytes = RowBuffer::with_layout(
            HybridRowVersion::V1,
            resolver().resolve(SchemaId::new(3)).expect("resolve"),
            resolver(),
        )
        .to_bytes();
        let mut row = RowBuffer::from_bytes(&bytes, HybridRowVersion::V1, resolver()).expect("parse");
        row.set_resizer(Box::new(MemoryResizer::new(Some(bytes.len() + 16))));
        let scope = row.cursor();
        let s = row.layout().find("s").clone();

        let err = row
            .write_variable(&scope, &s, &Value::from("x".repeat(300).as_str()))
            .unwrap_err();
        assert_eq!(err.kind(), ResultKind::InsufficientSpace);
        row.write_variable(&scope, &s, &Value::from("fits")).expect("small write");
    }
}
