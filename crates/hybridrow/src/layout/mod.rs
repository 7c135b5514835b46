// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compiled physical layouts.
//!
//! A [`Layout`] is produced once per schema by the [`LayoutCompiler`] and
//! shared (behind `Arc`) by every row of that schema. It fixes the shape of
//! the schematized region at the start of the root scope and of every UDT
//! scope:
//!
//! ```text
//! region_start
//! |
//! [presence bitmask][fixed slot 0][fixed slot 1]...[var end 0][var end 1]...
//!  num_bitmask_bytes  fixed_size bytes              4 * num_variable bytes
//! ```
//!
//! Variable end offsets are relative to `region_start`; the sparse chain
//! starts at the last end offset.

mod code;
mod compiler;
mod resolver;
mod types;

pub use code::LayoutCode;
pub use compiler::LayoutCompiler;
pub use resolver::{LayoutResolver, NamespaceResolver};
pub use types::{LayoutType, TypeArgument, TypeArgumentList};

use crate::config::VAR_OFFSET_LEN;
use crate::schema::{SchemaId, StorageKind};
use std::collections::HashMap;

/// Location of a presence bit in the bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutBit(usize);

impl LayoutBit {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }

    /// Byte offset inside the bitmask.
    pub const fn offset(self) -> usize {
        self.0 / 8
    }

    pub const fn mask(self) -> u8 {
        1 << (self.0 % 8)
    }
}

/// One column of a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutColumn {
    pub(crate) path: String,
    pub(crate) layout_type: LayoutType,
    pub(crate) type_args: TypeArgumentList,
    pub(crate) storage: StorageKind,
    /// Fixed: byte offset from region start. Variable: table index. Sparse: 0.
    pub(crate) offset: usize,
    /// Fixed: slot width. Otherwise 0.
    pub(crate) size: usize,
    pub(crate) null_bit: Option<LayoutBit>,
    pub(crate) parent: Option<usize>,
    pub(crate) index: usize,
}

impl LayoutColumn {
    /// Full dotted path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path relative to the enclosing object (last segment).
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    pub fn layout_type(&self) -> LayoutType {
        self.layout_type
    }

    pub fn type_args(&self) -> &TypeArgumentList {
        &self.type_args
    }

    pub fn type_argument(&self) -> TypeArgument {
        TypeArgument::new(self.layout_type, self.type_args.clone())
    }

    pub fn storage(&self) -> StorageKind {
        self.storage
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn null_bit(&self) -> Option<LayoutBit> {
        self.null_bit
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Compiled, immutable physical description of one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    name: String,
    schema_id: SchemaId,
    columns: Vec<LayoutColumn>,
    path_index: HashMap<String, usize>,
    num_bitmask_bytes: usize,
    num_fixed: usize,
    num_variable: usize,
    fixed_size: usize,
    disallow_unschematized: bool,
}

impl Layout {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema_id(&self) -> SchemaId {
        self.schema_id
    }

    /// Every column: fixed first, then variable, then sparse (with nested object columns).
    pub fn columns(&self) -> &[LayoutColumn] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&LayoutColumn> {
        self.columns.get(index)
    }

    pub fn try_find(&self, path: &str) -> Option<&LayoutColumn> {
        self.path_index.get(path).map(|&i| &self.columns[i])
    }

    /// Look up a declared column.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not declared in this layout.
    pub fn find(&self, path: &str) -> &LayoutColumn {
        match self.try_find(path) {
            Some(column) => column,
            None => panic!("column '{}' is not declared in layout '{}'", path, self.name),
        }
    }

    pub fn num_bitmask_bytes(&self) -> usize {
        self.num_bitmask_bytes
    }

    pub fn num_fixed(&self) -> usize {
        self.num_fixed
    }

    pub fn num_variable(&self) -> usize {
        self.num_variable
    }

    /// Bytes of fixed slots (excluding the bitmask).
    pub fn fixed_size(&self) -> usize {
        self.fixed_size
    }

    /// Offset of the variable end table from the region start.
    pub fn var_table_offset(&self) -> usize {
        self.num_bitmask_bytes + self.fixed_size
    }

    /// Bytes of the schematized region (bitmask, fixed slots, variable table).
    pub fn size(&self) -> usize {
        self.var_table_offset() + self.num_variable * VAR_OFFSET_LEN
    }

    pub fn disallow_unschematized(&self) -> bool {
        self.disallow_unschematized
    }

    /// Fixed columns declared at the top level.
    pub fn fixed_columns(&self) -> &[LayoutColumn] {
        &self.columns[..self.num_fixed]
    }

    /// Variable columns, in table order.
    pub fn variable_columns(&self) -> &[LayoutColumn] {
        &self.columns[self.num_fixed..self.num_fixed + self.num_variable]
    }

    /// Fresh schematized region: empty bitmask, zeroed slots, all variable columns empty.
    pub(crate) fn initial_region(&self) -> Vec<u8> {
        let mut region = vec![0u8; self.size()];
        let empty_end = (self.size() as u32).to_le_bytes();
        for i in 0..self.num_variable {
            let at = self.var_table_offset() + i * VAR_OFFSET_LEN;
            region[at..at + VAR_OFFSET_LEN].copy_from_slice(&empty_end);
        }
        region
    }
}
