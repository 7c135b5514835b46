// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for row encoding and layout compilation.

use crate::layout::LayoutCode;
use crate::schema::{SchemaId, StorageKind, TypeKind};
use thiserror::Error;

/// Discriminant of a [`RowError`], for callers that branch on the kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    NotFound,
    TypeMismatch,
    SchemaMismatch,
    InsufficientSpace,
    InvalidOperation,
    Exists,
    TooBig,
}

/// Failure outcome of a row operation.
///
/// `NotFound` is the only kind callers are expected to recover from inline
/// (an optional field that is absent). The structural kinds are propagated
/// to whoever started the encode/decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// Absent fixed/variable/sparse value, or a nullable without a value.
    #[error("value not found")]
    NotFound,
    /// The layout code at the cursor is not the one the accessor expects.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: LayoutCode,
        found: LayoutCode,
    },
    /// SchemaId does not resolve, arity is wrong, or bytes do not match the layout.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    /// The resizer refused to grow the row.
    #[error("insufficient space: cannot grow row to {requested} bytes")]
    InsufficientSpace { requested: usize },
    /// Cursor protocol misuse or a uniqueness violation on scope close.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
    /// Insert-only write found an existing value.
    #[error("value already exists")]
    Exists,
    /// Value does not fit a fixed-length column.
    #[error("value exceeds column capacity of {capacity} bytes")]
    TooBig { capacity: usize },
}

impl RowError {
    pub fn kind(&self) -> ResultKind {
        match self {
            Self::NotFound => ResultKind::NotFound,
            Self::TypeMismatch { .. } => ResultKind::TypeMismatch,
            Self::SchemaMismatch(_) => ResultKind::SchemaMismatch,
            Self::InsufficientSpace { .. } => ResultKind::InsufficientSpace,
            Self::InvalidOperation(_) => ResultKind::InvalidOperation,
            Self::Exists => ResultKind::Exists,
            Self::TooBig { .. } => ResultKind::TooBig,
        }
    }

    /// Bytes that cannot be parsed against the expected layout.
    pub(crate) fn malformed(what: &str) -> Self {
        Self::SchemaMismatch(format!("malformed row: {}", what))
    }
}

pub type RowResult<T> = Result<T, RowError>;

/// Failure while validating a namespace or compiling a layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema {0} does not resolve in the namespace")]
    UnresolvedSchema(SchemaId),
    #[error("schema id {0} is declared more than once")]
    DuplicateSchemaId(SchemaId),
    #[error("property path '{0}' is declared more than once")]
    DuplicatePath(String),
    #[error("{kind} requires {expected} type arguments, found {found}")]
    InvalidArity {
        kind: &'static str,
        expected: &'static str,
        found: usize,
    },
    #[error("property '{path}' cannot use {storage:?} storage for {kind:?}")]
    UnsupportedStorage {
        path: String,
        storage: StorageKind,
        kind: TypeKind,
    },
    #[error("property '{path}' declares invalid length {length}")]
    InvalidLength { path: String, length: u32 },
}

impl From<SchemaError> for RowError {
    fn from(value: SchemaError) -> Self {
        Self::SchemaMismatch(value.to_string())
    }
}
