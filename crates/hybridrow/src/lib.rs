// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # HybridRow - schema-driven binary row format
//!
//! A compact, self-describing binary encoding for semi-structured records.
//! A row mixes three storage regions: fixed-size slots, length-addressed
//! variable columns, and a sparse chain of tagged items that may nest
//! arrays, sets, maps, tuples, tagged unions, nullables and user-defined
//! types to any depth.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use hybridrow::io::{RowReader, RowWriter};
//! use hybridrow::layout::{LayoutResolver, NamespaceResolver};
//! use hybridrow::row::{HybridRowVersion, RowBuffer};
//! use hybridrow::schema::{Namespace, PropertyType, SchemaBuilder, SchemaId, StorageKind, TypeKind};
//!
//! let person = SchemaBuilder::new("Person", SchemaId::new(1))
//!     .property("id", PropertyType::primitive(TypeKind::Int64).with_storage(StorageKind::Fixed))
//!     .property("name", PropertyType::primitive(TypeKind::Utf8).with_storage(StorageKind::Variable))
//!     .build();
//! let mut namespace = Namespace::new("demo");
//! namespace.add(person).unwrap();
//!
//! let resolver: Arc<dyn LayoutResolver> = Arc::new(NamespaceResolver::new(Arc::new(namespace)));
//! let layout = resolver.resolve(SchemaId::new(1)).unwrap();
//! let mut row = RowBuffer::with_layout(HybridRowVersion::V1, layout, resolver);
//!
//! let mut writer = RowWriter::new(&mut row);
//! writer.write_i64(Some("id"), 42).unwrap();
//! writer.write_str(Some("name"), "Ada").unwrap();
//!
//! let mut reader = RowReader::new(&row);
//! while reader.read().unwrap() {
//!     println!("{:?} = {:?}", reader.path(), reader.read_value().unwrap());
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |   io        RowReader / RowWriter (forward-only traversal facade)    |
//! +---------------------------------------------------------------------+
//! |   row       RowCursor + LayoutType dispatch (read/write/delete)     |
//! |             RowBuffer (fixed | variable | sparse regions, growth)   |
//! +---------------------------------------------------------------------+
//! |   layout    LayoutCompiler -> Layout, LayoutResolver                |
//! +---------------------------------------------------------------------+
//! |   schema    Namespace / Schema / PropertyType, SchemaHash           |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Wire Layout
//!
//! ```text
//! [version:1][SchemaId:4][presence bitmask][fixed slots][variable end table]
//! [variable bytes][sparse item][sparse item]...
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod layout;
pub mod row;
pub mod schema;

pub use error::{ResultKind, RowError, RowResult, SchemaError};
pub use io::{RowReader, RowWriter};
pub use layout::{
    Layout, LayoutCode, LayoutColumn, LayoutCompiler, LayoutResolver, LayoutType,
    NamespaceResolver, TypeArgument, TypeArgumentList,
};
pub use row::{HybridRowVersion, RowBuffer, RowCursor, UpdateOptions, Value};
pub use schema::{Namespace, PropertyType, Schema, SchemaHash, SchemaId};
