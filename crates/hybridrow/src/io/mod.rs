// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Forward-only reader and writer over a row.
//!
//! Both wrap a [`RowCursor`](crate::row::RowCursor) and walk one scope at a
//! time. Nested scopes are handled by callbacks that receive a reader or
//! writer bound to the child scope; when the callback returns, the parent
//! is still positioned on the child item and the next call moves past it.

mod reader;
mod writer;

pub use reader::RowReader;
pub use writer::RowWriter;
