// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HybridRow Configuration - Single Source of Truth
//!
//! Wire constants and buffer-growth settings live here. **NEVER hardcode
//! header or size-field widths elsewhere!**
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Compile-time wire constants (header, size fields)
//! - **Level 2 (Dynamic)**: [`RowConfig`] for buffer capacity and growth
//!
//! # Example
//!
//! ```
//! use hybridrow::config::RowConfig;
//!
//! let config = RowConfig {
//!     initial_capacity: 256,
//!     max_capacity: Some(64 * 1024),
//!     ..RowConfig::default()
//! };
//! assert_eq!(config.growth_factor, 2);
//! ```

use crate::row::MemoryResizer;
use serde::{Deserialize, Serialize};

// =======================================================================
// Wire constants
// =======================================================================

/// Header width: `[version:1][SchemaId:4]`.
pub const HEADER_SIZE: usize = 5;

/// Width of the SchemaId embedded in headers and UDT scopes.
pub const SCHEMA_ID_SIZE: usize = 4;

/// Width of the byte-size prefix carried by every scope.
pub const SCOPE_SIZE_LEN: usize = 4;

/// Width of one variable end-offset table entry.
pub const VAR_OFFSET_LEN: usize = 4;

/// Largest payload a single scope may describe.
pub const MAX_SCOPE_SIZE: usize = u32::MAX as usize;

/// Deepest type-argument nesting accepted when decoding a sparse item.
pub const MAX_TYPE_ARG_DEPTH: usize = 64;

// =======================================================================
// Runtime defaults
// =======================================================================

/// Capacity reserved for a fresh row before the first growth.
pub const DEFAULT_INITIAL_CAPACITY: usize = 128;

/// Multiplier applied to the current capacity on growth.
pub const DEFAULT_GROWTH_FACTOR: usize = 2;

/// Buffer sizing for a [`RowBuffer`](crate::row::RowBuffer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowConfig {
    /// Bytes reserved when the row is created.
    pub initial_capacity: usize,
    /// Hard ceiling on the backing store; growth beyond it fails.
    pub max_capacity: Option<usize>,
    /// Capacity multiplier on growth (values below 2 are treated as 2).
    pub growth_factor: usize,
}

impl Default for RowConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_capacity: None,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl RowConfig {
    /// Build the in-memory resizer described by this configuration.
    pub fn resizer(&self) -> MemoryResizer {
        MemoryResizer::new(self.max_capacity).with_growth_factor(self.growth_factor)
    }
}
