// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Backing-store growth strategies.

use crate::config::DEFAULT_GROWTH_FACTOR;

/// Growth strategy injected into a [`RowBuffer`](super::RowBuffer).
///
/// Called whenever a write needs more than the current capacity. Returns a
/// new backing store holding a copy of `current` with capacity of at least
/// `requested` bytes, or `None` to refuse (the write then fails with
/// `InsufficientSpace`).
pub trait RowResizer: Send {
    fn ensure_capacity(&mut self, current: &[u8], requested: usize) -> Option<Vec<u8>>;
}

/// Heap resizer with an optional hard ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryResizer {
    max_capacity: Option<usize>,
    growth_factor: usize,
}

impl MemoryResizer {
    pub fn new(max_capacity: Option<usize>) -> Self {
        Self {
            max_capacity,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }

    /// Unbounded resizer.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn with_growth_factor(mut self, factor: usize) -> Self {
        self.growth_factor = factor.max(2);
        self
    }

    pub fn max_capacity(&self) -> Option<usize> {
        self.max_capacity
    }
}

impl Default for MemoryResizer {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RowResizer for MemoryResizer {
    fn ensure_capacity(&mut self, current: &[u8], requested: usize) -> Option<Vec<u8>> {
        if let Some(max) = self.max_capacity {
            if requested > max {
                log::warn!(
                    "[row] resizer refused growth to {} bytes (max {})",
                    requested,
                    max
                );
                return None;
            }
        }
        let mut capacity = current.len().saturating_mul(self.growth_factor).max(requested);
        if let Some(max) = self.max_capacity {
            capacity = capacity.min(max);
        }
        log::trace!("[row] growing backing store {} -> {} bytes", current.len(), capacity);
        let mut grown = Vec::with_capacity(capacity);
        grown.extend_from_slice(current);
        Some(grown)
    }
}
