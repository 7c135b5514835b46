// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Row header: `[version:1][SchemaId:4]`.

use crate::config::HEADER_SIZE;
use crate::error::{RowError, RowResult};
use crate::schema::SchemaId;

/// Wire format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HybridRowVersion {
    V1 = 0x81,
}

impl HybridRowVersion {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x81 => Some(Self::V1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HybridRowHeader {
    pub version: HybridRowVersion,
    pub schema_id: SchemaId,
}

impl HybridRowHeader {
    pub const fn new(version: HybridRowVersion, schema_id: SchemaId) -> Self {
        Self { version, schema_id }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0] = self.version as u8;
        out[1..].copy_from_slice(&self.schema_id.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> RowResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(RowError::malformed("row shorter than header"));
        }
        let version = HybridRowVersion::from_u8(bytes[0]).ok_or_else(|| {
            RowError::SchemaMismatch(format!("unsupported row version 0x{:02x}", bytes[0]))
        })?;
        let mut id = [0u8; 4];
        id.copy_from_slice(&bytes[1..HEADER_SIZE]);
        Ok(Self {
            version,
            schema_id: SchemaId::from_le_bytes(id),
        })
    }
}
