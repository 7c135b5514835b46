// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive codecs: fixed slots, variable columns and sparse bodies.

use super::Item;
use crate::config::VAR_OFFSET_LEN;
use crate::error::{RowError, RowResult};
use crate::layout::{LayoutCode, LayoutColumn, LayoutType};
use crate::row::value::{DateTime, Decimal, Float128, MongoDbObjectId, UnixDateTime};
use crate::row::{varint, RowBuffer, RowCursor, Value};
use uuid::Uuid;

fn mismatch(ty: LayoutType, value: &Value) -> RowError {
    RowError::TypeMismatch {
        expected: ty.code(),
        found: value.code(),
    }
}

fn array<const N: usize>(bytes: &[u8]) -> RowResult<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| RowError::malformed("fixed value has the wrong width"))
}

/// Tag stored for a sparse primitive (booleans carry their value in the tag).
pub(super) fn tag_of(ty: LayoutType, value: &Value) -> LayoutCode {
    match (ty, value) {
        (LayoutType::Boolean, Value::Bool(false)) => LayoutCode::BooleanFalse,
        _ => ty.code(),
    }
}

fn encode_fixed(ty: LayoutType, value: &Value, out: &mut Vec<u8>) -> RowResult<()> {
    use LayoutType as T;
    match (ty, value) {
        (T::Null, Value::Null) => {}
        (T::Boolean, Value::Bool(v)) => out.push(u8::from(*v)),
        (T::Int8, Value::Int8(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (T::Int16, Value::Int16(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (T::Int32, Value::Int32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (T::Int64, Value::Int64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (T::UInt8, Value::UInt8(v)) => out.push(*v),
        (T::UInt16, Value::UInt16(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (T::UInt32, Value::UInt32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (T::UInt64, Value::UInt64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (T::Float32, Value::Float32(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (T::Float64, Value::Float64(v)) => out.extend_from_slice(&v.to_le_bytes()),
        (T::Float128, Value::Float128(v)) => {
            out.extend_from_slice(&v.low.to_le_bytes());
            out.extend_from_slice(&v.high.to_le_bytes());
        }
        (T::Decimal, Value::Decimal(v)) => {
            if !v.is_representable() {
                return Err(RowError::TooBig { capacity: 16 });
            }
            out.extend_from_slice(&v.to_bytes());
        }
        (T::DateTime, Value::DateTime(v)) => out.extend_from_slice(&v.0.to_le_bytes()),
        (T::UnixDateTime, Value::UnixDateTime(v)) => out.extend_from_slice(&v.0.to_le_bytes()),
        (T::Guid, Value::Guid(v)) => out.extend_from_slice(v.as_bytes()),
        (T::MongoDbObjectId, Value::ObjectId(v)) => out.extend_from_slice(&v.0),
        _ => return Err(mismatch(ty, value)),
    }
    Ok(())
}

fn decode_fixed(ty: LayoutType, bytes: &[u8]) -> RowResult<Value> {
    use LayoutType as T;
    Ok(match ty {
        T::Null => Value::Null,
        T::Boolean => Value::Bool(array::<1>(bytes)?[0] != 0),
        T::Int8 => Value::Int8(i8::from_le_bytes(array(bytes)?)),
        T::Int16 => Value::Int16(i16::from_le_bytes(array(bytes)?)),
        T::Int32 => Value::Int32(i32::from_le_bytes(array(bytes)?)),
        T::Int64 => Value::Int64(i64::from_le_bytes(array(bytes)?)),
        T::UInt8 => Value::UInt8(array::<1>(bytes)?[0]),
        T::UInt16 => Value::UInt16(u16::from_le_bytes(array(bytes)?)),
        T::UInt32 => Value::UInt32(u32::from_le_bytes(array(bytes)?)),
        T::UInt64 => Value::UInt64(u64::from_le_bytes(array(bytes)?)),
        T::Float32 => Value::Float32(f32::from_le_bytes(array(bytes)?)),
        T::Float64 => Value::Float64(f64::from_le_bytes(array(bytes)?)),
        T::Float128 => {
            let raw: [u8; 16] = array(bytes)?;
            let low = u64::from_le_bytes(array(&raw[..8])?);
            let high = u64::from_le_bytes(array(&raw[8..])?);
            Value::Float128(Float128 { low, high })
        }
        T::Decimal => Value::Decimal(Decimal::from_bytes(array(bytes)?)),
        T::DateTime => Value::DateTime(DateTime(i64::from_le_bytes(array(bytes)?))),
        T::UnixDateTime => Value::UnixDateTime(UnixDateTime(i64::from_le_bytes(array(bytes)?))),
        T::Guid => Value::Guid(Uuid::from_bytes(array(bytes)?)),
        T::MongoDbObjectId => Value::ObjectId(MongoDbObjectId(array(bytes)?)),
        _ => return Err(RowError::InvalidOperation("type has no fixed encoding")),
    })
}

fn encode_variable(ty: LayoutType, value: &Value, out: &mut Vec<u8>) -> RowResult<()> {
    match (ty, value) {
        (LayoutType::Utf8, Value::Utf8(v)) => out.extend_from_slice(v.as_bytes()),
        (LayoutType::Binary, Value::Binary(v)) => out.extend_from_slice(v),
        (LayoutType::VarInt, Value::VarInt(v)) => varint::put_varint(out, *v),
        (LayoutType::VarUInt, Value::VarUInt(v)) => varint::put_varuint(out, *v),
        _ => return Err(mismatch(ty, value)),
    }
    Ok(())
}

fn decode_variable(ty: LayoutType, bytes: &[u8]) -> RowResult<Value> {
    let exact = |used: usize| {
        if used == bytes.len() {
            Ok(())
        } else {
            Err(RowError::malformed("trailing bytes after varint"))
        }
    };
    Ok(match ty {
        LayoutType::Utf8 => Value::Utf8(
            std::str::from_utf8(bytes)
                .map_err(|_| RowError::malformed("utf8 column is not valid utf8"))?
                .to_string(),
        ),
        LayoutType::Binary => Value::Binary(bytes.to_vec()),
        LayoutType::VarInt => {
            let (v, used) = varint::get_varint(bytes)?;
            exact(used)?;
            Value::VarInt(v)
        }
        LayoutType::VarUInt => {
            let (v, used) = varint::get_varuint(bytes)?;
            exact(used)?;
            Value::VarUInt(v)
        }
        _ => return Err(RowError::InvalidOperation("type has no variable encoding")),
    })
}

/// Append the sparse body of `value`. Tagged null/bool bodies are empty.
pub(super) fn encode_body(
    ty: LayoutType,
    value: &Value,
    tagged: bool,
    out: &mut Vec<u8>,
) -> RowResult<()> {
    match (ty, value) {
        (LayoutType::Null, Value::Null) => {
            if !tagged {
                out.push(0);
            }
            Ok(())
        }
        (LayoutType::Boolean, Value::Bool(_)) if tagged => Ok(()),
        (LayoutType::Utf8, Value::Utf8(v)) => {
            varint::put_varuint(out, v.len() as u64);
            out.extend_from_slice(v.as_bytes());
            Ok(())
        }
        (LayoutType::Binary, Value::Binary(v)) => {
            varint::put_varuint(out, v.len() as u64);
            out.extend_from_slice(v);
            Ok(())
        }
        (LayoutType::VarInt | LayoutType::VarUInt, _) => encode_variable(ty, value, out),
        _ => encode_fixed(ty, value, out),
    }
}

/// Decode the primitive body of `item`.
pub(super) fn read_item(row: &RowBuffer, item: &Item) -> RowResult<Value> {
    let body = row.bytes(item.value_offset, item.end - item.value_offset)?;
    match item.layout_type {
        LayoutType::Null => Ok(Value::Null),
        LayoutType::Boolean if item.tagged => Ok(Value::Bool(item.code == LayoutCode::Boolean)),
        ty @ (LayoutType::Utf8 | LayoutType::Binary) => {
            let (_, used) = varint::get_varuint(body)?;
            decode_variable(ty, &body[used..])
        }
        ty @ (LayoutType::VarInt | LayoutType::VarUInt) => decode_variable(ty, body),
        ty => decode_fixed(ty, body),
    }
}

fn check_writable(scope: &RowCursor) -> RowResult<()> {
    assert!(scope.is_udt(), "column access outside a schematized scope");
    if scope.immutable {
        return Err(RowError::InvalidOperation("scope is immutable"));
    }
    Ok(())
}

fn is_present(row: &RowBuffer, scope: &RowCursor, column: &LayoutColumn) -> RowResult<bool> {
    match column.null_bit() {
        Some(bit) => row.is_bit_set(scope, bit),
        None => Ok(true),
    }
}

pub(super) fn read_fixed(
    ty: LayoutType,
    row: &RowBuffer,
    scope: &RowCursor,
    column: &LayoutColumn,
) -> RowResult<Value> {
    if !is_present(row, scope, column)? {
        return Err(RowError::NotFound);
    }
    let bytes = row.bytes(scope.region_start + column.offset(), column.size())?;
    match ty {
        LayoutType::Utf8 => {
            let used = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
            decode_variable(ty, &bytes[..used])
        }
        LayoutType::Binary => decode_variable(ty, bytes),
        _ => decode_fixed(ty, bytes),
    }
}

pub(super) fn write_fixed(
    ty: LayoutType,
    row: &mut RowBuffer,
    scope: &RowCursor,
    column: &LayoutColumn,
    value: &Value,
) -> RowResult<()> {
    check_writable(scope)?;
    let mut out = Vec::with_capacity(column.size());
    match ty {
        LayoutType::Utf8 | LayoutType::Binary => {
            encode_variable(ty, value, &mut out)?;
            if out.len() > column.size() {
                return Err(RowError::TooBig {
                    capacity: column.size(),
                });
            }
            out.resize(column.size(), 0);
        }
        _ => encode_fixed(ty, value, &mut out)?,
    }
    row.write_at(scope.region_start + column.offset(), &out)?;
    if let Some(bit) = column.null_bit() {
        row.set_bit(scope, bit, true)?;
    }
    Ok(())
}

pub(super) fn delete_fixed(
    row: &mut RowBuffer,
    scope: &RowCursor,
    column: &LayoutColumn,
) -> RowResult<()> {
    check_writable(scope)?;
    let bit = column
        .null_bit()
        .ok_or(RowError::InvalidOperation("column is not nullable"))?;
    if !row.is_bit_set(scope, bit)? {
        return Err(RowError::NotFound);
    }
    row.set_bit(scope, bit, false)?;
    row.write_at(scope.region_start + column.offset(), &vec![0u8; column.size()])
}

/// Absolute `[start, end)` of variable column `column`.
fn var_bounds(row: &RowBuffer, scope: &RowCursor, column: &LayoutColumn) -> RowResult<(usize, usize)> {
    let layout = &scope.layout;
    let table = scope.region_start + layout.var_table_offset();
    let slot = column.offset();
    let end = row.read_u32(table + slot * VAR_OFFSET_LEN)? as usize;
    let start = match slot {
        0 => layout.size(),
        _ => row.read_u32(table + (slot - 1) * VAR_OFFSET_LEN)? as usize,
    };
    if start < layout.size() || start > end {
        return Err(RowError::malformed("variable table is not monotonic"));
    }
    Ok((scope.region_start + start, scope.region_start + end))
}

/// Add `delta` to table entries `from..` after a column changed size.
fn shift_table(row: &mut RowBuffer, scope: &RowCursor, from: usize, delta: i64) -> RowResult<()> {
    if delta == 0 {
        return Ok(());
    }
    let layout = &scope.layout;
    let table = scope.region_start + layout.var_table_offset();
    for slot in from..layout.num_variable() {
        let at = table + slot * VAR_OFFSET_LEN;
        let shifted = i64::from(row.read_u32(at)?) + delta;
        let shifted = u32::try_from(shifted)
            .map_err(|_| RowError::malformed("variable offset out of range"))?;
        row.write_u32(at, shifted)?;
    }
    Ok(())
}

pub(super) fn read_variable(
    ty: LayoutType,
    row: &RowBuffer,
    scope: &RowCursor,
    column: &LayoutColumn,
) -> RowResult<Value> {
    if !is_present(row, scope, column)? {
        return Err(RowError::NotFound);
    }
    let (start, end) = var_bounds(row, scope, column)?;
    decode_variable(ty, row.bytes(start, end - start)?)
}

pub(super) fn write_variable(
    ty: LayoutType,
    row: &mut RowBuffer,
    scope: &RowCursor,
    column: &LayoutColumn,
    value: &Value,
) -> RowResult<()> {
    check_writable(scope)?;
    let mut out = Vec::new();
    encode_variable(ty, value, &mut out)?;
    let (start, end) = var_bounds(row, scope, column)?;
    row.splice(scope, start, end - start, &out)?;
    shift_table(row, scope, column.offset(), out.len() as i64 - (end - start) as i64)?;
    if let Some(bit) = column.null_bit() {
        row.set_bit(scope, bit, true)?;
    }
    Ok(())
}

pub(super) fn delete_variable(
    row: &mut RowBuffer,
    scope: &RowCursor,
    column: &LayoutColumn,
) -> RowResult<()> {
    check_writable(scope)?;
    if !is_present(row, scope, column)? {
        return Err(RowError::NotFound);
    }
    let (start, end) = var_bounds(row, scope, column)?;
    row.splice(scope, start, end - start, &[])?;
    shift_table(row, scope, column.offset(), -((end - start) as i64))?;
    if let Some(bit) = column.null_bit() {
        row.set_bit(scope, bit, false)?;
    }
    Ok(())
}
