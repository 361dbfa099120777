//! Decoding of PostgreSQL extended-protocol parameters.
//!
//! A Parse message carries one type OID per parameter (0 = unspecified),
//! and a Bind message carries, per parameter, a format code (0 = text,
//! 1 = binary) and an optional byte payload (absent = NULL). This module
//! turns those into registry defines and typed binds.

use crate::access::{DataType, Value};
use crate::bind::convert;
use crate::bind::error::{BindError, BindResult};
use crate::bind::key::BindKey;
use crate::bind::registry::BindVariables;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

pub mod type_oids {
    pub const UNSPECIFIED: i32 = 0;
    pub const BOOL: i32 = 16;
    pub const INT8: i32 = 20;
    pub const INT2: i32 = 21;
    pub const INT4: i32 = 23;
    pub const TEXT: i32 = 25;
    pub const FLOAT4: i32 = 700;
    pub const FLOAT8: i32 = 701;
    pub const VARCHAR: i32 = 1043;
    pub const DATE: i32 = 1082;
    pub const TIMESTAMP: i32 = 1114;
}

/// Microseconds between 1970-01-01 and the PostgreSQL epoch 2000-01-01
const PG_EPOCH_OFFSET_MICROS: i64 = 946_684_800_000_000;
/// Days between 1970-01-01 and 2000-01-01
const PG_EPOCH_OFFSET_DAYS: i64 = 10_957;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Parameter format code from a Bind message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterFormat {
    Text,
    Binary,
}

impl ParameterFormat {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(ParameterFormat::Text),
            1 => Some(ParameterFormat::Binary),
            _ => None,
        }
    }
}

/// Engine type for a PostgreSQL type OID
pub fn data_type_for_oid(oid: i32) -> Option<DataType> {
    match oid {
        type_oids::BOOL => Some(DataType::Boolean),
        type_oids::INT2 => Some(DataType::Int16),
        type_oids::INT4 => Some(DataType::Int32),
        type_oids::INT8 => Some(DataType::Int64),
        type_oids::FLOAT4 | type_oids::FLOAT8 => Some(DataType::Float64),
        type_oids::TEXT | type_oids::VARCHAR => Some(DataType::Varchar),
        type_oids::TIMESTAMP => Some(DataType::Timestamp),
        type_oids::DATE => Some(DataType::Date),
        _ => None,
    }
}

/// PostgreSQL type OID for an engine type
pub fn oid_for_data_type(data_type: DataType) -> i32 {
    match data_type {
        DataType::Boolean => type_oids::BOOL,
        // no single-byte integer type on the wire
        DataType::Int8 | DataType::Int16 => type_oids::INT2,
        DataType::Int32 => type_oids::INT4,
        DataType::Int64 => type_oids::INT8,
        DataType::Float64 => type_oids::FLOAT8,
        DataType::Varchar => type_oids::VARCHAR,
        DataType::Timestamp => type_oids::TIMESTAMP,
        DataType::Date => type_oids::DATE,
    }
}

/// Apply the parameter types of a Parse message to positional slots `$1..`.
///
/// Unspecified (0) entries leave the slot to be typed by its first bind.
pub fn define_from_oids(vars: &mut BindVariables, oids: &[i32]) -> BindResult<()> {
    for (i, oid) in oids.iter().enumerate() {
        let index = i + 1;
        vars.declare_index(index)?;
        if *oid == type_oids::UNSPECIFIED {
            continue;
        }
        let data_type = data_type_for_oid(*oid).ok_or(BindError::UnsupportedType { oid: *oid })?;
        vars.define_index(index, data_type)?;
    }
    Ok(())
}

/// Decode a binary-format payload of type `oid`.
pub fn decode_binary(key: &BindKey, oid: i32, raw: &[u8]) -> BindResult<Value> {
    let malformed = |reason: String| BindError::MalformedParameter {
        key: key.clone(),
        reason,
    };
    let expect_len = |len: usize| {
        if raw.len() == len {
            Ok(())
        } else {
            Err(malformed(format!(
                "expected {} bytes for oid {}, got {}",
                len,
                oid,
                raw.len()
            )))
        }
    };
    let mut cursor = Cursor::new(raw);
    let value = match oid {
        type_oids::BOOL => {
            expect_len(1)?;
            Value::Boolean(raw[0] != 0)
        }
        type_oids::INT2 => {
            expect_len(2)?;
            Value::Int16(cursor.read_i16::<BigEndian>().map_err(|e| malformed(e.to_string()))?)
        }
        type_oids::INT4 => {
            expect_len(4)?;
            Value::Int32(cursor.read_i32::<BigEndian>().map_err(|e| malformed(e.to_string()))?)
        }
        type_oids::INT8 => {
            expect_len(8)?;
            Value::Int64(cursor.read_i64::<BigEndian>().map_err(|e| malformed(e.to_string()))?)
        }
        type_oids::FLOAT4 => {
            expect_len(4)?;
            let v = cursor
                .read_f32::<BigEndian>()
                .map_err(|e| malformed(e.to_string()))?;
            Value::Float64(v as f64)
        }
        type_oids::FLOAT8 => {
            expect_len(8)?;
            Value::Float64(cursor.read_f64::<BigEndian>().map_err(|e| malformed(e.to_string()))?)
        }
        type_oids::TEXT | type_oids::VARCHAR => Value::String(
            String::from_utf8(raw.to_vec()).map_err(|e| malformed(e.to_string()))?,
        ),
        type_oids::TIMESTAMP => {
            expect_len(8)?;
            let pg_micros = cursor
                .read_i64::<BigEndian>()
                .map_err(|e| malformed(e.to_string()))?;
            let micros = pg_micros
                .checked_add(PG_EPOCH_OFFSET_MICROS)
                .ok_or_else(|| malformed("timestamp out of range".to_string()))?;
            Value::Timestamp(micros)
        }
        type_oids::DATE => {
            expect_len(4)?;
            let pg_days = cursor
                .read_i32::<BigEndian>()
                .map_err(|e| malformed(e.to_string()))?;
            Value::Date((pg_days as i64 + PG_EPOCH_OFFSET_DAYS) * MILLIS_PER_DAY)
        }
        other => return Err(BindError::UnsupportedType { oid: other }),
    };
    Ok(value)
}

/// Decode one Bind-message parameter into a value without binding it.
///
/// Text payloads are parsed as the type named by `oid`, or inferred when
/// the OID is unspecified. A missing payload is NULL.
pub fn decode_parameter(
    key: &BindKey,
    oid: i32,
    format: i16,
    raw: Option<&[u8]>,
) -> BindResult<Value> {
    let format = ParameterFormat::from_code(format).ok_or_else(|| BindError::MalformedParameter {
        key: key.clone(),
        reason: format!("unknown format code {}", format),
    })?;
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };
    match format {
        ParameterFormat::Binary => decode_binary(key, oid, raw),
        ParameterFormat::Text => {
            let text = std::str::from_utf8(raw).map_err(|e| BindError::MalformedParameter {
                key: key.clone(),
                reason: e.to_string(),
            })?;
            if oid == type_oids::UNSPECIFIED {
                return Ok(convert::infer_text(text));
            }
            let data_type = data_type_for_oid(oid).ok_or(BindError::UnsupportedType { oid })?;
            convert::parse_text(text, data_type).ok_or_else(|| BindError::InvalidText {
                key: key.clone(),
                expected: data_type,
                text: text.to_string(),
            })
        }
    }
}

/// Bind every parameter of one Bind message to positional slots `$1..`.
///
/// `oids` are the types announced by the Parse message; a missing or
/// unspecified entry falls back to the slot's own type. `formats` follows
/// the protocol: empty means all text, one code applies to every
/// parameter, otherwise one code per parameter.
///
/// The message must supply exactly one parameter per declared slot. All
/// parameters are decoded and bound against a copy of the registry, which
/// replaces `vars` only when every one succeeded, so a failing message
/// leaves the previous round's values in place.
pub fn bind_parameters(
    vars: &mut BindVariables,
    oids: &[i32],
    formats: &[i16],
    params: &[Option<&[u8]>],
) -> BindResult<()> {
    if params.len() != vars.positional_count() {
        return Err(BindError::ParameterCount {
            expected: vars.positional_count(),
            actual: params.len(),
        });
    }
    if formats.len() > 1 && formats.len() != params.len() {
        return Err(BindError::FormatCount {
            formats: formats.len(),
            params: params.len(),
        });
    }

    let values = params
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let index = i + 1;
            let key = BindKey::index(index);
            let format = match formats {
                [] => 0,
                [single] => *single,
                many => many[i],
            };
            let oid = match oids.get(i) {
                Some(oid) if *oid != type_oids::UNSPECIFIED => *oid,
                _ => vars
                    .lookup(&key)?
                    .data_type()
                    .map(oid_for_data_type)
                    .unwrap_or(type_oids::UNSPECIFIED),
            };
            decode_parameter(&key, oid, format, *raw)
        })
        .collect::<BindResult<Vec<Value>>>()?;

    let mut staged = vars.clone();
    for (i, value) in values.into_iter().enumerate() {
        staged.bind_by_index(i + 1, value)?;
    }
    *vars = staged;
    Ok(())
}
