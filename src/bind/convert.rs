//! Conversion rules applied when a value is bound into an already-typed slot.
//!
//! A slot's type tag is fixed by its first bind (or by an explicit define).
//! Later binds must supply a value convertible into that tag:
//!
//! | slot tag | accepted value kinds |
//! |---|---|
//! | BOOLEAN | BOOLEAN |
//! | BYTE, SHORT, INT | any integer kind whose value fits exactly |
//! | LONG | any integer kind |
//! | DOUBLE | any integer kind, DOUBLE |
//! | VARCHAR | VARCHAR |
//! | TIMESTAMP | TIMESTAMP, DATE, any integer kind (microseconds) |
//! | DATE | DATE, any integer kind (milliseconds) |
//!
//! NULL converts to every kind. Integer narrowing is exact, but an integer
//! bound into DOUBLE is rounded to the nearest `f64` beyond 2^53.

use crate::access::{DataType, Value};
use time::macros::format_description;
use time::{Date, PrimitiveDateTime};

/// Convert `value` into the kind stored by a `target`-typed holder.
///
/// Returns `None` when the value is not convertible.
pub fn convert(value: Value, target: DataType) -> Option<Value> {
    match (target, value) {
        (_, Value::Null) => Some(Value::Null),
        (DataType::Boolean, Value::Boolean(b)) => Some(Value::Boolean(b)),
        (DataType::Int8, v) => v.as_i64().and_then(|i| i8::try_from(i).ok()).map(Value::Int8),
        (DataType::Int16, v) => v
            .as_i64()
            .and_then(|i| i16::try_from(i).ok())
            .map(Value::Int16),
        (DataType::Int32, v) => v
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(Value::Int32),
        (DataType::Int64, v) => v.as_i64().map(Value::Int64),
        (DataType::Float64, Value::Float64(d)) => Some(Value::Float64(d)),
        (DataType::Float64, v) => v.as_i64().map(|i| Value::Float64(i as f64)),
        (DataType::Varchar, Value::String(s)) => Some(Value::String(s)),
        (DataType::Timestamp, Value::Timestamp(t)) => Some(Value::Timestamp(t)),
        (DataType::Timestamp, Value::Date(d)) => d.checked_mul(1000).map(Value::Timestamp),
        (DataType::Timestamp, v) => v.as_i64().map(Value::Timestamp),
        (DataType::Date, Value::Date(d)) => Some(Value::Date(d)),
        (DataType::Date, v) => v.as_i64().map(Value::Date),
        _ => None,
    }
}

/// Parse a text-format parameter according to the slot's type tag.
pub fn parse_text(text: &str, target: DataType) -> Option<Value> {
    let trimmed = text.trim();
    match target {
        DataType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "on" => Some(Value::Boolean(true)),
            "false" | "f" | "0" | "no" | "off" => Some(Value::Boolean(false)),
            _ => None,
        },
        DataType::Int8 => trimmed.parse::<i8>().ok().map(Value::Int8),
        DataType::Int16 => trimmed.parse::<i16>().ok().map(Value::Int16),
        DataType::Int32 => trimmed.parse::<i32>().ok().map(Value::Int32),
        DataType::Int64 => trimmed.parse::<i64>().ok().map(Value::Int64),
        DataType::Float64 => trimmed.parse::<f64>().ok().map(Value::Float64),
        DataType::Varchar => Some(Value::String(text.to_string())),
        DataType::Timestamp => parse_timestamp(trimmed)
            .or_else(|| trimmed.parse::<i64>().ok())
            .map(Value::Timestamp),
        DataType::Date => parse_date(trimmed)
            .or_else(|| trimmed.parse::<i64>().ok())
            .map(Value::Date),
    }
}

/// Resolve an untyped text parameter.
///
/// Numeric text takes the narrowest literal kind that represents it
/// exactly; anything else is bound as VARCHAR.
pub fn infer_text(text: &str) -> Value {
    Value::from_numeric_literal(text.trim()).unwrap_or_else(|| Value::String(text.to_string()))
}

/// Parse `YYYY-MM-DD[ |T]HH:MM:SS[.ffffff]` or `YYYY-MM-DD` into UTC microseconds.
pub fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.replacen('T', " ", 1);
    let dt = PrimitiveDateTime::parse(
        &text,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            &text,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
    })
    .or_else(|_| {
        Date::parse(&text, format_description!("[year]-[month]-[day]")).map(|d| d.midnight())
    })
    .ok()?;
    i64::try_from(dt.assume_utc().unix_timestamp_nanos() / 1000).ok()
}

/// Parse `YYYY-MM-DD` into UTC milliseconds.
pub fn parse_date(text: &str) -> Option<i64> {
    let date = Date::parse(text, format_description!("[year]-[month]-[day]")).ok()?;
    date.midnight()
        .assume_utc()
        .unix_timestamp()
        .checked_mul(1000)
}
