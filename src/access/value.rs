use std::cmp::Ordering;
use std::fmt;
use time::macros::format_description;
use time::OffsetDateTime;

/// Data types supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float64,
    Varchar,
    Timestamp,
    Date,
}

impl DataType {
    /// SQL-facing name of the type
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Int8 => "BYTE",
            DataType::Int16 => "SHORT",
            DataType::Int32 => "INT",
            DataType::Int64 => "LONG",
            DataType::Float64 => "DOUBLE",
            DataType::Varchar => "VARCHAR",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Date => "DATE",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || *self == DataType::Float64
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Timestamp | DataType::Date)
    }

    /// Result type of an arithmetic operation over two numeric types.
    ///
    /// Integer arithmetic is performed at least at INT width, the same way
    /// SQL promotes small integer operands.
    pub fn widen(left: DataType, right: DataType) -> Option<DataType> {
        if !left.is_numeric() || !right.is_numeric() {
            return None;
        }
        if left == DataType::Float64 || right == DataType::Float64 {
            return Some(DataType::Float64);
        }
        if left == DataType::Int64 || right == DataType::Int64 {
            Some(DataType::Int64)
        } else {
            Some(DataType::Int32)
        }
    }

    /// Whether values of the two types can be ordered against each other
    pub fn is_comparable_with(&self, other: DataType) -> bool {
        *self == other
            || (self.is_numeric() && other.is_numeric())
            || (self.is_temporal() && other.is_temporal())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values that flow through expression evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    /// Microseconds since the Unix epoch
    Timestamp(i64),
    /// Milliseconds since the Unix epoch
    Date(i64),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int8(_) => Some(DataType::Int8),
            Value::Int16(_) => Some(DataType::Int16),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::Varchar),
            Value::Timestamp(_) => Some(DataType::Timestamp),
            Value::Date(_) => Some(DataType::Date),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer payload widened to i64, for integer kinds only
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(v) => Some(*v as i64),
            Value::Int16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric payload as f64, for integer and floating kinds
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Temporal payload normalised to microseconds
    fn as_micros(&self) -> Option<i64> {
        match self {
            Value::Timestamp(v) => Some(*v),
            Value::Date(v) => v.checked_mul(1000),
            _ => None,
        }
    }

    /// Parse a numeric literal into the narrowest kind that represents it exactly.
    ///
    /// Integers resolve to INT, then LONG; everything else that parses as a
    /// finite number resolves to DOUBLE.
    pub fn from_numeric_literal(text: &str) -> Option<Value> {
        if let Ok(i) = text.parse::<i32>() {
            return Some(Value::Int32(i));
        }
        if let Ok(l) = text.parse::<i64>() {
            return Some(Value::Int64(l));
        }
        match text.parse::<f64>() {
            Ok(d) if d.is_finite() => Some(Value::Float64(d)),
            _ => None,
        }
    }

    /// Order two non-NULL values, promoting across numeric and temporal kinds.
    ///
    /// Returns `None` when the kinds are not comparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Float64(_), _) | (_, Value::Float64(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (Value::Timestamp(_) | Value::Date(_), _) => {
                Some(self.as_micros()?.cmp(&other.as_micros()?))
            }
            _ => Some(self.as_i64()?.cmp(&other.as_i64()?)),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Timestamp(micros) => {
                let formatted = OffsetDateTime::from_unix_timestamp_nanos(*micros as i128 * 1000)
                    .ok()
                    .and_then(|dt| {
                        dt.format(format_description!(
                            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
                        ))
                        .ok()
                    });
                match formatted {
                    Some(s) => f.write_str(&s),
                    None => write!(f, "{}", micros),
                }
            }
            Value::Date(millis) => {
                let formatted =
                    OffsetDateTime::from_unix_timestamp_nanos(*millis as i128 * 1_000_000)
                        .ok()
                        .and_then(|dt| {
                            dt.date()
                                .format(format_description!("[year]-[month]-[day]"))
                                .ok()
                        });
                match formatted {
                    Some(s) => f.write_str(&s),
                    None => write!(f, "{}", millis),
                }
            }
        }
    }
}
