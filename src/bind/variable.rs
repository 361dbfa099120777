//! Typed value holders and the bind variables that own them.

use crate::access::sentinel::{
    is_double_null, is_int_null, is_long_null, BOOLEAN_NULL, BYTE_NULL, DATE_NULL, DOUBLE_NULL,
    INT_NULL, LONG_NULL, SHORT_NULL, TIMESTAMP_NULL,
};
use crate::access::{DataType, Value};
use crate::bind::convert;
use crate::bind::error::{BindError, BindResult};
use crate::bind::key::{BindKey, SlotId};
use crate::expression::function::{Clearable, ScalarFunction};
use crate::expression::ExpressionResult;

/// Storage for a single bound value of one scalar kind.
///
/// The variant is the holder's type tag and never changes once the holder
/// exists; only the payload is rewritten by binds and `clear`. A payload
/// equal to the kind's sentinel means "no value".
#[derive(Debug, Clone, PartialEq)]
pub enum BindHolder {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Double(f64),
    Varchar(Option<String>),
    Timestamp(i64),
    Date(i64),
}

impl BindHolder {
    /// Create a holder of `data_type` set to that kind's sentinel
    pub fn new(data_type: DataType) -> Self {
        match data_type {
            DataType::Boolean => BindHolder::Boolean(BOOLEAN_NULL),
            DataType::Int8 => BindHolder::Byte(BYTE_NULL),
            DataType::Int16 => BindHolder::Short(SHORT_NULL),
            DataType::Int32 => BindHolder::Int(INT_NULL),
            DataType::Int64 => BindHolder::Long(LONG_NULL),
            DataType::Float64 => BindHolder::Double(DOUBLE_NULL),
            DataType::Varchar => BindHolder::Varchar(None),
            DataType::Timestamp => BindHolder::Timestamp(TIMESTAMP_NULL),
            DataType::Date => BindHolder::Date(DATE_NULL),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            BindHolder::Boolean(_) => DataType::Boolean,
            BindHolder::Byte(_) => DataType::Int8,
            BindHolder::Short(_) => DataType::Int16,
            BindHolder::Int(_) => DataType::Int32,
            BindHolder::Long(_) => DataType::Int64,
            BindHolder::Double(_) => DataType::Float64,
            BindHolder::Varchar(_) => DataType::Varchar,
            BindHolder::Timestamp(_) => DataType::Timestamp,
            BindHolder::Date(_) => DataType::Date,
        }
    }

    /// Current value, independent of any row.
    ///
    /// Nullable kinds holding their sentinel read as `Value::Null`.
    #[inline]
    pub fn read(&self) -> Value {
        match self {
            BindHolder::Boolean(v) => Value::Boolean(*v),
            BindHolder::Byte(v) => Value::Int8(*v),
            BindHolder::Short(v) => Value::Int16(*v),
            BindHolder::Int(v) if is_int_null(*v) => Value::Null,
            BindHolder::Int(v) => Value::Int32(*v),
            BindHolder::Long(v) if is_long_null(*v) => Value::Null,
            BindHolder::Long(v) => Value::Int64(*v),
            BindHolder::Double(v) if is_double_null(*v) => Value::Null,
            BindHolder::Double(v) => Value::Float64(*v),
            BindHolder::Varchar(Some(s)) => Value::String(s.clone()),
            BindHolder::Varchar(None) => Value::Null,
            BindHolder::Timestamp(v) if is_long_null(*v) => Value::Null,
            BindHolder::Timestamp(v) => Value::Timestamp(*v),
            BindHolder::Date(v) if is_long_null(*v) => Value::Null,
            BindHolder::Date(v) => Value::Date(*v),
        }
    }

    pub fn is_null(&self) -> bool {
        self.read().is_null()
    }

    pub fn get_bool(&self) -> bool {
        match self {
            BindHolder::Boolean(v) => *v,
            _ => BOOLEAN_NULL,
        }
    }

    pub fn get_byte(&self) -> i8 {
        match self {
            BindHolder::Byte(v) => *v,
            _ => BYTE_NULL,
        }
    }

    pub fn get_short(&self) -> i16 {
        match self {
            BindHolder::Byte(v) => *v as i16,
            BindHolder::Short(v) => *v,
            _ => SHORT_NULL,
        }
    }

    pub fn get_int(&self) -> i32 {
        match self {
            BindHolder::Byte(v) => *v as i32,
            BindHolder::Short(v) => *v as i32,
            BindHolder::Int(v) => *v,
            _ => INT_NULL,
        }
    }

    /// LONG view of any integer or temporal holder; a NULL INT widens to the LONG sentinel
    pub fn get_long(&self) -> i64 {
        match self {
            BindHolder::Byte(v) => *v as i64,
            BindHolder::Short(v) => *v as i64,
            BindHolder::Int(v) if is_int_null(*v) => LONG_NULL,
            BindHolder::Int(v) => *v as i64,
            BindHolder::Long(v) | BindHolder::Timestamp(v) | BindHolder::Date(v) => *v,
            _ => LONG_NULL,
        }
    }

    pub fn get_double(&self) -> f64 {
        match self {
            BindHolder::Double(v) => *v,
            BindHolder::Byte(v) => *v as f64,
            BindHolder::Short(v) => *v as f64,
            BindHolder::Int(v) if !is_int_null(*v) => *v as f64,
            BindHolder::Long(v) if !is_long_null(*v) => *v as f64,
            _ => DOUBLE_NULL,
        }
    }

    /// Borrowed string payload, `None` when unset or not a VARCHAR holder
    pub fn get_str(&self) -> Option<&str> {
        match self {
            BindHolder::Varchar(v) => v.as_deref(),
            _ => None,
        }
    }

    pub fn get_timestamp(&self) -> i64 {
        match self {
            BindHolder::Timestamp(v) => *v,
            BindHolder::Date(v) if !is_long_null(*v) => v.saturating_mul(1000),
            _ => TIMESTAMP_NULL,
        }
    }

    pub fn get_date(&self) -> i64 {
        match self {
            BindHolder::Date(v) => *v,
            _ => DATE_NULL,
        }
    }

    /// Store `value`, converting it to this holder's kind.
    ///
    /// On failure the holder is untouched and the offending kind is returned.
    fn assign(&mut self, value: Value) -> Result<(), DataType> {
        let actual = value.data_type();
        let converted = match convert::convert(value, self.data_type()) {
            Some(v) => v,
            None => return Err(actual.unwrap_or(self.data_type())),
        };
        match (self, converted) {
            (holder, Value::Null) => holder.clear(),
            (BindHolder::Boolean(slot), Value::Boolean(v)) => *slot = v,
            (BindHolder::Byte(slot), Value::Int8(v)) => *slot = v,
            (BindHolder::Short(slot), Value::Int16(v)) => *slot = v,
            (BindHolder::Int(slot), Value::Int32(v)) => *slot = v,
            (BindHolder::Long(slot), Value::Int64(v)) => *slot = v,
            (BindHolder::Double(slot), Value::Float64(v)) => *slot = v,
            (BindHolder::Varchar(slot), Value::String(v)) => *slot = Some(v),
            (BindHolder::Timestamp(slot), Value::Timestamp(v)) => *slot = v,
            (BindHolder::Date(slot), Value::Date(v)) => *slot = v,
            (holder, other) => {
                unreachable!("convert produced {:?} for {:?}", other, holder.data_type())
            }
        }
        Ok(())
    }
}

impl Clearable for BindHolder {
    fn clear(&mut self) {
        *self = BindHolder::new(self.data_type());
    }
}

/// One parameter slot of a prepared statement.
///
/// The type tag is unresolved until the first successful bind (or define)
/// and immutable afterwards. An unresolved variable reads as NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct BindVariable {
    slot: SlotId,
    key: BindKey,
    holder: Option<BindHolder>,
}

impl BindVariable {
    pub(crate) fn new(slot: SlotId, key: BindKey) -> Self {
        Self {
            slot,
            key,
            holder: None,
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn key(&self) -> &BindKey {
        &self.key
    }

    pub fn holder(&self) -> Option<&BindHolder> {
        self.holder.as_ref()
    }

    /// Resolved type tag, if any
    pub fn data_type(&self) -> Option<DataType> {
        self.holder.as_ref().map(BindHolder::data_type)
    }

    /// Current value. Never fails and never depends on a row.
    #[inline]
    pub fn read(&self) -> Value {
        match &self.holder {
            Some(holder) => holder.read(),
            None => Value::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        self.holder.as_ref().map_or(true, BindHolder::is_null)
    }

    /// Fix the type tag without supplying a value.
    pub(crate) fn define(&mut self, data_type: DataType) -> BindResult<()> {
        match &self.holder {
            None => {
                self.holder = Some(BindHolder::new(data_type));
                Ok(())
            }
            Some(holder) if holder.data_type() == data_type => Ok(()),
            Some(holder) => Err(BindError::TypeMismatch {
                key: self.key.clone(),
                expected: holder.data_type(),
                actual: data_type,
            }),
        }
    }

    /// Write `value`, resolving the type tag on first bind.
    pub(crate) fn bind(&mut self, value: Value) -> BindResult<()> {
        match &mut self.holder {
            Some(holder) => holder.assign(value).map_err(|actual| BindError::TypeMismatch {
                key: self.key.clone(),
                expected: holder.data_type(),
                actual,
            }),
            None => {
                let Some(data_type) = value.data_type() else {
                    // NULL carries no kind, the slot stays unresolved
                    return Ok(());
                };
                let mut holder = BindHolder::new(data_type);
                holder
                    .assign(value)
                    .map_err(|actual| BindError::TypeMismatch {
                        key: self.key.clone(),
                        expected: data_type,
                        actual,
                    })?;
                self.holder = Some(holder);
                Ok(())
            }
        }
    }

    /// Write a text-format value, parsing it per the type tag.
    pub(crate) fn bind_text(&mut self, text: Option<&str>) -> BindResult<()> {
        let Some(text) = text else {
            return self.bind(Value::Null);
        };
        let value = match self.data_type() {
            Some(data_type) => {
                convert::parse_text(text, data_type).ok_or_else(|| BindError::InvalidText {
                    key: self.key.clone(),
                    expected: data_type,
                    text: text.to_string(),
                })?
            }
            None => convert::infer_text(text),
        };
        self.bind(value)
    }

    /// Reference used to embed this variable in an expression tree
    pub fn to_ref(&self) -> BindVariableRef {
        BindVariableRef {
            slot: self.slot,
            key: self.key.clone(),
        }
    }
}

impl Clearable for BindVariable {
    fn clear(&mut self) {
        if let Some(holder) = &mut self.holder {
            holder.clear();
        }
    }
}

impl ScalarFunction for BindVariable {
    fn data_type(&self) -> Option<DataType> {
        BindVariable::data_type(self)
    }

    #[inline]
    fn get_value(&self, _row: &[Value]) -> ExpressionResult<Value> {
        Ok(self.read())
    }

    fn is_runtime_constant(&self) -> bool {
        true
    }

    fn is_read_thread_safe(&self) -> bool {
        true
    }
}

/// Expression-tree handle for a bind variable.
///
/// The tree stores the slot id, not the holder, so the registry can keep
/// being rebound between executions of the same compiled tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindVariableRef {
    pub slot: SlotId,
    pub key: BindKey,
}
