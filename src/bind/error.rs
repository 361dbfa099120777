//! Bind-time error types.

use crate::access::DataType;
use crate::bind::key::BindKey;
use thiserror::Error;

/// Errors raised while declaring, defining or binding variables.
///
/// All of them are detected synchronously inside the failing call and leave
/// the registry unchanged. Reads never fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
    #[error("Bind variable index {index} is out of range (declared: {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Undefined bind variable: :{name}")]
    UndefinedVariable { name: String },

    #[error("Type mismatch for bind variable {key}: expected {expected}, got {actual}")]
    TypeMismatch {
        key: BindKey,
        expected: DataType,
        actual: DataType,
    },

    #[error("Invalid {expected} value for bind variable {key}: '{text}'")]
    InvalidText {
        key: BindKey,
        expected: DataType,
        text: String,
    },

    #[error("Unsupported parameter type oid: {oid}")]
    UnsupportedType { oid: i32 },

    #[error("Malformed parameter for {key}: {reason}")]
    MalformedParameter { key: BindKey, reason: String },

    #[error("Bind message supplies {actual} parameters, statement declares {expected}")]
    ParameterCount { expected: usize, actual: usize },

    #[error("Bind message has {formats} format codes for {params} parameters")]
    FormatCount { formats: usize, params: usize },
}

/// Result type for bind operations.
pub type BindResult<T> = Result<T, BindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BindError::IndexOutOfRange { index: 3, count: 2 };
        assert_eq!(
            err.to_string(),
            "Bind variable index 3 is out of range (declared: 2)"
        );

        let err = BindError::UndefinedVariable {
            name: "limit".to_string(),
        };
        assert_eq!(err.to_string(), "Undefined bind variable: :limit");

        let err = BindError::TypeMismatch {
            key: BindKey::Index(1),
            expected: DataType::Int32,
            actual: DataType::Varchar,
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch for bind variable $1: expected INT, got VARCHAR"
        );

        let err = BindError::InvalidText {
            key: BindKey::name("ts"),
            expected: DataType::Timestamp,
            text: "yesterday".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid TIMESTAMP value for bind variable :ts: 'yesterday'"
        );
    }
}
