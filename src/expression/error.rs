//! Error types for expression evaluation.

use crate::access::DataType;
use crate::bind::BindKey;
use std::fmt;

/// Errors that can occur during expression type checking and evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Type mismatch in operation
    TypeMismatch {
        expected: DataType,
        actual: DataType,
        context: String,
    },

    /// Invalid operand types for operator
    InvalidOperandTypes {
        operator: String,
        left_type: Option<DataType>,
        right_type: Option<DataType>,
    },

    /// Column index out of bounds
    ColumnIndexOutOfBounds { index: usize, tuple_size: usize },

    /// Division by zero
    DivisionByZero,

    /// A bind variable node was evaluated without its registry
    UnresolvedBindVariable { key: BindKey },

    /// Generic evaluation error
    EvaluationError { message: String },
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionError::TypeMismatch {
                expected,
                actual,
                context,
            } => {
                write!(
                    f,
                    "Type mismatch in {}: expected {}, got {}",
                    context, expected, actual
                )
            }

            ExpressionError::InvalidOperandTypes {
                operator,
                left_type,
                right_type,
            } => {
                write!(
                    f,
                    "Invalid operand types for operator {}: left={:?}, right={:?}",
                    operator, left_type, right_type
                )
            }

            ExpressionError::ColumnIndexOutOfBounds { index, tuple_size } => {
                write!(
                    f,
                    "Column index {} out of bounds for tuple with {} columns",
                    index, tuple_size
                )
            }

            ExpressionError::DivisionByZero => write!(f, "Division by zero"),

            ExpressionError::UnresolvedBindVariable { key } => {
                write!(f, "Bind variable {} has no registry to read from", key)
            }

            ExpressionError::EvaluationError { message } => {
                write!(f, "Expression evaluation error: {}", message)
            }
        }
    }
}

impl std::error::Error for ExpressionError {}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExpressionError::TypeMismatch {
            expected: DataType::Boolean,
            actual: DataType::Varchar,
            context: "filter predicate".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch in filter predicate: expected BOOLEAN, got VARCHAR"
        );

        let err = ExpressionError::InvalidOperandTypes {
            operator: "+".to_string(),
            left_type: Some(DataType::Int32),
            right_type: Some(DataType::Varchar),
        };
        assert_eq!(
            err.to_string(),
            "Invalid operand types for operator +: left=Some(Int32), right=Some(Varchar)"
        );

        let err = ExpressionError::ColumnIndexOutOfBounds {
            index: 5,
            tuple_size: 3,
        };
        assert_eq!(
            err.to_string(),
            "Column index 5 out of bounds for tuple with 3 columns"
        );

        assert_eq!(ExpressionError::DivisionByZero.to_string(), "Division by zero");

        let err = ExpressionError::UnresolvedBindVariable {
            key: BindKey::name("limit"),
        };
        assert_eq!(
            err.to_string(),
            "Bind variable :limit has no registry to read from"
        );
    }
}
