//! Capability contract shared by the leaf nodes of an expression tree.
//!
//! Literals, column references and bind variables all present the same
//! invocation shape to the evaluator: a value computed from the current row
//! plus a handful of flags the evaluator uses for optimisation and
//! scheduling decisions.

use crate::access::{DataType, Value};
use crate::expression::ExpressionResult;

/// A leaf node that produces one scalar per evaluated row.
pub trait ScalarFunction {
    /// Output type, if known before evaluation
    fn data_type(&self) -> Option<DataType>;

    /// Produce the value for `row`.
    fn get_value(&self, row: &[Value]) -> ExpressionResult<Value>;

    /// The value is fixed at compile time.
    fn is_constant(&self) -> bool {
        false
    }

    /// The value may change between executions but never during one.
    ///
    /// The evaluator may compute such a node once per execution and reuse
    /// the result for every row.
    fn is_runtime_constant(&self) -> bool {
        false
    }

    /// Concurrent `get_value` calls without intervening writes are race free.
    fn is_read_thread_safe(&self) -> bool {
        false
    }
}

/// A node that can be reset to its "no value" state for reuse.
pub trait Clearable {
    fn clear(&mut self);
}
