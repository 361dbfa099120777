//! Expression evaluation framework for filter predicates.
//!
//! This module provides:
//! - Expression AST representation, with bind variables as leaf nodes
//! - The scalar function capability contract shared by leaves
//! - Type checking and validation
//! - Expression evaluation against rows and runtime-constant folding

pub mod error;
pub mod eval;
pub mod expr;
pub mod function;
pub mod operator;
pub mod type_checker;

pub use error::{ExpressionError, ExpressionResult};
pub use eval::{
    evaluate_expression, evaluate_predicate, fold_runtime_constants, ExpressionEvaluator,
};
pub use expr::{ColumnRef, Expression, Literal};
pub use function::{Clearable, ScalarFunction};
pub use operator::{BinaryOperator, UnaryOperator};
pub use type_checker::{type_check_expression, validate_filter_predicate, TypeChecker};
