//! Expression evaluation implementation.

use crate::access::{DataType, Value};
use crate::bind::{BindVariableRef, BindVariables};
use crate::expression::{
    BinaryOperator, ColumnRef, Expression, ExpressionError, ExpressionResult, ScalarFunction,
    UnaryOperator,
};
use std::cmp::Ordering;

/// Evaluator for expressions
pub struct ExpressionEvaluator<'a> {
    /// The row values to evaluate against
    row: &'a [Value],
    /// Registry that bind variable nodes read from
    bind_variables: Option<&'a BindVariables>,
}

impl<'a> ExpressionEvaluator<'a> {
    /// Create a new evaluator with row values
    pub fn new(row: &'a [Value]) -> Self {
        Self {
            row,
            bind_variables: None,
        }
    }

    /// Resolve bind variable nodes against `bind_variables`
    pub fn with_bind_variables(mut self, bind_variables: &'a BindVariables) -> Self {
        self.bind_variables = Some(bind_variables);
        self
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(lit.value.clone()),

            Expression::ColumnRef(col) => self.evaluate_column_ref(col),

            Expression::BindVariable(r) => self.evaluate_bind_variable(r),

            Expression::BinaryOp { op, left, right } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                self.evaluate_binary_op(*op, left_val, right_val)
            }

            Expression::UnaryOp { op, operand } => {
                let operand_val = self.evaluate(operand)?;
                self.evaluate_unary_op(*op, operand_val)
            }

            Expression::In {
                expr,
                list,
                negated,
            } => self.evaluate_in(expr, list, *negated),

            Expression::Between {
                expr,
                low,
                high,
                negated,
            } => self.evaluate_between(expr, low, high, *negated),
        }
    }

    fn evaluate_column_ref(&self, col: &ColumnRef) -> ExpressionResult<Value> {
        col.get_value(self.row)
    }

    #[inline]
    fn evaluate_bind_variable(&self, r: &BindVariableRef) -> ExpressionResult<Value> {
        self.bind_variables
            .and_then(|vars| vars.get(r.slot))
            .map(|variable| variable.get_value(self.row))
            .unwrap_or_else(|| {
                Err(ExpressionError::UnresolvedBindVariable {
                    key: r.key.clone(),
                })
            })
    }

    /// Evaluate a binary operation
    fn evaluate_binary_op(
        &self,
        op: BinaryOperator,
        left: Value,
        right: Value,
    ) -> ExpressionResult<Value> {
        // Handle NULL propagation for most operators
        if left.is_null() || right.is_null() {
            return Ok(match op {
                // NULL AND false = false, NULL AND true = NULL
                BinaryOperator::And => match (&left, &right) {
                    (Value::Boolean(false), _) | (_, Value::Boolean(false)) => {
                        Value::Boolean(false)
                    }
                    _ => Value::Null,
                },
                // NULL OR true = true, NULL OR false = NULL
                BinaryOperator::Or => match (&left, &right) {
                    (Value::Boolean(true), _) | (_, Value::Boolean(true)) => Value::Boolean(true),
                    _ => Value::Null,
                },
                _ => Value::Null,
            });
        }

        match op {
            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div => self.evaluate_arithmetic(op, &left, &right),

            BinaryOperator::Eq => self.compare_values(op, &left, &right, Ordering::is_eq),
            BinaryOperator::Ne => self.compare_values(op, &left, &right, Ordering::is_ne),
            BinaryOperator::Lt => self.compare_values(op, &left, &right, Ordering::is_lt),
            BinaryOperator::Le => self.compare_values(op, &left, &right, Ordering::is_le),
            BinaryOperator::Gt => self.compare_values(op, &left, &right, Ordering::is_gt),
            BinaryOperator::Ge => self.compare_values(op, &left, &right, Ordering::is_ge),

            BinaryOperator::And => match (&left, &right) {
                (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a && *b)),
                _ => Err(invalid_operands(op, &left, &right)),
            },

            BinaryOperator::Or => match (&left, &right) {
                (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a || *b)),
                _ => Err(invalid_operands(op, &left, &right)),
            },

            BinaryOperator::Concat => match (&left, &right) {
                (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
                _ => Err(invalid_operands(op, &left, &right)),
            },

            BinaryOperator::Like => match (&left, &right) {
                (Value::String(text), Value::String(pattern)) => {
                    Ok(Value::Boolean(like_match(text, pattern)))
                }
                _ => Err(invalid_operands(op, &left, &right)),
            },
        }
    }

    /// Arithmetic over numeric operands, computed at the widened type
    fn evaluate_arithmetic(
        &self,
        op: BinaryOperator,
        left: &Value,
        right: &Value,
    ) -> ExpressionResult<Value> {
        let (Some(lt), Some(rt)) = (left.data_type(), right.data_type()) else {
            return Err(invalid_operands(op, left, right));
        };
        match DataType::widen(lt, rt) {
            Some(DataType::Float64) => {
                let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                    return Err(invalid_operands(op, left, right));
                };
                let result = match op {
                    BinaryOperator::Add => a + b,
                    BinaryOperator::Sub => a - b,
                    BinaryOperator::Mul => a * b,
                    _ => {
                        if b == 0.0 {
                            return Err(ExpressionError::DivisionByZero);
                        }
                        a / b
                    }
                };
                Ok(Value::Float64(result))
            }
            Some(widened) => {
                let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) else {
                    return Err(invalid_operands(op, left, right));
                };
                if widened == DataType::Int32 {
                    // both operands fit in i32 here
                    integer_op(op, a as i32, b as i32).map(Value::Int32)
                } else {
                    integer_op(op, a, b).map(Value::Int64)
                }
            }
            None => Err(invalid_operands(op, left, right)),
        }
    }

    /// Evaluate a unary operation
    fn evaluate_unary_op(&self, op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
        let invalid = |operand: &Value| ExpressionError::InvalidOperandTypes {
            operator: op.as_str().to_string(),
            left_type: operand.data_type(),
            right_type: None,
        };
        match op {
            UnaryOperator::IsNull => Ok(Value::Boolean(operand.is_null())),

            UnaryOperator::IsNotNull => Ok(Value::Boolean(!operand.is_null())),

            _ if operand.is_null() => Ok(Value::Null),

            UnaryOperator::Not => match operand {
                Value::Boolean(b) => Ok(Value::Boolean(!b)),
                other => Err(invalid(&other)),
            },

            UnaryOperator::Plus => match operand {
                v @ (Value::Int8(_)
                | Value::Int16(_)
                | Value::Int32(_)
                | Value::Int64(_)
                | Value::Float64(_)) => Ok(v),
                other => Err(invalid(&other)),
            },

            UnaryOperator::Minus => match operand {
                Value::Int8(n) => Ok(Value::Int8(n.wrapping_neg())),
                Value::Int16(n) => Ok(Value::Int16(n.wrapping_neg())),
                Value::Int32(n) => Ok(Value::Int32(n.wrapping_neg())),
                Value::Int64(n) => Ok(Value::Int64(n.wrapping_neg())),
                Value::Float64(n) => Ok(Value::Float64(-n)),
                other => Err(invalid(&other)),
            },
        }
    }

    /// `expr [NOT] IN (list)` with SQL NULL semantics
    fn evaluate_in(
        &self,
        expr: &Expression,
        list: &[Expression],
        negated: bool,
    ) -> ExpressionResult<Value> {
        let needle = self.evaluate(expr)?;
        if needle.is_null() {
            return Ok(Value::Null);
        }
        let mut saw_null = false;
        for item in list {
            let candidate = self.evaluate(item)?;
            if candidate.is_null() {
                saw_null = true;
                continue;
            }
            let ordering = needle.compare(&candidate).ok_or_else(|| {
                invalid_operands(BinaryOperator::Eq, &needle, &candidate)
            })?;
            if ordering.is_eq() {
                return Ok(Value::Boolean(!negated));
            }
        }
        if saw_null {
            Ok(Value::Null)
        } else {
            Ok(Value::Boolean(negated))
        }
    }

    /// `expr [NOT] BETWEEN low AND high`, bounds inclusive
    fn evaluate_between(
        &self,
        expr: &Expression,
        low: &Expression,
        high: &Expression,
        negated: bool,
    ) -> ExpressionResult<Value> {
        let value = self.evaluate(expr)?;
        let low = self.evaluate(low)?;
        let high = self.evaluate(high)?;
        let lower = self.evaluate_binary_op(BinaryOperator::Ge, value.clone(), low)?;
        let upper = self.evaluate_binary_op(BinaryOperator::Le, value, high)?;
        let within = self.evaluate_binary_op(BinaryOperator::And, lower, upper)?;
        if negated {
            self.evaluate_unary_op(UnaryOperator::Not, within)
        } else {
            Ok(within)
        }
    }

    /// Compare two values and apply a comparison function
    fn compare_values<F>(
        &self,
        op: BinaryOperator,
        left: &Value,
        right: &Value,
        cmp_fn: F,
    ) -> ExpressionResult<Value>
    where
        F: FnOnce(Ordering) -> bool,
    {
        let ordering = left
            .compare(right)
            .ok_or_else(|| invalid_operands(op, left, right))?;
        Ok(Value::Boolean(cmp_fn(ordering)))
    }
}

fn invalid_operands(op: BinaryOperator, left: &Value, right: &Value) -> ExpressionError {
    ExpressionError::InvalidOperandTypes {
        operator: op.as_str().to_string(),
        left_type: left.data_type(),
        right_type: right.data_type(),
    }
}

trait WrappingInt: Copy + PartialEq {
    const ZERO: Self;
    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
    fn div(self, rhs: Self) -> Self;
}

macro_rules! impl_wrapping_int {
    ($($t:ty),*) => {
        $(impl WrappingInt for $t {
            const ZERO: Self = 0;
            fn add(self, rhs: Self) -> Self { self.wrapping_add(rhs) }
            fn sub(self, rhs: Self) -> Self { self.wrapping_sub(rhs) }
            fn mul(self, rhs: Self) -> Self { self.wrapping_mul(rhs) }
            fn div(self, rhs: Self) -> Self { self.wrapping_div(rhs) }
        })*
    };
}

impl_wrapping_int!(i32, i64);

fn integer_op<T: WrappingInt>(op: BinaryOperator, a: T, b: T) -> ExpressionResult<T> {
    Ok(match op {
        BinaryOperator::Add => a.add(b),
        BinaryOperator::Sub => a.sub(b),
        BinaryOperator::Mul => a.mul(b),
        _ => {
            if b == T::ZERO {
                return Err(ExpressionError::DivisionByZero);
            }
            a.div(b)
        }
    })
}

/// SQL LIKE: `%` matches any run of characters, `_` exactly one.
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut t, mut p) = (0, 0);
    // position of the last `%` seen and the text index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(c) if *c == '_' || *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((star, tried)) => {
                    p = star + 1;
                    t = tried + 1;
                    backtrack = Some((star, tried + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

/// Helper function to evaluate an expression against one row
pub fn evaluate_expression(
    expr: &Expression,
    row: &[Value],
    bind_variables: &BindVariables,
) -> ExpressionResult<Value> {
    ExpressionEvaluator::new(row)
        .with_bind_variables(bind_variables)
        .evaluate(expr)
}

/// Evaluate a filter predicate; NULL is treated as false
pub fn evaluate_predicate(
    expr: &Expression,
    row: &[Value],
    bind_variables: &BindVariables,
) -> ExpressionResult<bool> {
    match evaluate_expression(expr, row, bind_variables)? {
        Value::Boolean(b) => Ok(b),
        Value::Null => Ok(false),
        other => Err(ExpressionError::TypeMismatch {
            expected: DataType::Boolean,
            actual: other.data_type().unwrap_or(DataType::Boolean),
            context: "filter predicate".to_string(),
        }),
    }
}

/// Replace every maximal runtime-constant subtree with the literal it
/// evaluates to under the current binds.
///
/// Call once per execution, after binding and before dispatch. A subtree
/// whose evaluation fails is left in place so the error surfaces per row.
pub fn fold_runtime_constants(expr: &Expression, bind_variables: &BindVariables) -> Expression {
    if expr.is_runtime_constant() {
        if let Expression::Literal(_) = expr {
            return expr.clone();
        }
        if let Ok(value) = evaluate_expression(expr, &[], bind_variables) {
            return Expression::literal(value);
        }
        return expr.clone();
    }

    let fold = |e: &Expression| Box::new(fold_runtime_constants(e, bind_variables));
    match expr {
        Expression::BinaryOp { op, left, right } => Expression::BinaryOp {
            op: *op,
            left: fold(left),
            right: fold(right),
        },
        Expression::UnaryOp { op, operand } => Expression::UnaryOp {
            op: *op,
            operand: fold(operand),
        },
        Expression::In {
            expr,
            list,
            negated,
        } => Expression::In {
            expr: fold(expr),
            list: list
                .iter()
                .map(|e| fold_runtime_constants(e, bind_variables))
                .collect(),
            negated: *negated,
        },
        Expression::Between {
            expr,
            low,
            high,
            negated,
        } => Expression::Between {
            expr: fold(expr),
            low: fold(low),
            high: fold(high),
            negated: *negated,
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_binds() -> BindVariables {
        BindVariables::new()
    }

    #[test]
    fn test_literal_evaluation() {
        let values = vec![];
        let evaluator = ExpressionEvaluator::new(&values);

        assert_eq!(
            evaluator
                .evaluate(&Expression::literal(Value::Int32(42)))
                .unwrap(),
            Value::Int32(42)
        );
        assert_eq!(
            evaluator
                .evaluate(&Expression::literal(Value::String("hello".to_string())))
                .unwrap(),
            Value::String("hello".to_string())
        );
        assert_eq!(
            evaluator
                .evaluate(&Expression::literal(Value::Null))
                .unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_column_ref_evaluation() {
        let values = vec![Value::Int32(1), Value::String("test".to_string())];
        let evaluator = ExpressionEvaluator::new(&values);

        assert_eq!(
            evaluator.evaluate(&Expression::column(1)).unwrap(),
            Value::String("test".to_string())
        );
        assert!(matches!(
            evaluator.evaluate(&Expression::column(2)),
            Err(ExpressionError::ColumnIndexOutOfBounds {
                index: 2,
                tuple_size: 2
            })
        ));
    }

    #[test]
    fn test_arithmetic_promotion() {
        let vars = no_binds();
        let eval = |e: Expression| evaluate_expression(&e, &[], &vars).unwrap();

        assert_eq!(
            eval(Expression::add_expr(
                Expression::literal(Value::Int16(2)),
                Expression::literal(Value::Int8(3)),
            )),
            Value::Int32(5)
        );
        assert_eq!(
            eval(Expression::mul_expr(
                Expression::literal(Value::Int32(3)),
                Expression::literal(Value::Int64(1 << 40)),
            )),
            Value::Int64(3 << 40)
        );
        assert_eq!(
            eval(Expression::div_expr(
                Expression::literal(Value::Int32(7)),
                Expression::literal(Value::Float64(2.0)),
            )),
            Value::Float64(3.5)
        );
        assert_eq!(
            eval(Expression::add_expr(
                Expression::literal(Value::Int32(i32::MAX)),
                Expression::literal(Value::Int32(1)),
            )),
            Value::Int32(i32::MIN)
        );
        assert_eq!(
            evaluate_expression(
                &Expression::div_expr(
                    Expression::literal(Value::Int64(1)),
                    Expression::literal(Value::Int32(0)),
                ),
                &[],
                &vars
            ),
            Err(ExpressionError::DivisionByZero)
        );
    }

    #[test]
    fn test_comparisons_across_kinds() {
        let vars = no_binds();
        let eval = |e: Expression| evaluate_expression(&e, &[], &vars).unwrap();

        assert_eq!(
            eval(Expression::lt(
                Expression::literal(Value::Int32(3)),
                Expression::literal(Value::Float64(3.5)),
            )),
            Value::Boolean(true)
        );
        assert_eq!(
            eval(Expression::eq(
                Expression::literal(Value::Date(1)),
                Expression::literal(Value::Timestamp(1000)),
            )),
            Value::Boolean(true)
        );
        assert!(matches!(
            evaluate_expression(
                &Expression::eq(
                    Expression::literal(Value::Int32(1)),
                    Expression::literal(Value::String("1".into())),
                ),
                &[],
                &vars
            ),
            Err(ExpressionError::InvalidOperandTypes { .. })
        ));
    }

    #[test]
    fn test_null_logic() {
        let vars = no_binds();
        let eval = |e: Expression| evaluate_expression(&e, &[], &vars).unwrap();
        let null = || Expression::literal(Value::Null);
        let t = || Expression::literal(Value::Boolean(true));
        let f = || Expression::literal(Value::Boolean(false));

        assert_eq!(eval(Expression::and(null(), f())), Value::Boolean(false));
        assert_eq!(eval(Expression::and(null(), t())), Value::Null);
        assert_eq!(eval(Expression::or(null(), t())), Value::Boolean(true));
        assert_eq!(eval(Expression::or(f(), null())), Value::Null);
        assert_eq!(eval(Expression::not_expr(null())), Value::Null);
        assert_eq!(eval(Expression::is_null(null())), Value::Boolean(true));
        assert_eq!(
            eval(Expression::eq(null(), Expression::literal(Value::Int32(1)))),
            Value::Null
        );
    }

    #[test]
    fn test_string_operators() {
        let vars = no_binds();
        let s = |v: &str| Expression::literal(Value::String(v.to_string()));
        let eval = |e: Expression| evaluate_expression(&e, &[], &vars).unwrap();

        assert_eq!(
            eval(Expression::binary_op(BinaryOperator::Concat, s("ab"), s("cd"))),
            Value::String("abcd".to_string())
        );
        assert_eq!(
            eval(Expression::binary_op(BinaryOperator::Like, s("hello"), s("h%o"))),
            Value::Boolean(true)
        );

        assert!(like_match("abc", "a_c"));
        assert!(like_match("abc", "%"));
        assert!(like_match("", "%%"));
        assert!(like_match("mississippi", "%iss%pi"));
        assert!(!like_match("abc", "a_"));
        assert!(!like_match("abc", "%d"));
    }

    #[test]
    fn test_in_and_between() {
        let vars = no_binds();
        let eval = |e: Expression| evaluate_expression(&e, &[], &vars).unwrap();
        let int = |v: i32| Expression::literal(Value::Int32(v));

        assert_eq!(
            eval(Expression::in_list(int(2), vec![int(1), int(2)], false)),
            Value::Boolean(true)
        );
        assert_eq!(
            eval(Expression::in_list(int(3), vec![int(1), int(2)], true)),
            Value::Boolean(true)
        );
        assert_eq!(
            eval(Expression::in_list(
                int(3),
                vec![int(1), Expression::literal(Value::Null)],
                false
            )),
            Value::Null
        );
        assert_eq!(
            eval(Expression::between(int(5), int(1), int(5), false)),
            Value::Boolean(true)
        );
        assert_eq!(
            eval(Expression::between(int(6), int(1), int(5), true)),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_bind_variable_evaluation() {
        let mut vars = BindVariables::with_positional(1);
        vars.bind_by_index(1, 10).unwrap();
        let expr = Expression::gt(
            Expression::column(0),
            Expression::bind_variable(vars.lookup_index(1).unwrap()),
        );

        assert!(evaluate_predicate(&expr, &[Value::Int32(11)], &vars).unwrap());
        assert!(!evaluate_predicate(&expr, &[Value::Int32(10)], &vars).unwrap());

        vars.bind_by_index(1, 0).unwrap();
        assert!(evaluate_predicate(&expr, &[Value::Int32(10)], &vars).unwrap());

        // cleared slot reads NULL, so the predicate is false
        vars.clear_all();
        assert!(!evaluate_predicate(&expr, &[Value::Int32(10)], &vars).unwrap());

        let row = [Value::Int32(1)];
        assert!(matches!(
            ExpressionEvaluator::new(&row).evaluate(&expr),
            Err(ExpressionError::UnresolvedBindVariable { .. })
        ));
    }

    #[test]
    fn test_predicate_rejects_non_boolean() {
        let vars = no_binds();
        assert!(matches!(
            evaluate_predicate(&Expression::literal(Value::Int32(1)), &[], &vars),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_fold_runtime_constants() {
        let mut vars = BindVariables::with_positional(2);
        vars.bind_by_index(1, 40).unwrap();
        vars.bind_by_index(2, 2).unwrap();
        let p1 = Expression::bind_variable(vars.lookup_index(1).unwrap());
        let p2 = Expression::bind_variable(vars.lookup_index(2).unwrap());

        let expr = Expression::eq(Expression::column(0), Expression::add_expr(p1, p2));
        let folded = fold_runtime_constants(&expr, &vars);
        assert_eq!(
            folded,
            Expression::eq(Expression::column(0), Expression::literal(Value::Int32(42)))
        );
        assert!(folded.bind_variables().is_empty());

        // folding is per execution: rebinding changes the next fold only
        vars.bind_by_index(2, 3).unwrap();
        let refolded = fold_runtime_constants(&expr, &vars);
        assert_eq!(
            refolded,
            Expression::eq(Expression::column(0), Expression::literal(Value::Int32(43)))
        );

        for row in [[Value::Int32(43)], [Value::Int32(1)]] {
            assert_eq!(
                evaluate_expression(&expr, &row, &vars),
                evaluate_expression(&refolded, &row, &vars)
            );
        }
    }

    #[test]
    fn test_fold_keeps_failing_subtree() {
        let mut vars = BindVariables::with_positional(1);
        vars.bind_by_index(1, 0).unwrap();
        let div = Expression::div_expr(
            Expression::literal(Value::Int32(1)),
            Expression::bind_variable(vars.lookup_index(1).unwrap()),
        );
        assert_eq!(fold_runtime_constants(&div, &vars), div);
    }
}
