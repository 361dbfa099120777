//! Type checking for expressions.

use crate::access::DataType;
use crate::bind::BindVariables;
use crate::expression::{Expression, ExpressionError, ExpressionResult};

/// Type checker for expressions
pub struct TypeChecker<'a> {
    /// Schema defining the types of input columns
    schema: &'a [DataType],
    /// Registry consulted for bind variable types
    bind_variables: Option<&'a BindVariables>,
}

impl<'a> TypeChecker<'a> {
    /// Create a new type checker with the given schema
    pub fn new(schema: &'a [DataType]) -> Self {
        Self {
            schema,
            bind_variables: None,
        }
    }

    /// Type bind variable nodes from `bind_variables`.
    ///
    /// Slots that are still untyped check as unknown, like a NULL literal.
    pub fn with_bind_variables(mut self, bind_variables: &'a BindVariables) -> Self {
        self.bind_variables = Some(bind_variables);
        self
    }

    /// Type check an expression and return its output type
    pub fn check(&self, expr: &Expression) -> ExpressionResult<Option<DataType>> {
        match expr {
            Expression::Literal(lit) => Ok(lit.value.data_type()),

            Expression::ColumnRef(col) => {
                if col.index >= self.schema.len() {
                    return Err(ExpressionError::ColumnIndexOutOfBounds {
                        index: col.index,
                        tuple_size: self.schema.len(),
                    });
                }
                Ok(Some(self.schema[col.index]))
            }

            Expression::BindVariable(r) => Ok(self
                .bind_variables
                .and_then(|vars| vars.get(r.slot))
                .and_then(|variable| variable.data_type())),

            Expression::BinaryOp { op, left, right } => {
                let left_type = self.check(left)?;
                let right_type = self.check(right)?;

                match (left_type, right_type) {
                    (Some(lt), Some(rt)) => match op.output_type(lt, rt) {
                        Some(output_type) => Ok(Some(output_type)),
                        None => Err(ExpressionError::InvalidOperandTypes {
                            operator: op.as_str().to_string(),
                            left_type: Some(lt),
                            right_type: Some(rt),
                        }),
                    },
                    // Unknown operands are resolved at runtime
                    _ if op.is_comparison() => Ok(Some(DataType::Boolean)),
                    _ => Ok(None),
                }
            }

            Expression::UnaryOp { op, operand } => {
                let operand_type = self.check(operand)?;

                match operand_type {
                    Some(ot) => match op.output_type(ot) {
                        Some(output_type) => Ok(Some(output_type)),
                        None => Err(ExpressionError::InvalidOperandTypes {
                            operator: op.as_str().to_string(),
                            left_type: Some(ot),
                            right_type: None,
                        }),
                    },
                    None => Ok(None),
                }
            }

            Expression::In { expr, list, .. } => {
                let needle = self.check(expr)?;
                for item in list {
                    self.check_comparable("IN", needle, self.check(item)?)?;
                }
                Ok(Some(DataType::Boolean))
            }

            Expression::Between {
                expr, low, high, ..
            } => {
                let value = self.check(expr)?;
                self.check_comparable("BETWEEN", value, self.check(low)?)?;
                self.check_comparable("BETWEEN", value, self.check(high)?)?;
                Ok(Some(DataType::Boolean))
            }
        }
    }

    fn check_comparable(
        &self,
        operator: &str,
        left: Option<DataType>,
        right: Option<DataType>,
    ) -> ExpressionResult<()> {
        match (left, right) {
            (Some(lt), Some(rt)) if !lt.is_comparable_with(rt) => {
                Err(ExpressionError::InvalidOperandTypes {
                    operator: operator.to_string(),
                    left_type: Some(lt),
                    right_type: Some(rt),
                })
            }
            _ => Ok(()),
        }
    }

    /// Check if an expression is valid for use as a filter predicate
    pub fn check_filter_predicate(&self, expr: &Expression) -> ExpressionResult<()> {
        let output_type = self.check(expr)?;

        match output_type {
            Some(DataType::Boolean) | None => Ok(()), // Boolean or NULL is OK for filters
            Some(other_type) => Err(ExpressionError::TypeMismatch {
                expected: DataType::Boolean,
                actual: other_type,
                context: "filter predicate".to_string(),
            }),
        }
    }
}

/// Helper function to type check an expression
pub fn type_check_expression(
    expr: &Expression,
    schema: &[DataType],
    bind_variables: &BindVariables,
) -> ExpressionResult<Option<DataType>> {
    TypeChecker::new(schema)
        .with_bind_variables(bind_variables)
        .check(expr)
}

/// Helper function to validate a filter predicate
pub fn validate_filter_predicate(
    expr: &Expression,
    schema: &[DataType],
    bind_variables: &BindVariables,
) -> ExpressionResult<()> {
    TypeChecker::new(schema)
        .with_bind_variables(bind_variables)
        .check_filter_predicate(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Value;

    fn schema() -> Vec<DataType> {
        vec![DataType::Int32, DataType::Varchar, DataType::Boolean]
    }

    #[test]
    fn test_basic_types() {
        let schema = schema();
        let checker = TypeChecker::new(&schema);

        assert_eq!(
            checker.check(&Expression::literal(Value::Int32(1))).unwrap(),
            Some(DataType::Int32)
        );
        assert_eq!(
            checker.check(&Expression::literal(Value::Null)).unwrap(),
            None
        );
        assert_eq!(
            checker.check(&Expression::column(1)).unwrap(),
            Some(DataType::Varchar)
        );
        assert!(matches!(
            checker.check(&Expression::column(3)),
            Err(ExpressionError::ColumnIndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_operators() {
        let schema = schema();
        let checker = TypeChecker::new(&schema);

        let cmp = Expression::gt(Expression::column(0), Expression::literal(Value::Int64(5)));
        assert_eq!(checker.check(&cmp).unwrap(), Some(DataType::Boolean));

        let bad = Expression::add_expr(Expression::column(0), Expression::column(1));
        assert!(matches!(
            checker.check(&bad),
            Err(ExpressionError::InvalidOperandTypes { .. })
        ));

        let neg = Expression::not_expr(Expression::column(0));
        assert!(checker.check(&neg).is_err());
    }

    #[test]
    fn test_bind_variable_types() {
        let schema = schema();
        let mut vars = BindVariables::with_positional(2);
        vars.bind_by_index(1, "abc").unwrap();
        let p1 = Expression::bind_variable(vars.lookup_index(1).unwrap());
        let p2 = Expression::bind_variable(vars.lookup_index(2).unwrap());

        let checker = TypeChecker::new(&schema).with_bind_variables(&vars);
        assert_eq!(checker.check(&p1).unwrap(), Some(DataType::Varchar));
        // unbound slot is unknown
        assert_eq!(checker.check(&p2).unwrap(), None);

        let mismatch = Expression::eq(Expression::column(0), p1.clone());
        assert!(checker.check_filter_predicate(&mismatch).is_err());

        let unknown = Expression::eq(Expression::column(0), p2);
        assert!(checker.check_filter_predicate(&unknown).is_ok());

        // without a registry every bind variable is unknown
        let bare = TypeChecker::new(&schema);
        assert!(bare.check_filter_predicate(&mismatch).is_ok());
    }

    #[test]
    fn test_in_and_between() {
        let schema = schema();
        let vars = BindVariables::new();
        let ok = Expression::between(
            Expression::column(0),
            Expression::literal(Value::Int32(1)),
            Expression::literal(Value::Float64(2.5)),
            false,
        );
        assert_eq!(
            type_check_expression(&ok, &schema, &vars).unwrap(),
            Some(DataType::Boolean)
        );

        let bad = Expression::in_list(
            Expression::column(1),
            vec![Expression::literal(Value::Int32(1))],
            false,
        );
        assert!(type_check_expression(&bad, &schema, &vars).is_err());
    }

    #[test]
    fn test_filter_predicate_validation() {
        let schema = schema();
        let vars = BindVariables::new();
        assert!(validate_filter_predicate(&Expression::column(2), &schema, &vars).is_ok());
        assert!(matches!(
            validate_filter_predicate(&Expression::column(0), &schema, &vars),
            Err(ExpressionError::TypeMismatch { .. })
        ));
    }
}
