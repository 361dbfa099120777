//! Expression AST definitions.

use crate::access::{DataType, Value};
use crate::bind::{BindVariable, BindVariableRef};
use crate::expression::function::ScalarFunction;
use crate::expression::operator::{BinaryOperator, UnaryOperator};
use crate::expression::{ExpressionError, ExpressionResult};

/// Column reference in an expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Column index in the tuple (0-based)
    pub index: usize,
    /// Optional column name for debugging/display
    pub name: Option<String>,
}

impl ColumnRef {
    pub fn new(index: usize) -> Self {
        Self { index, name: None }
    }

    pub fn with_name(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: Some(name.into()),
        }
    }
}

impl ScalarFunction for ColumnRef {
    fn data_type(&self) -> Option<DataType> {
        None
    }

    fn get_value(&self, row: &[Value]) -> ExpressionResult<Value> {
        row.get(self.index)
            .cloned()
            .ok_or(ExpressionError::ColumnIndexOutOfBounds {
                index: self.index,
                tuple_size: row.len(),
            })
    }

    fn is_read_thread_safe(&self) -> bool {
        true
    }
}

/// Literal value in an expression
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self { value: Value::Null }
    }

    pub fn bool(val: bool) -> Self {
        Self {
            value: Value::Boolean(val),
        }
    }

    pub fn int32(val: i32) -> Self {
        Self {
            value: Value::Int32(val),
        }
    }

    pub fn string(val: impl Into<String>) -> Self {
        Self {
            value: Value::String(val.into()),
        }
    }
}

impl ScalarFunction for Literal {
    fn data_type(&self) -> Option<DataType> {
        self.value.data_type()
    }

    fn get_value(&self, _row: &[Value]) -> ExpressionResult<Value> {
        Ok(self.value.clone())
    }

    fn is_constant(&self) -> bool {
        true
    }

    fn is_runtime_constant(&self) -> bool {
        true
    }

    fn is_read_thread_safe(&self) -> bool {
        true
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal constant value
    Literal(Literal),

    /// Column reference
    ColumnRef(ColumnRef),

    /// Bind variable, resolved against the statement's registry at evaluation
    BindVariable(BindVariableRef),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// `expr [NOT] IN (list)`
    In {
        expr: Box<Expression>,
        list: Vec<Expression>,
        negated: bool,
    },

    /// `expr [NOT] BETWEEN low AND high`
    Between {
        expr: Box<Expression>,
        low: Box<Expression>,
        high: Box<Expression>,
        negated: bool,
    },
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: Value) -> Self {
        Expression::Literal(Literal::new(value))
    }

    /// Create a column reference expression
    pub fn column(index: usize) -> Self {
        Expression::ColumnRef(ColumnRef::new(index))
    }

    /// Create a column reference with name
    pub fn column_with_name(index: usize, name: impl Into<String>) -> Self {
        Expression::ColumnRef(ColumnRef::with_name(index, name))
    }

    /// Create a node reading `variable` from its registry
    pub fn bind_variable(variable: &BindVariable) -> Self {
        Expression::BindVariable(variable.to_ref())
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::And, left, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Or, left, right)
    }

    pub fn not_expr(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Not, operand)
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    pub fn ne(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ne, left, right)
    }

    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Lt, left, right)
    }

    pub fn le(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Le, left, right)
    }

    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    pub fn ge(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ge, left, right)
    }

    pub fn add_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Add, left, right)
    }

    pub fn sub_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Sub, left, right)
    }

    pub fn mul_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Mul, left, right)
    }

    pub fn div_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Div, left, right)
    }

    pub fn is_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNull, operand)
    }

    pub fn is_not_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNotNull, operand)
    }

    pub fn in_list(expr: Expression, list: Vec<Expression>, negated: bool) -> Self {
        Expression::In {
            expr: Box::new(expr),
            list,
            negated,
        }
    }

    pub fn between(expr: Expression, low: Expression, high: Expression, negated: bool) -> Self {
        Expression::Between {
            expr: Box::new(expr),
            low: Box::new(low),
            high: Box::new(high),
            negated,
        }
    }

    /// Direct children of this node
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Literal(_) | Expression::ColumnRef(_) | Expression::BindVariable(_) => {
                vec![]
            }
            Expression::BinaryOp { left, right, .. } => vec![left, right],
            Expression::UnaryOp { operand, .. } => vec![operand],
            Expression::In { expr, list, .. } => {
                let mut children = vec![expr.as_ref()];
                children.extend(list.iter());
                children
            }
            Expression::Between {
                expr, low, high, ..
            } => vec![expr, low, high],
        }
    }

    /// Check if this expression is a constant (literals only)
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(lit) => lit.is_constant(),
            Expression::ColumnRef(col) => col.is_constant(),
            Expression::BindVariable(_) => false,
            _ => self.children().iter().all(|e| e.is_constant()),
        }
    }

    /// Check if this expression's value is fixed for one execution.
    ///
    /// True for trees built only from literals and bind variables; such a
    /// subtree can be evaluated once per execution instead of once per row.
    pub fn is_runtime_constant(&self) -> bool {
        match self {
            Expression::Literal(lit) => lit.is_runtime_constant(),
            Expression::ColumnRef(col) => col.is_runtime_constant(),
            Expression::BindVariable(_) => true,
            _ => self.children().iter().all(|e| e.is_runtime_constant()),
        }
    }

    /// Check if concurrent evaluation of this tree from several workers is safe
    pub fn is_read_thread_safe(&self) -> bool {
        match self {
            Expression::Literal(lit) => lit.is_read_thread_safe(),
            Expression::ColumnRef(col) => col.is_read_thread_safe(),
            Expression::BindVariable(_) => true,
            _ => self.children().iter().all(|e| e.is_read_thread_safe()),
        }
    }

    /// All bind variable references in the tree, in depth-first order
    pub fn bind_variables(&self) -> Vec<&BindVariableRef> {
        let mut refs = Vec::new();
        self.collect_bind_variables(&mut refs);
        refs
    }

    fn collect_bind_variables<'a>(&'a self, refs: &mut Vec<&'a BindVariableRef>) {
        if let Expression::BindVariable(r) = self {
            refs.push(r);
        }
        for child in self.children() {
            child.collect_bind_variables(refs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::BindVariables;

    #[test]
    fn test_column_ref() {
        let col1 = ColumnRef::new(0);
        assert_eq!(col1.index, 0);
        assert!(col1.name.is_none());

        let col2 = ColumnRef::with_name(1, "age");
        assert_eq!(col2.index, 1);
        assert_eq!(col2.name.as_deref(), Some("age"));

        let row = vec![Value::Int32(1), Value::Int32(2)];
        assert_eq!(col2.get_value(&row).unwrap(), Value::Int32(2));
        assert!(matches!(
            ColumnRef::new(5).get_value(&row),
            Err(ExpressionError::ColumnIndexOutOfBounds { index: 5, .. })
        ));
    }

    #[test]
    fn test_literal() {
        assert_eq!(Literal::null().value, Value::Null);
        assert_eq!(Literal::bool(true).value, Value::Boolean(true));
        assert_eq!(Literal::int32(42).value, Value::Int32(42));
        assert_eq!(
            Literal::string("hello").value,
            Value::String("hello".to_string())
        );
        assert_eq!(Literal::int32(7).data_type(), Some(DataType::Int32));
    }

    #[test]
    fn test_capability_flags() {
        let mut vars = BindVariables::with_positional(1);
        vars.bind_by_index(1, 10).unwrap();
        let param = Expression::bind_variable(vars.lookup_index(1).unwrap());

        // Literal is constant
        let lit = Expression::literal(Value::Int32(42));
        assert!(lit.is_constant());
        assert!(lit.is_runtime_constant());

        // Bind variable is a runtime constant only
        assert!(!param.is_constant());
        assert!(param.is_runtime_constant());

        // Column reference is neither
        let col = Expression::column(0);
        assert!(!col.is_constant());
        assert!(!col.is_runtime_constant());

        let folded = Expression::add_expr(param.clone(), lit.clone());
        assert!(folded.is_runtime_constant());
        assert!(!folded.is_constant());

        let per_row = Expression::gt(col, folded);
        assert!(!per_row.is_runtime_constant());
        assert!(per_row.is_read_thread_safe());
    }

    #[test]
    fn test_bind_variable_collection() {
        let mut vars = BindVariables::with_positional(2);
        vars.declare_name("n");
        let p1 = Expression::bind_variable(vars.lookup_index(1).unwrap());
        let p2 = Expression::bind_variable(vars.lookup_index(2).unwrap());
        let n = Expression::bind_variable(vars.lookup_name("n").unwrap());

        let expr = Expression::and(
            Expression::between(Expression::column(0), p1, p2, false),
            Expression::in_list(Expression::column(1), vec![n], true),
        );
        let keys: Vec<String> = expr
            .bind_variables()
            .iter()
            .map(|r| r.key.to_string())
            .collect();
        assert_eq!(keys, vec!["$1", "$2", ":n"]);
    }
}
