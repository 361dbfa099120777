// Predicate compiler - turns predicate text into an expression tree

use super::lexer::Lexer;
use super::token::Token;
use crate::access::{DataType, Value};
use crate::bind::{convert, BindVariables};
use crate::executor::ColumnInfo;
use crate::expression::{BinaryOperator, Expression, UnaryOperator};
use anyhow::{bail, Context, Result};
use log::debug;

/// Compile `sql` against `schema`, declaring every placeholder it contains
/// in `bind_variables`.
///
/// `$n` declares positional slot `n`, `?` declares the next positional slot
/// and `:name` declares a named slot. Reusing a placeholder reuses its slot.
/// On failure `bind_variables` is left as it was.
pub fn compile(
    sql: &str,
    schema: &[ColumnInfo],
    bind_variables: &mut BindVariables,
) -> Result<Expression> {
    let mut scratch = bind_variables.clone();
    let expr = Compiler::new(sql, schema, &mut scratch)?.compile()?;
    debug!(
        "Compiled predicate with {} positional and {} named bind variables",
        scratch.positional_count(),
        scratch.named_count()
    );
    *bind_variables = scratch;
    Ok(expr)
}

pub struct Compiler<'a> {
    tokens: Vec<Token>,
    position: usize,
    schema: &'a [ColumnInfo],
    bind_variables: &'a mut BindVariables,
}

impl<'a> Compiler<'a> {
    pub fn new(
        sql: &str,
        schema: &'a [ColumnInfo],
        bind_variables: &'a mut BindVariables,
    ) -> Result<Self> {
        let tokens = Lexer::new(sql).tokenize()?;
        Ok(Compiler {
            tokens,
            position: 0,
            schema,
            bind_variables,
        })
    }

    /// Compile the whole input as one predicate
    pub fn compile(&mut self) -> Result<Expression> {
        let expr = self.parse_expression()?;
        if !self.match_token(&Token::Eof) {
            bail!("Unexpected token after predicate: {:?}", self.current_token());
        }
        Ok(expr)
    }

    fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_or()
    }

    /// Parse OR expression
    fn parse_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_and()?;

        while self.match_token(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expression::or(left, right);
        }

        Ok(left)
    }

    /// Parse AND expression
    fn parse_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_not()?;

        while self.match_token(&Token::And) {
            self.advance();
            let right = self.parse_not()?;
            left = Expression::and(left, right);
        }

        Ok(left)
    }

    /// Parse NOT expression
    fn parse_not(&mut self) -> Result<Expression> {
        if self.match_token(&Token::Not) {
            self.advance();
            let operand = self.parse_not()?;
            Ok(Expression::not_expr(operand))
        } else {
            self.parse_comparison()
        }
    }

    /// Parse comparison expression
    fn parse_comparison(&mut self) -> Result<Expression> {
        let left = self.parse_addition()?;

        if self.match_token(&Token::Is) {
            self.advance();
            let negated = self.consume(&Token::Not);
            self.expect_token(Token::Null)?;
            return Ok(if negated {
                Expression::is_not_null(left)
            } else {
                Expression::is_null(left)
            });
        }

        // [NOT] IN / BETWEEN / LIKE
        let negated = self.consume(&Token::Not);

        if self.match_token(&Token::In) {
            self.advance();
            self.expect_token(Token::LeftParen)?;
            let list = self.parse_expression_list()?;
            self.expect_token(Token::RightParen)?;
            return Ok(Expression::in_list(left, list, negated));
        }

        if self.match_token(&Token::Between) {
            self.advance();
            let low = self.parse_addition()?;
            self.expect_token(Token::And)?;
            let high = self.parse_addition()?;
            return Ok(Expression::between(left, low, high, negated));
        }

        if self.match_token(&Token::Like) {
            self.advance();
            let pattern = self.parse_addition()?;
            let like = Expression::binary_op(BinaryOperator::Like, left, pattern);
            return Ok(if negated {
                Expression::not_expr(like)
            } else {
                like
            });
        }

        if negated {
            bail!(
                "Expected IN, BETWEEN or LIKE after NOT, found {:?}",
                self.current_token()
            );
        }

        let op = match self.current_token() {
            Token::Equal => BinaryOperator::Eq,
            Token::NotEqual => BinaryOperator::Ne,
            Token::Less => BinaryOperator::Lt,
            Token::Greater => BinaryOperator::Gt,
            Token::LessEqual => BinaryOperator::Le,
            Token::GreaterEqual => BinaryOperator::Ge,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_addition()?;
        Ok(Expression::binary_op(op, left, right))
    }

    /// Parse addition/subtraction/concatenation expression
    fn parse_addition(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplication()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                Token::Concat => BinaryOperator::Concat,
                _ => break,
            };
            self.advance();

            let right = self.parse_multiplication()?;
            left = Expression::binary_op(op, left, right);
        }

        Ok(left)
    }

    /// Parse multiplication/division expression
    fn parse_multiplication(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                _ => break,
            };
            self.advance();

            let right = self.parse_unary()?;
            left = Expression::binary_op(op, left, right);
        }

        Ok(left)
    }

    /// Parse unary expression
    fn parse_unary(&mut self) -> Result<Expression> {
        match self.current_token() {
            Token::Plus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expression::unary_op(UnaryOperator::Plus, operand))
            }
            Token::Minus => {
                self.advance();
                // fold the sign into numeric literals so i32::MIN stays an INT
                if let Token::Number(n) = self.current_token() {
                    self.advance();
                    return self.number_literal(&format!("-{}", n));
                }
                let operand = self.parse_unary()?;
                Ok(Expression::unary_op(UnaryOperator::Minus, operand))
            }
            _ => self.parse_primary(),
        }
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> Result<Expression> {
        match self.current_token() {
            Token::Number(n) => {
                self.advance();
                self.number_literal(&n)
            }
            Token::String(s) => {
                self.advance();
                Ok(Expression::literal(Value::String(s)))
            }
            Token::True => {
                self.advance();
                Ok(Expression::literal(Value::Boolean(true)))
            }
            Token::False => {
                self.advance();
                Ok(Expression::literal(Value::Boolean(false)))
            }
            Token::Null => {
                self.advance();
                Ok(Expression::literal(Value::Null))
            }
            // DATE 'text' and TIMESTAMP 'text'; a bare keyword names a column
            Token::Date => {
                self.advance();
                let Some(text) = self.consume_string() else {
                    return self.resolve_column("date");
                };
                let millis = convert::parse_date(&text)
                    .with_context(|| format!("Invalid DATE literal '{}'", text))?;
                Ok(Expression::literal(Value::Date(millis)))
            }
            Token::Timestamp => {
                self.advance();
                let Some(text) = self.consume_string() else {
                    return self.resolve_column("timestamp");
                };
                let micros = convert::parse_timestamp(&text)
                    .with_context(|| format!("Invalid TIMESTAMP literal '{}'", text))?;
                Ok(Expression::literal(Value::Timestamp(micros)))
            }
            Token::Parameter(index) => {
                self.advance();
                self.bind_variables.declare_index(index)?;
                let variable = self.bind_variables.lookup_index(index)?;
                Ok(Expression::bind_variable(variable))
            }
            Token::QuestionMark => {
                self.advance();
                let slot = self.bind_variables.declare_next_index()?;
                let variable = self
                    .bind_variables
                    .get(slot)
                    .context("Declared bind variable is missing from its registry")?;
                Ok(Expression::bind_variable(variable))
            }
            Token::NamedParameter(name) => {
                self.advance();
                self.bind_variables.declare_name(&name);
                let variable = self.bind_variables.lookup_name(&name)?;
                Ok(Expression::bind_variable(variable))
            }
            Token::Identifier(name) => {
                self.advance();
                self.resolve_column(&name)
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_token(Token::RightParen)?;
                Ok(expr)
            }
            _ => bail!("Unexpected token: {:?}", self.current_token()),
        }
    }

    fn number_literal(&self, text: &str) -> Result<Expression> {
        Value::from_numeric_literal(text)
            .map(Expression::literal)
            .with_context(|| format!("Invalid number: {}", text))
    }

    /// Resolve a column name against the schema, case-insensitively
    fn resolve_column(&self, name: &str) -> Result<Expression> {
        let index = self
            .schema
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .with_context(|| format!("Unknown column '{}'", name))?;
        Ok(Expression::column_with_name(index, self.schema[index].name.clone()))
    }

    /// Parse list of expressions
    fn parse_expression_list(&mut self) -> Result<Vec<Expression>> {
        let mut expressions = vec![];

        loop {
            expressions.push(self.parse_expression()?);
            if !self.consume(&Token::Comma) {
                break;
            }
        }

        Ok(expressions)
    }

    // Helper methods

    /// Get current token
    fn current_token(&self) -> Token {
        self.tokens
            .get(self.position)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    /// Advance to next token
    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Check if current token matches
    fn match_token(&self, token: &Token) -> bool {
        self.current_token() == *token
    }

    /// Advance past `token` if it is current
    fn consume(&mut self, token: &Token) -> bool {
        if self.match_token(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token
    fn expect_token(&mut self, token: Token) -> Result<()> {
        if self.current_token() == token {
            self.advance();
            Ok(())
        } else {
            bail!("Expected {:?}, found {:?}", token, self.current_token())
        }
    }

    /// Advance past a string literal if one is current
    fn consume_string(&mut self) -> Option<String> {
        match self.current_token() {
            Token::String(s) => {
                self.advance();
                Some(s)
            }
            _ => None,
        }
    }
}

/// Schema types in column order, as the type checker expects them
pub fn schema_types(schema: &[ColumnInfo]) -> Vec<DataType> {
    schema.iter().map(|c| c.data_type).collect()
}
