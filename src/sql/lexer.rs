// SQL lexer - tokenizes predicate text, including bind placeholders

use super::token::Token;
use crate::bind::BindVariables;
use anyhow::{bail, Context, Result};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let Some(ch) = self.current_char() else {
            return Ok(Token::Eof);
        };

        let single = |token: Token, lexer: &mut Lexer| -> Result<Token> {
            lexer.advance();
            Ok(token)
        };

        match ch {
            '+' => single(Token::Plus, self),
            '-' => {
                if self.peek() == Some('-') {
                    self.skip_comment();
                    return self.next_token();
                }
                single(Token::Minus, self)
            }
            '*' => single(Token::Star, self),
            '/' => single(Token::Slash, self),
            '=' => single(Token::Equal, self),
            '(' => single(Token::LeftParen, self),
            ')' => single(Token::RightParen, self),
            ',' => single(Token::Comma, self),
            '?' => single(Token::QuestionMark, self),
            '<' => {
                self.advance();
                match self.current_char() {
                    Some('=') => single(Token::LessEqual, self),
                    Some('>') => single(Token::NotEqual, self),
                    _ => Ok(Token::Less),
                }
            }
            '>' => {
                self.advance();
                match self.current_char() {
                    Some('=') => single(Token::GreaterEqual, self),
                    _ => Ok(Token::Greater),
                }
            }
            '!' if self.peek() == Some('=') => {
                self.advance();
                single(Token::NotEqual, self)
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                single(Token::Concat, self)
            }
            '$' => self.read_parameter(),
            ':' => self.read_named_parameter(),
            '\'' => self.read_string(),
            '"' => self.read_quoted_identifier(),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier()),
            c if c.is_ascii_digit() => Ok(self.read_number()),
            c => bail!("Unexpected character '{}' at position {}", c, self.position),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current_char(), Some(ch) if ch.is_whitespace()) {
            self.advance();
        }
    }

    /// Skip single-line comments starting with --
    fn skip_comment(&mut self) {
        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.position;
        while matches!(self.current_char(), Some(ch) if pred(ch)) {
            self.advance();
        }
        self.input[start..self.position].iter().collect()
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let identifier = self.read_while(|ch| ch.is_alphanumeric() || ch == '_');
        Token::keyword_from_str(&identifier).unwrap_or(Token::Identifier(identifier))
    }

    /// Read `$n`
    fn read_parameter(&mut self) -> Result<Token> {
        let start = self.position;
        self.advance(); // Skip '$'
        let digits = self.read_while(|ch| ch.is_ascii_digit());
        if digits.is_empty() {
            bail!("Expected parameter number after '$' at position {}", start);
        }
        let index: usize = digits
            .parse()
            .with_context(|| format!("Parameter number ${} is too large", digits))?;
        if index == 0 {
            bail!("Parameter numbers start at $1");
        }
        if index > BindVariables::MAX_POSITIONAL {
            bail!(
                "Parameter number ${} exceeds the maximum of ${}",
                index,
                BindVariables::MAX_POSITIONAL
            );
        }
        Ok(Token::Parameter(index))
    }

    /// Read `:name`
    fn read_named_parameter(&mut self) -> Result<Token> {
        let start = self.position;
        self.advance(); // Skip ':'
        let name = self.read_while(|ch| ch.is_alphanumeric() || ch == '_');
        if name.is_empty() {
            bail!("Expected parameter name after ':' at position {}", start);
        }
        Ok(Token::NamedParameter(name))
    }

    /// Read a quoted identifier (e.g., "column name")
    fn read_quoted_identifier(&mut self) -> Result<Token> {
        let start = self.position;
        self.advance(); // Skip opening quote
        let mut identifier = String::new();

        loop {
            match self.current_char() {
                Some('"') if self.peek() == Some('"') => {
                    identifier.push('"');
                    self.advance();
                    self.advance();
                }
                Some('"') => {
                    self.advance();
                    return Ok(Token::Identifier(identifier));
                }
                Some(ch) => {
                    identifier.push(ch);
                    self.advance();
                }
                None => bail!("Unterminated quoted identifier starting at {}", start),
            }
        }
    }

    /// Read a string literal
    fn read_string(&mut self) -> Result<Token> {
        let start = self.position;
        self.advance(); // Skip opening quote
        let mut string = String::new();

        loop {
            match self.current_char() {
                // Handle escaped single quotes
                Some('\'') if self.peek() == Some('\'') => {
                    string.push('\'');
                    self.advance();
                    self.advance();
                }
                Some('\'') => {
                    self.advance();
                    return Ok(Token::String(string));
                }
                Some(ch) => {
                    string.push(ch);
                    self.advance();
                }
                None => bail!("Unterminated string literal starting at {}", start),
            }
        }
    }

    /// Read a number (integer or decimal, optional exponent)
    fn read_number(&mut self) -> Token {
        let mut number = self.read_while(|ch| ch.is_ascii_digit());

        if self.current_char() == Some('.') && self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
            number.push('.');
            number.push_str(&self.read_while(|ch| ch.is_ascii_digit()));
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            let sign = matches!(self.peek(), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self
                .input
                .get(self.position + digit_at)
                .map_or(false, |c| c.is_ascii_digit())
            {
                for _ in 0..digit_at {
                    number.push(self.input[self.position]);
                    self.advance();
                }
                number.push_str(&self.read_while(|ch| ch.is_ascii_digit()));
            }
        }

        Token::Number(number)
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }

        Ok(tokens)
    }
}
