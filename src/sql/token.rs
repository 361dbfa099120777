// SQL tokens for lexical analysis of predicates

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Identifier(String),
    Number(String),
    String(String),

    // Placeholders
    /// `$n`, 1-based
    Parameter(usize),
    /// `:name`
    NamedParameter(String),
    /// `?`
    QuestionMark,

    // Keywords
    And,
    Or,
    Not,
    Null,
    In,
    Between,
    Like,
    Is,
    True,
    False,
    Date,
    Timestamp,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Concat,

    // Delimiters
    LeftParen,
    RightParen,
    Comma,

    // Special
    Eof,
}

impl Token {
    /// Check if the token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::And
                | Token::Or
                | Token::Not
                | Token::Null
                | Token::In
                | Token::Between
                | Token::Like
                | Token::Is
                | Token::True
                | Token::False
                | Token::Date
                | Token::Timestamp
        )
    }

    /// Check if the token is a bind variable placeholder
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            Token::Parameter(_) | Token::NamedParameter(_) | Token::QuestionMark
        )
    }

    /// Convert a string to a keyword token if it matches
    pub fn keyword_from_str(s: &str) -> Option<Token> {
        match s.to_uppercase().as_str() {
            "AND" => Some(Token::And),
            "OR" => Some(Token::Or),
            "NOT" => Some(Token::Not),
            "NULL" => Some(Token::Null),
            "IN" => Some(Token::In),
            "BETWEEN" => Some(Token::Between),
            "LIKE" => Some(Token::Like),
            "IS" => Some(Token::Is),
            "TRUE" => Some(Token::True),
            "FALSE" => Some(Token::False),
            "DATE" => Some(Token::Date),
            "TIMESTAMP" => Some(Token::Timestamp),
            _ => None,
        }
    }
}
