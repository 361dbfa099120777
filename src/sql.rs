// SQL module - predicate lexing and compilation

pub mod compiler;
pub mod lexer;
pub mod token;

pub use compiler::{compile, schema_types, Compiler};
pub use lexer::Lexer;
pub use token::Token;
