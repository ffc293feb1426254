mod error;
mod lexer;


pub use error::{ParseError, ParseErrors, Position, Span};
pub use lexer::{Token, Tokenizer};
