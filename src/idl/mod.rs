//! Avro IDL frontend.

mod lexer;
mod parser;

pub use lexer::{KEYWORDS, LexError, Lexed, Lexer, Token, TokenKind, matching_brace};
pub use parser::{ParseError, parse_idl};
