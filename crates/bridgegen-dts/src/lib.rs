//! TypeScript declaration file (.d.ts) parser for bridgegen.
//!
//! A recursive descent parser that keeps JSDoc blocks attached to the
//! declarations and members they document, so API descriptions and
//! `@deprecated` markers survive into the extracted surface.

#![allow(clippy::collapsible_if, clippy::collapsible_else_if)]

mod ast;
mod jsdoc;
mod lexer;
mod parser;

pub use ast::*;
pub use jsdoc::JsDoc;
pub use lexer::{line_col, Keyword, Lexer, Token, TokenKind};
pub use parser::{parse, parse_type_str, ParseError, ParseResult};
