pub mod ast;
pub mod axis;
pub mod cursor;
pub mod lex;
pub mod modifier;
pub mod parse;
pub mod report;
pub mod statement;
pub mod types;
pub mod value;

use miette::Diagnostic;
use thiserror::Error;

pub use ast::{Ast, Figure, Renderer, Statement};
pub use lex::{LexError, Lexer, Token, TokenKind};
pub use parse::{ParseError, Parser};
pub use report::{ErrorClass, Report};

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

impl Error {
    /// The banner and caret block describing this error.
    pub fn report(&self) -> &Report {
        match self {
            Error::Lex(e) => e.report(),
            Error::Parse(e) => e.report(),
        }
    }
}

/// Tokenizes and parses a whole source file.
pub fn parse(filename: Option<&str>, source: &str) -> Result<Ast, Error> {
    let tokens = Lexer::new(filename, source).tokenize()?;
    Ok(Parser::new(filename, source, &tokens).parse()?)
}
