//! Lexer, parser, and AST for the YINI configuration language.
//!
//! This crate covers components A–C of the pipeline (Source Reader, Lexer,
//! Parser). It has no knowledge of includes, macros, inheritance, or
//! evaluation — those live in `yini-runtime`, which consumes this crate's
//! [`ast::Document`].

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod reader;
pub mod token;
pub mod value;

pub use ast::Document;
pub use error::{Error, ErrorSite, Result};
pub use position::{LineIndex, Position};
pub use reader::SourceFile;
pub use value::Value;

use std::sync::Arc;

use camino::Utf8Path;

/// Lexes and parses a source file's text into a [`Document`].
pub fn parse_str(text: &str, path: impl AsRef<Utf8Path>) -> Result<Document> {
    let file = Arc::new(path.as_ref().to_owned());
    let line_index = LineIndex::new(text);
    let tokens = lexer::Lexer::new(text, file, &line_index).tokenize()?;
    parser::parse(tokens)
}

/// Lexes and parses an already-loaded [`SourceFile`].
pub fn parse_source_file(source: &SourceFile) -> Result<Document> {
    let tokens = lexer::Lexer::new(&source.text, source.path.clone(), &source.line_index)
        .tokenize()?;
    parser::parse(tokens)
}
