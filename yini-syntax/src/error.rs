//! Lex and parse error taxonomy (spec.md §7 "Lex" and "Parse" kinds).

use std::fmt;

use thiserror::Error;

use crate::position::Position;

/// The four fields every diagnostic carries (spec.md §7): kind-specific
/// message, source position, and an optional offending name/lexeme. Shared
/// across variants the way `diskplan_filesystem::Attrs`/`SetAttrs` share one
/// attribute struct rather than duplicating `owner`/`group`/`mode` per call
/// site.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSite {
    pub position: Position,
    pub name: Option<String>,
}

impl ErrorSite {
    pub fn at(position: Position) -> Self {
        ErrorSite {
            position,
            name: None,
        }
    }

    pub fn named(position: Position, name: impl Into<String>) -> Self {
        ErrorSite {
            position,
            name: Some(name.into()),
        }
    }
}

impl fmt::Display for ErrorSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} (at {})", name, self.position),
            None => write!(f, "at {}", self.position),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("unexpected character {}", .0)]
    UnexpectedChar(ErrorSite),

    #[error("unterminated string {}", .0)]
    UnterminatedString(ErrorSite),

    #[error("unterminated block comment {}", .0)]
    UnterminatedBlockComment(ErrorSite),

    #[error("unterminated section header {}", .0)]
    UnterminatedSection(ErrorSite),

    #[error("expected {expected}, found {found} {site}")]
    ExpectedToken {
        expected: String,
        found: String,
        site: ErrorSite,
    },

    #[error("expected expression {}", .0)]
    ExpectedExpression(ErrorSite),

    #[error("invalid schema rule {}", .0)]
    InvalidRule(ErrorSite),

    #[error("invalid constructor call {}", .0)]
    InvalidConstructor(ErrorSite),
}

impl Error {
    /// The source position at which this error was detected, used to decide
    /// whether a later cascading error should be preferred or suppressed —
    /// lexer and parser errors never recover in this specification (spec.md
    /// §4.3), so only the first error per file is ever surfaced, but callers
    /// that aggregate across files still want this for sorting/reporting.
    pub fn position(&self) -> &Position {
        match self {
            Error::UnexpectedChar(site)
            | Error::UnterminatedString(site)
            | Error::UnterminatedBlockComment(site)
            | Error::UnterminatedSection(site)
            | Error::ExpectedExpression(site)
            | Error::InvalidRule(site)
            | Error::InvalidConstructor(site) => &site.position,
            Error::ExpectedToken { site, .. } => &site.position,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
