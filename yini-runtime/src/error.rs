//! Load/Resolve/Validate error taxonomy (spec.md §7).

use thiserror::Error;
use yini_syntax::position::Position;
use yini_syntax::ErrorSite;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("include not found: {path} {site}")]
    FileNotFound { path: String, site: ErrorSite },

    #[error("undefined macro {}", .0)]
    UndefinedMacro(ErrorSite),

    #[error("circular macro reference {}", .0)]
    CircularMacro(ErrorSite),

    #[error("circular inheritance {}", .0)]
    CircularInheritance(ErrorSite),

    #[error("parent section not found {}", .0)]
    ParentSectionNotFound(ErrorSite),

    #[error("value used before it is resolved {}", .0)]
    UseBeforeResolution(ErrorSite),

    #[error("circular cross-reference {}", .0)]
    CircularReference(ErrorSite),

    #[error("undefined cross-reference {}", .0)]
    UndefinedCrossRef(ErrorSite),

    #[error("missing environment variable {}", .0)]
    MissingEnvVar(ErrorSite),

    #[error("invalid operator use {}", .0)]
    InvalidOperator(ErrorSite),

    #[error("division by zero {}", .0)]
    DivisionByZero(ErrorSite),

    #[error("invalid hex color {}", .0)]
    InvalidHexColor(ErrorSite),

    #[error("nested Dyna(...) is not allowed {}", .0)]
    NestedDyna(ErrorSite),

    #[error("duplicate member in set literal {}", .0)]
    DuplicateSetMember(ErrorSite),

    #[error("unknown constructor or bad arity {}", .0)]
    InvalidConstructor(ErrorSite),
}

impl Error {
    pub fn position(&self) -> &Position {
        match self {
            Error::FileNotFound { site, .. } => &site.position,
            Error::UndefinedMacro(site)
            | Error::CircularMacro(site)
            | Error::CircularInheritance(site)
            | Error::ParentSectionNotFound(site)
            | Error::UseBeforeResolution(site)
            | Error::CircularReference(site)
            | Error::UndefinedCrossRef(site)
            | Error::MissingEnvVar(site)
            | Error::InvalidOperator(site)
            | Error::DivisionByZero(site)
            | Error::InvalidHexColor(site)
            | Error::NestedDyna(site)
            | Error::DuplicateSetMember(site)
            | Error::InvalidConstructor(site) => &site.position,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Schema Validator diagnostics (spec.md §4.6): collected, not fatal, so a
/// single validation pass can report every violation at once.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingSection {
        section: String,
    },
    MissingKey {
        section: String,
        key: String,
    },
    TypeMismatch {
        section: String,
        key: String,
        expected: String,
        found: String,
    },
    OutOfRange {
        section: String,
        key: String,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingSection { section } => {
                write!(f, "missing required section {section}")
            }
            ValidationError::MissingKey { section, key } => {
                write!(f, "missing required key {section}.{key}")
            }
            ValidationError::TypeMismatch {
                section,
                key,
                expected,
                found,
            } => write!(
                f,
                "{section}.{key}: expected {expected}, found {found}"
            ),
            ValidationError::OutOfRange {
                section,
                key,
                value,
                min,
                max,
            } => write!(
                f,
                "{section}.{key}: value {value} out of range ({min:?}..={max:?})"
            ),
        }
    }
}
