//! Public re-export of the YINI document façade and its underlying syntax
//! types, for embedders that want the library without the CLI binary.

pub use yini_config::{Diagnostic, Document, Error, Options, Result};
pub use yini_syntax::Value;
