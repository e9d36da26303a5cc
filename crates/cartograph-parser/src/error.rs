//! Error and diagnostic system for the Cartograph parser.
//!
//! Diagnostics carry an [`ErrorCode`], one or more labeled spans and optional
//! help text. The lexer and the AST converter report every problem they find
//! through a [`DiagnosticCollector`]; the grammar parser stops at the first.
//! Before leaving the crate each diagnostic is resolved to a 1-based line and
//! column and wrapped in a [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use cartograph_parser::error::{Diagnostic, ErrorCode};
//! # use cartograph_parser::Span;
//!
//! let diag = Diagnostic::error("unknown shape `rectange`")
//!     .with_code(ErrorCode::W300)
//!     .with_label(Span::new(12..20), "not in the shape catalog")
//!     .with_help("did you mean `rectangle`?");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;

/// A type alias for `Result<T, Diagnostic>`.
pub(crate) type Result<T> = std::result::Result<T, Diagnostic>;
