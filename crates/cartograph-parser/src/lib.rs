//! # Cartograph Parser
//!
//! Parser for the Cartograph diagram language. This crate turns source text
//! into the typed profile model of [`cartograph_core::ast`].
//!
//! ## Usage
//!
//! ```
//! # use cartograph_parser::{parse, ParseConfig};
//! let source = r#"
//!     diagram "Checkout" {
//!         shape web "Web Server" @rectangle
//!         shape db @cylinder
//!         web -> db "query"
//!     }
//! "#;
//!
//! let outcome = parse(source, &ParseConfig::default());
//! assert!(outcome.success);
//! assert_eq!(outcome.document.map(|d| d.profiles.len()), Some(1));
//! ```

pub mod error;
mod convert;
mod lexer;
mod parser;
#[cfg(test)]
mod parser_tests;
mod parser_types;
mod span;
pub mod suggest;
mod tokens;
mod unescape;

pub use convert::slugify;
pub use error::{ParseError, Severity};
pub use span::Span;
pub use suggest::find_closest_matches;
pub use unescape::unescape_string;

use log::{debug, info};

use cartograph_core::{
    ast::{Document, Profile},
    shape::ShapeRegistry,
};

use convert::ConvertContext;
use error::Diagnostic;
use span::SourceMap;
use suggest::SuggestOptions;

/// Options for a [`parse`] run.
#[derive(Debug, Clone, Default)]
pub struct ParseConfig<'a> {
    /// Shape catalog used to flag unknown `@shape` references. Without one,
    /// any shape name is accepted.
    pub shapes: Option<&'a ShapeRegistry>,
    /// Limits for "did you mean" hints.
    pub suggestions: SuggestOptions,
}

impl<'a> ParseConfig<'a> {
    pub fn with_shapes(mut self, shapes: &'a ShapeRegistry) -> Self {
        self.shapes = Some(shapes);
        self
    }

    pub fn with_suggestions(mut self, suggestions: SuggestOptions) -> Self {
        self.suggestions = suggestions;
        self
    }
}

/// Result of [`parse`]. Parsing reports problems here instead of failing.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// `true` when no error was reported. Warnings do not count.
    pub success: bool,
    /// Every converted profile. Only set on success.
    pub document: Option<Document>,
    /// The first profile of the document. Only set on success.
    pub diagram: Option<Profile>,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<ParseError>,
}

impl ParseOutcome {
    fn failed(errors: Vec<ParseError>) -> Self {
        Self {
            success: false,
            document: None,
            diagram: None,
            errors,
            warnings: Vec::new(),
        }
    }
}

/// Parse source text into the profile model.
///
/// The pipeline runs in three stages:
///
/// 1. **Tokenize** - every lexical error is collected
/// 2. **Parse** - builds the syntax tree, stopping at the first grammar error
/// 3. **Convert** - maps each profile block to its typed model, collecting
///    every conversion error and warning
///
/// A later stage only runs when the previous one succeeded. Diagnostics are
/// resolved to 1-based line and column numbers.
///
/// # Example
///
/// ```
/// # use cartograph_parser::{parse, ParseConfig};
/// let outcome = parse("sequence { message from: A to: B }", &ParseConfig::default());
/// assert!(outcome.success);
///
/// let outcome = parse("sequence { message to: B }", &ParseConfig::default());
/// assert!(!outcome.success);
/// assert_eq!(outcome.errors[0].line(), 1);
/// ```
pub fn parse(source: &str, config: &ParseConfig<'_>) -> ParseOutcome {
    let source_map = SourceMap::new(source);
    let locate = |diagnostics: Vec<Diagnostic>| -> Vec<ParseError> {
        diagnostics
            .into_iter()
            .map(|diagnostic| ParseError::locate(diagnostic, &source_map))
            .collect()
    };

    // Step 1: Tokenize
    let tokens = match lexer::tokenize(source) {
        Ok(tokens) => tokens,
        Err(diagnostics) => {
            debug!(errors = diagnostics.len(); "Lexing failed");
            return ParseOutcome::failed(locate(diagnostics));
        }
    };

    // Step 2: Parse
    let syntax = match parser::build_document(&tokens) {
        Ok(syntax) => syntax,
        Err(diagnostic) => {
            debug!(code:? = diagnostic.code(); "Parsing failed");
            return ParseOutcome::failed(locate(vec![diagnostic]));
        }
    };

    // Step 3: Convert
    let mut ctx = ConvertContext::new(config.shapes, config.suggestions);
    let document = convert::convert_document(&syntax, &mut ctx);
    let (errors, warnings): (Vec<_>, Vec<_>) = ctx
        .into_diagnostics()
        .into_iter()
        .partition(|diagnostic| diagnostic.severity().is_error());

    let success = errors.is_empty();
    info!(
        profiles = document.profiles.len(),
        errors = errors.len(),
        warnings = warnings.len();
        "Parsed document"
    );

    ParseOutcome {
        success,
        diagram: success.then(|| document.primary().cloned()).flatten(),
        document: success.then_some(document),
        errors: locate(errors),
        warnings: locate(warnings),
    }
}
