//! Diagnostics resolved to source positions.

use std::fmt;

use crate::{
    error::{Diagnostic, ErrorCode, Severity},
    span::{SourceMap, Span},
};

/// A diagnostic located at a 1-based line and column.
///
/// This is what [`parse`](crate::parse) reports in its `errors` and
/// `warnings` lists.
#[derive(Debug, Clone)]
pub struct ParseError {
    diagnostic: Diagnostic,
    line: usize,
    column: usize,
}

impl ParseError {
    /// Resolves the diagnostic's primary span against `source_map`.
    ///
    /// Diagnostics without a span are placed at line 1, column 1.
    pub fn locate(diagnostic: Diagnostic, source_map: &SourceMap<'_>) -> Self {
        let (line, column) = diagnostic
            .primary_span()
            .map_or((1, 1), |span| source_map.line_column(span.start()));
        Self {
            diagnostic,
            line,
            column,
        }
    }

    pub fn message(&self) -> &str {
        self.diagnostic.message()
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn severity(&self) -> Severity {
        self.diagnostic.severity()
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.diagnostic.code()
    }

    pub fn help(&self) -> Option<&str> {
        self.diagnostic.help()
    }

    pub fn span(&self) -> Option<Span> {
        self.diagnostic.primary_span()
    }

    /// The underlying diagnostic with all of its labels.
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.diagnostic)
    }
}

impl std::error::Error for ParseError {}
