//! Error types for Cartograph operations.
//!
//! This module provides the main error type [`CartographError`] which wraps
//! the conditions that stop a diagram from being compiled.

use std::io;

use thiserror::Error;

use cartograph_core::shape::RegistryError;
use cartograph_parser::ParseError;

use crate::validate::ValidationReport;

/// The main error type for Cartograph operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps every parse error together with the source text
/// so callers can render rich reports with labeled spans.
#[derive(Debug, Error)]
pub enum CartographError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{}", parse_summary(errors))]
    Parse { errors: Vec<ParseError>, src: String },

    #[error("Validation failed with {} error(s)", .0.errors.len())]
    Validation(ValidationReport),

    #[error("Shape registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Layout error: {0}")]
    Layout(String),
}

impl CartographError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(errors: Vec<ParseError>, src: impl Into<String>) -> Self {
        Self::Parse {
            errors,
            src: src.into(),
        }
    }
}

fn parse_summary(errors: &[ParseError]) -> String {
    match errors {
        [] => "Parse failed".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}
