//! Cartograph CLI library
//!
//! This module contains the core CLI logic for the Cartograph diagram
//! compiler.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, io};

use log::{info, warn};
use serde::Serialize;

use cartograph::{CartographError, CompiledDiagram, DiagramBuilder, ParseError};

use error_adapter::{DiagnosticAdapter, render};

/// JSON document written to the output file.
#[derive(Debug, Serialize)]
struct Output<'a> {
    diagrams: &'a [CompiledDiagram],
}

/// Run the Cartograph CLI application
///
/// This function processes the input file through the Cartograph pipeline
/// and writes every laid-out diagram as JSON to the output file. With
/// `--validate-only` it stops after container validation and writes nothing.
///
/// # Errors
///
/// Returns `CartographError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
/// - Validation errors
/// - Layout errors
pub fn run(args: &Args) -> Result<(), CartographError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;
    let builder = DiagramBuilder::new(app_config);

    if args.validate_only {
        return validate_only(&builder, &source);
    }

    let compilation = builder.compile(&source)?;
    report_warnings(&compilation.parse_warnings, &source);
    for diagram in &compilation.diagrams {
        let name = diagram.name.as_deref().unwrap_or("<unnamed>");
        for message in &diagram.warnings {
            warn!(diagram = name; "{message}");
        }
        if !diagram.complete {
            warn!(diagram = name; "Result is incomplete: the iteration or time budget ran out");
        }
    }

    let json = serde_json::to_string_pretty(&Output {
        diagrams: &compilation.diagrams,
    })
    .map_err(io::Error::other)?;
    fs::write(&args.output, json)?;

    info!(
        output_file = args.output,
        diagrams = compilation.diagrams.len();
        "Layout exported successfully"
    );

    Ok(())
}

fn validate_only(builder: &DiagramBuilder, source: &str) -> Result<(), CartographError> {
    let parsed = builder.parse(source)?;
    report_warnings(&parsed.warnings, source);

    for diagram in parsed.document.diagrams() {
        let report = builder.validate(diagram);
        let name = diagram.name.as_deref().unwrap_or("<unnamed>");
        for issue in &report.warnings {
            warn!(diagram = name; "{issue}");
        }
        if !report.is_valid() {
            return Err(CartographError::Validation(report));
        }
    }

    info!("Validation passed");
    Ok(())
}

fn report_warnings(warnings: &[ParseError], source: &str) {
    for warning in warnings {
        let rendered = render(&DiagnosticAdapter::from_parse_error(warning, source));
        warn!("{rendered}");
    }
}
