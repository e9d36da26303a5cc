//! Error adapter for converting CartographError to miette diagnostics.
//!
//! This module provides the bridge between the library's error types and
//! miette's rich diagnostic formatting used in the CLI.
//!
//! # Multi-Error Support
//!
//! A [`CartographError::Parse`] carries every parse error of the source; each
//! one is rendered as its own report. Parse warnings use the same adapter
//! with warning severity.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity as MietteSeverity, SourceSpan};

use cartograph::{CartographError, ParseError, Severity};
use cartograph_parser::{Span, error::Diagnostic};

/// Adapter for a single parser diagnostic.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    /// Source code for displaying snippets
    src: &'a str,
}

impl<'a> DiagnosticAdapter<'a> {
    pub fn new(diag: &'a Diagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }

    /// Adapter for a located parse error or warning.
    pub fn from_parse_error(error: &'a ParseError, src: &'a str) -> Self {
        Self::new(error.diagnostic(), src)
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<MietteSeverity> {
        Some(match self.diag.severity() {
            Severity::Error => MietteSeverity::Error,
            Severity::Warning => MietteSeverity::Warning,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let span = span_to_miette(label.span());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Adapter for [`CartographError`] variants without source spans.
pub struct ErrorAdapter<'a>(pub &'a CartographError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CartographError::Io(_) => "cartograph::io",
            CartographError::Parse { .. } => return None,
            CartographError::Validation(_) => "cartograph::validation",
            CartographError::Registry(_) => "cartograph::registry",
            CartographError::Layout(_) => "cartograph::layout",
        };
        Some(Box::new(code))
    }

    /// Lists every validation issue, one per line.
    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let CartographError::Validation(report) = &self.0 else {
            return None;
        };
        let lines: Vec<String> = report
            .errors
            .iter()
            .map(|issue| format!("error: {issue}"))
            .chain(report.warnings.iter().map(|issue| format!("warning: {issue}")))
            .collect();
        (!lines.is_empty()).then(|| Box::new(lines.join("\n")) as Box<dyn fmt::Display>)
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A rich diagnostic with source location information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn severity(&self) -> Option<MietteSeverity> {
        match self {
            Reportable::Diagnostic(d) => d.severity(),
            Reportable::Error(e) => e.severity(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

fn span_to_miette(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Convert a [`CartographError`] into a list of reportable errors.
///
/// [`CartographError::Parse`] yields one [`Reportable`] per parse error;
/// every other variant yields a single one.
pub fn to_reportables(err: &CartographError) -> Vec<Reportable<'_>> {
    match err {
        CartographError::Parse { errors, src } if !errors.is_empty() => errors
            .iter()
            .map(|error| Reportable::Diagnostic(DiagnosticAdapter::from_parse_error(error, src)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

/// Render a reportable with miette's graphical handler.
pub fn render(reportable: &dyn MietteDiagnostic) -> String {
    let mut writer = String::new();
    let handler = miette::GraphicalReportHandler::new();
    if handler.render_report(&mut writer, reportable).is_err() {
        // Writing to a `String` only fails if a formatter does.
        writer = reportable.to_string();
    }
    writer
}

#[cfg(test)]
mod tests {
    use cartograph::{
        shape::ShapeRegistry,
        validate::{ValidationIssue, ValidationReport},
    };
    use cartograph_parser::{ParseConfig, parse};

    use super::*;

    fn parse_error(source: &str) -> CartographError {
        let outcome = parse(source, &ParseConfig::default());
        assert!(!outcome.success, "source should fail to parse");
        CartographError::new_parse_error(outcome.errors, source)
    }

    #[test]
    fn test_parse_errors_become_diagnostics() {
        let err = parse_error("diagram { a -> }");

        let reportables = to_reportables(&err);
        assert!(!reportables.is_empty());
        for reportable in &reportables {
            assert!(matches!(reportable, Reportable::Diagnostic(_)));
            assert!(reportable.source_code().is_some());
            assert!(reportable.labels().is_some());
            assert_eq!(reportable.severity(), Some(MietteSeverity::Error));
        }
    }

    #[test]
    fn test_parse_error_code_is_reported() {
        let err = parse_error("diagram {\n  shape a\n");

        let reportables = to_reportables(&err);
        let code = reportables[0].code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("E101"));
    }

    #[test]
    fn test_warning_severity() {
        let source = "diagram { shape a @blob }";
        let shapes = ShapeRegistry::with_builtins();
        let outcome = parse(source, &ParseConfig::default().with_shapes(&shapes));
        assert_eq!(outcome.warnings.len(), 1);

        let adapter = DiagnosticAdapter::from_parse_error(&outcome.warnings[0], source);
        assert_eq!(adapter.severity(), Some(MietteSeverity::Warning));
    }

    #[test]
    fn test_non_parse_error() {
        let err = CartographError::Layout("placement failed".to_string());

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Layout error: placement failed");
                assert_eq!(e.code().map(|c| c.to_string()).as_deref(), Some("cartograph::layout"));
            }
            Reportable::Diagnostic(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_validation_issues_are_listed_in_help() {
        let report = ValidationReport {
            valid: false,
            errors: vec![ValidationIssue::UnknownChild {
                container: "g".to_string(),
                child: "ghost".to_string(),
            }],
            warnings: vec![],
        };
        let err = CartographError::Validation(report);

        let reportables = to_reportables(&err);
        let help = reportables[0].help().map(|h| h.to_string());
        assert_eq!(
            help.as_deref(),
            Some("error: container `g` references unknown node `ghost`")
        );
    }

    #[test]
    fn test_render_includes_message() {
        let err = parse_error("diagram { a -> }");
        let reportables = to_reportables(&err);

        let rendered = render(&reportables[0]);
        assert!(rendered.contains(&reportables[0].to_string()));
    }
}
