//! Cartograph - A textual diagram language compiled into positioned graphs
//!
//! This library ties the Cartograph stages together: parsing (through
//! `cartograph-parser`), container validation, layout with edge routing, and
//! optional centrality metrics. Rendering is left to the caller, which
//! receives a [`LaidOutDiagram`] per diagram.

pub mod config;
pub mod layout;
pub mod metrics;
pub mod validate;

mod budget;
mod error;
mod structure;

pub use cartograph_core::{ast, geometry, shape, text};
pub use cartograph_core::layout::{
    LaidOutDiagram, PathKind, PositionedContainer, PositionedNode, RoutedEdge,
};
pub use cartograph_parser::{ParseError, Severity};

pub use budget::{Budget, Meter};
pub use error::CartographError;

use log::{debug, info, trace, warn};
use serde::Serialize;

use cartograph_core::{
    ast::{DiagramAst, Document},
    shape::ShapeRegistry,
    text::{ApproximateTextMeasure, TextMeasure},
};
use cartograph_parser::ParseConfig;

use config::AppConfig;
use layout::{LayoutContext, LayoutEngine};
use metrics::MetricsOutcome;
use validate::ValidationReport;

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: Document,
    /// Problems that did not stop parsing, e.g. unknown shapes.
    pub warnings: Vec<ParseError>,
}

/// One diagram after validation, layout and metrics.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledDiagram {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub validation: ValidationReport,
    pub layout: LaidOutDiagram,
    /// Present when a node asked for a metric or metrics are enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsOutcome>,
    /// `false` when layout or metrics ran out of budget.
    pub complete: bool,
    pub warnings: Vec<String>,
}

/// Every diagram of a source file, compiled.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub document: Document,
    pub diagrams: Vec<CompiledDiagram>,
    pub parse_warnings: Vec<ParseError>,
}

/// Builder for parsing and laying out Cartograph diagrams.
///
/// The builder owns its shape registry and text measurement, so several
/// builders with different catalogs can run side by side.
///
/// # Examples
///
/// ```rust
/// use cartograph::{DiagramBuilder, config::AppConfig};
///
/// let source = r#"
///     diagram {
///         shape web "Web"
///         shape db @cylinder
///         web -> db
///     }
/// "#;
///
/// let builder = DiagramBuilder::new(AppConfig::default());
/// let compilation = builder.compile(source).expect("Failed to compile");
///
/// let diagram = &compilation.diagrams[0];
/// assert_eq!(diagram.layout.nodes.len(), 2);
/// assert!(diagram.layout.edges[0].is_routed());
/// ```
pub struct DiagramBuilder {
    config: AppConfig,
    shapes: ShapeRegistry,
    measure: Box<dyn TextMeasure>,
}

impl Default for DiagramBuilder {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl DiagramBuilder {
    /// Create a new diagram builder with the given configuration, the
    /// built-in shapes and approximate text metrics.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            shapes: ShapeRegistry::with_builtins(),
            measure: Box::new(ApproximateTextMeasure::default()),
        }
    }

    /// Replace the shape catalog.
    pub fn with_shapes(mut self, shapes: ShapeRegistry) -> Self {
        self.shapes = shapes;
        self
    }

    /// Replace the text measurement used to size nodes.
    pub fn with_text_measure(mut self, measure: impl TextMeasure + 'static) -> Self {
        self.measure = Box::new(measure);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    /// Register a shape alias.
    ///
    /// # Errors
    ///
    /// Returns `CartographError::Registry` when `canonical` is not a known
    /// shape or `alias` would shadow one.
    pub fn register_alias(
        &mut self,
        alias: impl Into<String>,
        canonical: &str,
    ) -> Result<(), CartographError> {
        self.shapes.register_alias(alias, canonical)?;
        Ok(())
    }

    /// Parse source text into a document.
    ///
    /// # Errors
    ///
    /// Returns `CartographError::Parse` with every reported error and the
    /// source text when parsing fails.
    pub fn parse(&self, source: &str) -> Result<ParsedDocument, CartographError> {
        info!(bytes = source.len(); "Parsing source");
        let config = ParseConfig::default()
            .with_shapes(&self.shapes)
            .with_suggestions(self.config.suggestions.options());
        let outcome = cartograph_parser::parse(source, &config);

        match outcome.document {
            Some(document) if outcome.success => {
                debug!(
                    profiles = document.profiles.len(),
                    warnings = outcome.warnings.len();
                    "Source parsed"
                );
                Ok(ParsedDocument {
                    document,
                    warnings: outcome.warnings,
                })
            }
            _ => {
                warn!(errors = outcome.errors.len(); "Parsing failed");
                Err(CartographError::new_parse_error(outcome.errors, source))
            }
        }
    }

    /// Validate a diagram's containers with the configured limits.
    pub fn validate(&self, diagram: &DiagramAst) -> ValidationReport {
        validate::validate_diagram(diagram, &self.config.validation.options())
    }

    /// Validate, lay out and compute metrics for one diagram.
    ///
    /// # Errors
    ///
    /// Returns `CartographError::Validation` when the diagram has container
    /// errors (or warnings, with `warnings_as_errors`), and
    /// `CartographError::Layout` when layout fails.
    pub fn layout_diagram(&self, diagram: &DiagramAst) -> Result<CompiledDiagram, CartographError> {
        let validation = self.validate(diagram);
        if !validation.is_valid() {
            return Err(CartographError::Validation(validation));
        }
        if self.config.validation.warnings_as_errors && !validation.warnings.is_empty() {
            let mut strict = validation;
            strict.errors.append(&mut strict.warnings);
            strict.valid = false;
            return Err(CartographError::Validation(strict));
        }

        let engine = LayoutEngine::new(self.config.layout.options());
        let context = LayoutContext {
            shapes: &self.shapes,
            measure: self.measure.as_ref(),
        };
        let outcome = engine.layout(diagram, &context)?;
        trace!(diagram:? = outcome.diagram; "Laid out diagram");

        let wants_metrics =
            self.config.metrics.enabled || diagram.nodes.iter().any(|node| !node.metrics.is_empty());
        let metrics = wants_metrics
            .then(|| metrics::compute_metrics(diagram, &self.config.metrics.options()));

        let mut warnings: Vec<String> = validation.warnings.iter().map(ToString::to_string).collect();
        warnings.extend(outcome.warnings);
        let complete = outcome.complete && metrics.as_ref().is_none_or(|m| m.complete);

        Ok(CompiledDiagram {
            name: diagram.name.clone(),
            validation,
            layout: outcome.diagram,
            metrics,
            complete,
            warnings,
        })
    }

    /// Parse `source` and compile every generic diagram in it.
    ///
    /// Other profiles are returned as parsed in the document.
    ///
    /// # Errors
    ///
    /// Returns the first parse, validation or layout error.
    pub fn compile(&self, source: &str) -> Result<Compilation, CartographError> {
        let parsed = self.parse(source)?;
        let diagrams = parsed
            .document
            .diagrams()
            .map(|diagram| self.layout_diagram(diagram))
            .collect::<Result<Vec<_>, _>>()?;
        info!(diagrams = diagrams.len(); "Compilation finished");

        Ok(Compilation {
            document: parsed.document,
            diagrams,
            parse_warnings: parsed.warnings,
        })
    }
}
