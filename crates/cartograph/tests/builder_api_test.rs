//! Integration tests for the DiagramBuilder API
//!
//! These tests drive the full pipeline through the public API only.

use cartograph::{
    CartographError, DiagramBuilder, PathKind,
    config::AppConfig,
    metrics::MetricsOutcome,
    validate::ValidationIssue,
};

#[test]
fn test_compile_simple_diagram() {
    let source = r#"
        diagram "Shop" {
            shape web "Web Server" @rectangle
            shape db @cylinder
            web -> db "query"
        }
    "#;

    let compilation = DiagramBuilder::default()
        .compile(source)
        .expect("Should compile valid diagram");

    assert_eq!(compilation.diagrams.len(), 1);
    let diagram = &compilation.diagrams[0];
    assert_eq!(diagram.name.as_deref(), Some("Shop"));
    assert!(diagram.complete);
    assert!(diagram.metrics.is_none());
    assert_eq!(diagram.layout.nodes.len(), 2);
    assert_eq!(diagram.layout.edges.len(), 1);
    assert!(diagram.layout.edges[0].is_routed());
    assert_eq!(diagram.layout.edges[0].edge.label.as_deref(), Some("query"));
}

#[test]
fn test_parse_invalid_syntax_returns_error() {
    let result = DiagramBuilder::default().parse("diagram { a -> }");

    match result {
        Err(CartographError::Parse { errors, src }) => {
            assert!(!errors.is_empty());
            assert_eq!(src, "diagram { a -> }");
        }
        other => panic!("Expected parse error, got {other:?}"),
    }
}

#[test]
fn test_unknown_shape_is_a_parse_warning() {
    let parsed = DiagramBuilder::default()
        .parse("diagram { shape a @blob }")
        .expect("Unknown shapes should not fail parsing");

    assert_eq!(parsed.warnings.len(), 1);
    assert!(parsed.warnings[0].to_string().contains("blob"));
}

#[test]
fn test_registered_alias_resolves_shape() {
    let mut builder = DiagramBuilder::default();
    builder
        .register_alias("store", "cylinder")
        .expect("cylinder is a built-in shape");

    let parsed = builder
        .parse("diagram { shape a @store }")
        .expect("Should parse");
    assert!(parsed.warnings.is_empty());
}

#[test]
fn test_register_alias_rejects_unknown_target() {
    let mut builder = DiagramBuilder::default();
    let result = builder.register_alias("cloud", "nebula");
    assert!(matches!(result, Err(CartographError::Registry(_))));
}

#[test]
fn test_unknown_container_child_fails_validation() {
    let source = "diagram {\n  shape a\n  container g children: [a, ghost]\n}";

    match DiagramBuilder::default().compile(source) {
        Err(CartographError::Validation(report)) => {
            assert!(!report.valid);
            assert!(report.errors.iter().any(|issue| matches!(
                issue,
                ValidationIssue::UnknownChild { child, .. } if child == "ghost"
            )));
        }
        other => panic!("Expected validation error, got {other:?}"),
    }
}

#[test]
fn test_warnings_as_errors() {
    let source = "diagram {\n  shape a\n  container g\n}";

    let lenient = DiagramBuilder::default()
        .compile(source)
        .expect("Empty containers are only a warning");
    assert_eq!(lenient.diagrams[0].validation.warnings.len(), 1);
    assert_eq!(lenient.diagrams[0].warnings.len(), 1);

    let mut config = AppConfig::default();
    config.validation.warnings_as_errors = true;
    match DiagramBuilder::new(config).compile(source) {
        Err(CartographError::Validation(report)) => {
            assert!(!report.valid);
            assert!(report.warnings.is_empty());
            assert!(matches!(
                report.errors.as_slice(),
                [ValidationIssue::EmptyContainer { .. }]
            ));
        }
        other => panic!("Expected strict validation failure, got {other:?}"),
    }
}

#[test]
fn test_requested_metrics_are_computed() {
    let source = r#"
        diagram {
            shape hub metrics: [degree, closeness]
            hub -> a
            hub -> b
            a -> b
        }
    "#;

    let compilation = DiagramBuilder::default().compile(source).expect("Should compile");
    let MetricsOutcome { metrics, complete } = compilation.diagrams[0]
        .metrics
        .clone()
        .expect("hub requested metrics");

    assert!(complete);
    let hub = &metrics["hub"];
    assert_eq!(hub.degree, Some(2));
    assert!(hub.closeness.is_some());
    assert!(hub.clustering.is_none());
    assert!(!metrics.contains_key("a"));
}

#[test]
fn test_metrics_enabled_by_config() {
    let mut config = AppConfig::default();
    config.metrics.enabled = true;
    config.metrics.all_nodes = true;

    let compilation = DiagramBuilder::new(config)
        .compile("diagram { a -> b }")
        .expect("Should compile");
    let outcome = compilation.diagrams[0].metrics.as_ref().expect("metrics enabled");
    assert_eq!(outcome.metrics.len(), 2);
}

#[test]
fn test_only_generic_diagrams_are_laid_out() {
    let source = "sequence { A -> B }\n\ndiagram { shape a }";

    let compilation = DiagramBuilder::default().compile(source).expect("Should compile");
    assert_eq!(compilation.document.profiles.len(), 2);
    assert_eq!(compilation.diagrams.len(), 1);
    assert_eq!(compilation.diagrams[0].layout.nodes.len(), 1);
}

#[test]
fn test_circular_algorithm_produces_arcs() {
    let source = "diagram {\n  algorithm: circular\n  a -> b\n  b -> c\n  c -> a\n}";

    let compilation = DiagramBuilder::default().compile(source).expect("Should compile");
    let layout = &compilation.diagrams[0].layout;
    assert_eq!(layout.edges.len(), 3);
    assert!(layout.edges.iter().all(|edge| edge.path == PathKind::Arc));
}

#[test]
fn test_compiled_diagram_serializes_to_json() {
    let compilation = DiagramBuilder::default()
        .compile("diagram { a -> b }")
        .expect("Should compile");

    let json = serde_json::to_value(&compilation.diagrams[0]).expect("Should serialize");
    assert_eq!(json["complete"], serde_json::Value::Bool(true));
    assert_eq!(json["layout"]["nodes"].as_array().map(Vec::len), Some(2));
    assert!(json.get("metrics").is_none());
}
