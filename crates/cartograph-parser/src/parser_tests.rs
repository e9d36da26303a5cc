//! Grammar tests for the winnow parser.
//!
//! These exercise the profile-agnostic statement grammar directly, without
//! running any profile converter.

use crate::{
    error::ErrorCode,
    lexer, parser,
    parser_types::{Connector, Document, Statement, Value},
};

fn with_document(source: &str, check: impl FnOnce(&Document<'_>)) {
    let tokens = lexer::tokenize(source)
        .unwrap_or_else(|errs| panic!("Expected lexing to succeed, but got: {errs:?}"));
    let document = parser::build_document(&tokens)
        .unwrap_or_else(|err| panic!("Expected parsing to succeed, but got error: {err}"));
    check(&document);
}

fn with_first_statement(source: &str, check: impl FnOnce(&Statement<'_>)) {
    with_document(source, |document| {
        let body = &document.profiles[0].body;
        assert!(!body.is_empty(), "expected at least one statement");
        check(&body[0]);
    });
}

fn assert_parses_successfully(source: &str) {
    with_document(source, |_| {});
}

fn parse_error_code(source: &str) -> ErrorCode {
    let tokens = lexer::tokenize(source).expect("lexer should succeed");
    let err = parser::build_document(&tokens).expect_err("parser should fail");
    err.code().expect("grammar errors carry a code")
}

#[test]
fn test_empty_document() {
    with_document("", |document| assert!(document.profiles.is_empty()));
    with_document("\n  // only a comment\n", |document| {
        assert!(document.profiles.is_empty())
    });
}

#[test]
fn test_empty_profile() {
    with_document("diagram {}", |document| {
        assert_eq!(document.profiles.len(), 1);
        assert_eq!(*document.profiles[0].keyword.inner(), "diagram");
        assert!(document.profiles[0].body.is_empty());
    });
}

#[test]
fn test_profile_header_title_and_properties() {
    with_document(r#"glyphset "Steps" type: process { }"#, |document| {
        let block = &document.profiles[0];
        assert_eq!(
            block.title.as_ref().map(|t| t.inner().as_str()),
            Some("Steps")
        );
        assert_eq!(block.properties.len(), 1);
        assert_eq!(*block.properties[0].key.inner(), "type");
    });
}

#[test]
fn test_brace_on_next_line() {
    assert_parses_successfully("diagram\n{\n  shape a\n}");
}

#[test]
fn test_multiple_profiles() {
    with_document("diagram { shape a }\n\nsequence { A -> B }", |document| {
        assert_eq!(document.profiles.len(), 2);
        assert_eq!(*document.profiles[1].keyword.inner(), "sequence");
    });
}

#[test]
fn test_setting_statement() {
    with_first_statement("diagram {\n  direction: LR\n}", |statement| match statement {
        Statement::Setting(property) => {
            assert_eq!(*property.key.inner(), "direction");
            assert_eq!(*property.value.inner(), Value::Identifier("LR"));
        }
        other => panic!("expected a setting, got {other:?}"),
    });
}

#[test]
fn test_edge_statement_with_label_and_properties() {
    let source = r#"diagram { a -> b "calls" weight: 2.5 }"#;
    with_first_statement(source, |statement| match statement {
        Statement::Edge(edge) => {
            assert_eq!(*edge.from.inner(), Value::Identifier("a"));
            assert_eq!(*edge.connector.inner(), Connector::Arrow);
            assert_eq!(*edge.to.inner(), Value::Identifier("b"));
            assert_eq!(edge.args.len(), 1);
            assert_eq!(*edge.args[0].inner(), Value::String("calls".to_string()));
            assert_eq!(*edge.properties[0].value.inner(), Value::Number(2.5));
        }
        other => panic!("expected an edge, got {other:?}"),
    });
}

#[test]
fn test_every_connector() {
    let cases = [
        ("->", Connector::Arrow),
        ("-->", Connector::DashedArrow),
        ("<->", Connector::DoubleArrow),
        ("<-", Connector::LeftArrow),
        ("=>", Connector::ThickArrow),
        ("--", Connector::DashedLine),
    ];
    for (text, expected) in cases {
        let source = format!("diagram {{ a {text} b }}");
        with_first_statement(&source, |statement| match statement {
            Statement::Edge(edge) => assert_eq!(*edge.connector.inner(), expected, "{text}"),
            other => panic!("expected an edge for {text}, got {other:?}"),
        });
    }
}

#[test]
fn test_quoted_endpoints() {
    let source = r#"sequence { "Web Server" --> "Data Store" }"#;
    with_first_statement(source, |statement| match statement {
        Statement::Edge(edge) => {
            assert_eq!(*edge.from.inner(), Value::String("Web Server".to_string()));
            assert_eq!(*edge.to.inner(), Value::String("Data Store".to_string()));
        }
        other => panic!("expected an edge, got {other:?}"),
    });
}

#[test]
fn test_dotted_endpoints() {
    with_first_statement("electrical { R1.a -> C1.b }", |statement| match statement {
        Statement::Edge(edge) => {
            assert_eq!(*edge.from.inner(), Value::Identifier("R1.a"));
            assert_eq!(*edge.to.inner(), Value::Identifier("C1.b"));
        }
        other => panic!("expected an edge, got {other:?}"),
    });
}

#[test]
fn test_command_with_arguments_and_properties() {
    let source = r#"diagram { shape web "Web Server" @rectangle, color: blue }"#;
    with_first_statement(source, |statement| match statement {
        Statement::Command(command) => {
            assert_eq!(*command.keyword.inner(), "shape");
            assert_eq!(command.args.len(), 3);
            assert_eq!(*command.args[2].inner(), Value::ShapeRef("rectangle"));
            assert_eq!(command.properties.len(), 1);
            assert!(command.body.is_none());
        }
        other => panic!("expected a command, got {other:?}"),
    });
}

#[test]
fn test_properties_separated_by_commas() {
    let source = "sequence { message from: A, to: B, type: async }";
    with_first_statement(source, |statement| match statement {
        Statement::Command(command) => {
            let keys: Vec<&str> = command.properties.iter().map(|p| *p.key.inner()).collect();
            assert_eq!(keys, ["from", "to", "type"]);
        }
        other => panic!("expected a command, got {other:?}"),
    });
}

#[test]
fn test_nested_blocks() {
    let source = r#"
        diagram {
            container api "API" {
                shape handler
                container inner {
                    shape worker
                }
            }
        }
    "#;
    with_first_statement(source, |statement| match statement {
        Statement::Command(command) => {
            let body = command.body.as_ref().expect("container has a body");
            assert_eq!(body.len(), 2);
            match &body[1] {
                Statement::Command(inner) => {
                    assert_eq!(inner.body.as_ref().map(Vec::len), Some(1));
                }
                other => panic!("expected nested container, got {other:?}"),
            }
        }
        other => panic!("expected a command, got {other:?}"),
    });
}

#[test]
fn test_list_values() {
    let source = "diagram { container g children: [a, \"b c\", 3,\n  d,] }";
    with_first_statement(source, |statement| match statement {
        Statement::Command(command) => match command.properties[0].value.inner() {
            Value::List(items) => {
                assert_eq!(items.len(), 4);
                assert_eq!(*items[1].inner(), Value::String("b c".to_string()));
                assert_eq!(*items[2].inner(), Value::Number(3.0));
            }
            other => panic!("expected a list, got {other:?}"),
        },
        other => panic!("expected a command, got {other:?}"),
    });
}

#[test]
fn test_numbers_accept_sign_decimals_and_exponents() {
    let source = "treemap { node a value: -3\n node b value: 1e3\n node c value: 0.75 }";
    with_document(source, |document| {
        let values: Vec<f32> = document.profiles[0]
            .body
            .iter()
            .filter_map(|statement| match statement {
                Statement::Command(command) => command.properties[0].value.as_number(),
                _ => None,
            })
            .collect();
        assert_eq!(values, [-3.0, 1000.0, 0.75]);
    });
}

#[test]
fn test_semicolons_separate_statements() {
    with_document("diagram { shape a; shape b; a -> b }", |document| {
        assert_eq!(document.profiles[0].body.len(), 3);
    });
}

#[test]
fn test_comments_are_ignored() {
    let source = "// header\ndiagram { // trailing\n  shape a // after\n  // own line\n}";
    with_document(source, |document| {
        assert_eq!(document.profiles[0].body.len(), 1);
    });
}

#[test]
fn test_missing_closing_brace_is_end_of_input_error() {
    assert_eq!(parse_error_code("diagram {\n  shape a\n"), ErrorCode::E101);
}

#[test]
fn test_missing_edge_target() {
    assert_eq!(parse_error_code("diagram { a -> }"), ErrorCode::E100);
}

#[test]
fn test_missing_property_value() {
    assert_eq!(parse_error_code("diagram { shape a color: }"), ErrorCode::E100);
}

#[test]
fn test_two_statements_on_one_line_without_separator() {
    assert_eq!(parse_error_code("diagram { a -> b c -> d }"), ErrorCode::E100);
}

#[test]
fn test_stray_token_at_top_level() {
    assert_eq!(parse_error_code("-> diagram {}"), ErrorCode::E100);
}

#[test]
fn test_error_message_names_the_expectation() {
    let tokens = lexer::tokenize("diagram { a -> }").expect("lexer should succeed");
    let err = parser::build_document(&tokens).expect_err("parser should fail");
    assert!(
        err.message().contains("edge target"),
        "unexpected message: {}",
        err.message()
    );
}
