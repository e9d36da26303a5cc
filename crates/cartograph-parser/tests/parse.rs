use cartograph_core::{
    ast::{
        ArrowKind, GlyphsetProfile, LayoutAlgorithm, LineStyle, MessageKind, Orientation,
        ParticipantKind, PinRef, Profile, RailroadExpr, SequenceStep,
    },
    shape::ShapeRegistry,
};
use cartograph_parser::{ParseConfig, ParseOutcome, error::ErrorCode, parse};

fn parse_ok(source: &str) -> ParseOutcome {
    let outcome = parse(source, &ParseConfig::default());
    assert!(
        outcome.success,
        "expected success, got errors: {:?}",
        outcome
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
    );
    outcome
}

fn codes(outcome: &ParseOutcome) -> Vec<ErrorCode> {
    outcome.errors.iter().filter_map(|e| e.code()).collect()
}

fn warning_codes(outcome: &ParseOutcome) -> Vec<ErrorCode> {
    outcome.warnings.iter().filter_map(|e| e.code()).collect()
}

#[test]
fn test_generic_diagram() {
    let source = r#"
        diagram "Shop" {
            direction: LR
            template svc fill: blue algorithm: circular
            shape web "Web Server" @rectangle
            shape db @cylinder
            container backend "Backend" template: svc {
                shape api
                api -> db "query" weight: 2
            }
            web -> api
            web --> cache
        }
    "#;

    let outcome = parse_ok(source);
    let Some(Profile::Diagram(diagram)) = outcome.diagram else {
        panic!("expected a diagram profile");
    };

    assert_eq!(diagram.name.as_deref(), Some("Shop"));
    assert_eq!(diagram.direction.to_string(), "LR");

    let ids: Vec<&str> = diagram.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["web", "db", "api", "cache"]);
    assert_eq!(diagram.nodes[0].label.as_deref(), Some("Web Server"));
    assert_eq!(diagram.nodes[1].shape, "cylinder");
    assert_eq!(diagram.nodes[3].shape, "rectangle");

    assert_eq!(diagram.edges.len(), 3);
    assert_eq!(diagram.edges[0].label.as_deref(), Some("query"));
    assert_eq!(diagram.edges[0].weight, Some(2.0));
    assert_eq!(diagram.edges[2].line_style, Some(LineStyle::Dashed));

    let backend = &diagram.containers[0];
    assert_eq!(backend.id.as_deref(), Some("backend"));
    assert_eq!(backend.children, ["api"]);
    assert_eq!(backend.algorithm, Some(LayoutAlgorithm::Circular));
    assert_eq!(
        backend.container_style.get("fill").and_then(|v| v.as_str()),
        Some("blue")
    );
}

#[test]
fn test_diagram_edge_connectors() {
    let outcome = parse_ok("diagram { a <- b\n a <-> c\n a -- d }");
    let Some(Profile::Diagram(diagram)) = outcome.diagram else {
        panic!("expected a diagram profile");
    };
    let arrows: Vec<ArrowKind> = diagram.edges.iter().map(|e| e.arrow).collect();
    assert_eq!(arrows, [ArrowKind::Backward, ArrowKind::Both, ArrowKind::None]);
}

#[test]
fn test_diagram_unknown_metric_and_template() {
    let source = r#"
        diagram {
            shape a metrics: [degree, centrality]
            container g template: missing { shape b }
        }
    "#;
    let outcome = parse(source, &ParseConfig::default());
    assert!(!outcome.success);
    assert_eq!(codes(&outcome), [ErrorCode::E208, ErrorCode::E207]);
}

#[test]
fn test_duplicate_node_points_at_second_declaration() {
    let outcome = parse(
        "diagram {\n  shape a\n  shape a\n}",
        &ParseConfig::default(),
    );
    assert_eq!(codes(&outcome), [ErrorCode::E205]);
    assert_eq!(outcome.errors[0].line(), 3);
}

#[test]
fn test_unknown_shape_is_a_warning_with_suggestion() {
    let registry = ShapeRegistry::with_builtins();
    let config = ParseConfig::default().with_shapes(&registry);
    let outcome = parse("diagram { shape a @rectangel }", &config);

    assert!(outcome.success);
    assert_eq!(warning_codes(&outcome), [ErrorCode::W300]);
    let help = outcome.warnings[0].help().unwrap_or_default();
    assert!(help.contains("rectangle"), "unexpected help: {help}");
}

#[test]
fn test_unknown_shape_suggestion_ignores_shorter_aliases() {
    let registry = ShapeRegistry::with_builtins();
    let config = ParseConfig::default().with_shapes(&registry);
    let outcome = parse("diagram {\n  shape a @rectange\n}", &config);

    assert_eq!(warning_codes(&outcome), [ErrorCode::W300]);
    assert_eq!(
        outcome.warnings[0].help(),
        Some("did you mean `rectangle`?")
    );
}

#[test]
fn test_shape_aliases_are_known() {
    let registry = ShapeRegistry::with_builtins();
    let config = ParseConfig::default().with_shapes(&registry);
    let outcome = parse("diagram { shape a @db\n shape b @decision }", &config);
    assert!(outcome.success);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_sequence_profile() {
    let source = r#"
        sequence "Login" {
            participant "User" type: actor
            participant "Auth Service"
            User -> "Auth Service" "login"
            "Auth Service" --> User "token"
            message from: found to: User label: "wake"
            note "cached" over: [User]
        }
    "#;

    let outcome = parse_ok(source);
    let Some(Profile::Sequence(sequence)) = outcome.diagram else {
        panic!("expected a sequence profile");
    };

    let ids: Vec<&str> = sequence.participants.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["user", "auth_service"]);
    assert_eq!(sequence.participants[0].kind, ParticipantKind::Actor);
    assert_eq!(sequence.participants[1].kind, ParticipantKind::Entity);

    let messages: Vec<_> = sequence.messages().collect();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].kind, MessageKind::Sync);
    assert_eq!(messages[0].to, "auth_service");
    assert_eq!(messages[1].kind, MessageKind::Reply);
    assert_eq!(messages[2].from, "found");
    assert!(messages[2].is_found());

    match sequence.steps.last() {
        Some(SequenceStep::Note(note)) => assert_eq!(note.over, ["user"]),
        other => panic!("expected a note, got {other:?}"),
    }
}

#[test]
fn test_sequence_sentinels_are_not_participants() {
    let outcome = parse_ok("sequence { A -> lost\n found -> A }");
    let Some(Profile::Sequence(sequence)) = outcome.diagram else {
        panic!("expected a sequence profile");
    };
    let ids: Vec<&str> = sequence.participants.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["a"]);
}

#[test]
fn test_sequence_invalid_message_type_suggests() {
    let outcome = parse(
        "sequence { message from: A to: B type: asinc }",
        &ParseConfig::default(),
    );
    assert_eq!(codes(&outcome), [ErrorCode::E203]);
    let help = outcome.errors[0].help().unwrap_or_default();
    assert!(help.starts_with("did you mean"), "unexpected help: {help}");
    assert!(help.contains("`async`"), "unexpected help: {help}");
}

#[test]
fn test_timeline_profile() {
    let source = r#"
        timeline "Roadmap" {
            orientation: vertical
            event launch date: "2024-01-01" label: "Launch"
            period build start: 2023 end: 2024
        }
    "#;
    let outcome = parse_ok(source);
    let Some(Profile::Timeline(timeline)) = outcome.diagram else {
        panic!("expected a timeline profile");
    };
    assert_eq!(timeline.orientation, Orientation::Vertical);
    assert_eq!(timeline.events[0].date, "2024-01-01");
    assert_eq!(timeline.events[0].label.as_deref(), Some("Launch"));
    assert_eq!(timeline.periods[0].start, "2023");
}

#[test]
fn test_timeline_event_requires_date() {
    let outcome = parse("timeline { event launch }", &ParseConfig::default());
    assert_eq!(codes(&outcome), [ErrorCode::E204]);
}

#[test]
fn test_wardley_profile() {
    let source = r#"
        wardley {
            anchor "User" visibility: 0.95 evolution: 0.5
            component "Web App" visibility: 0.7, evolution: 0.4 inertia
            User -> "Web App"
            evolve "Web App" to: 0.8
        }
    "#;
    let outcome = parse_ok(source);
    let Some(Profile::Wardley(map)) = outcome.diagram else {
        panic!("expected a wardley profile");
    };
    assert_eq!(map.components.len(), 2);
    assert!(map.components[0].anchor);
    assert!(map.components[1].inertia);
    assert_eq!(map.dependencies[0].to, "web_app");
    assert_eq!(map.evolutions[0].target, 0.8);
}

#[test]
fn test_wardley_out_of_range_and_unknown_component() {
    let source = r#"
        wardley {
            component "X" visibility: 1.5 evolution: 0.1
            evolve "Y" to: 0.5
        }
    "#;
    let outcome = parse(source, &ParseConfig::default());
    assert_eq!(codes(&outcome), [ErrorCode::E209, ErrorCode::E206]);
}

#[test]
fn test_kanban_profile_with_wip_warning() {
    let source = r#"
        kanban {
            column todo "To Do" wip: 1 {
                card a "Write docs" assignee: sam tags: [docs, easy]
                card b "Test"
            }
            column done "Done"
        }
    "#;
    let outcome = parse_ok(source);
    assert_eq!(warning_codes(&outcome), [ErrorCode::W302]);

    let Some(Profile::Kanban(board)) = outcome.diagram else {
        panic!("expected a kanban profile");
    };
    assert_eq!(board.columns.len(), 2);
    assert_eq!(board.columns[0].label, "To Do");
    assert_eq!(board.columns[0].cards[0].tags, ["docs", "easy"]);
    assert!(board.columns[1].cards.is_empty());
}

#[test]
fn test_gitgraph_profile() {
    let source = r#"
        gitgraph {
            commit "init"
            branch feature
            commit id: f1
            checkout main
            commit
            merge feature tag: v1
        }
    "#;
    let outcome = parse_ok(source);
    let Some(Profile::GitGraph(graph)) = outcome.diagram else {
        panic!("expected a gitgraph profile");
    };

    let branches: Vec<&str> = graph.branches.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(branches, ["main", "feature"]);
    assert_eq!(graph.branches[1].base.as_deref(), Some("c0"));

    let ids: Vec<&str> = graph.commits.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["c0", "f1", "c2", "c3"]);
    assert_eq!(graph.commits[1].branch, "feature");
    assert_eq!(graph.commits[3].parents, ["c2", "f1"]);
    assert_eq!(graph.commits[3].tag.as_deref(), Some("v1"));
}

#[test]
fn test_gitgraph_branch_takes_no_properties() {
    let outcome = parse("gitgraph { commit\n branch feature color: red }", &ParseConfig::default());
    assert_eq!(codes(&outcome), [ErrorCode::E202]);
}

#[test]
fn test_gitgraph_unknown_branch() {
    let outcome = parse("gitgraph { commit\n checkout develop }", &ParseConfig::default());
    assert_eq!(codes(&outcome), [ErrorCode::E206]);
}

#[test]
fn test_treemap_profile() {
    let source = r#"
        treemap {
            node "Root" {
                node "A" value: 3
                node "B" value: 2
            }
            node "C" value: 1
        }
    "#;
    let outcome = parse_ok(source);
    let Some(Profile::Treemap(treemap)) = outcome.diagram else {
        panic!("expected a treemap profile");
    };
    assert_eq!(treemap.roots.len(), 2);
    assert_eq!(treemap.roots[0].value, 5.0);
    assert_eq!(treemap.total(), 6.0);
}

#[test]
fn test_treemap_negative_value() {
    let outcome = parse("treemap { node \"A\" value: -1 }", &ParseConfig::default());
    assert_eq!(codes(&outcome), [ErrorCode::E209]);
}

#[test]
fn test_schematic_profile() {
    let source = r#"
        electrical "Divider" {
            part R1 resistor "10k" pins: [a, b]
            part R2 resistor "4k7"
            net VOUT connects: [R1.b, R2.a]
            net GND connects: [R2.b]
            R1.a -> R2.b
        }
    "#;
    let outcome = parse_ok(source);
    assert_eq!(warning_codes(&outcome), [ErrorCode::W301]);

    let Some(Profile::Schematic(schematic)) = outcome.diagram else {
        panic!("expected a schematic profile");
    };
    assert_eq!(schematic.kind.to_string(), "electrical");
    assert_eq!(schematic.parts[0].value.as_deref(), Some("10k"));
    assert_eq!(schematic.nets[0].connects[0], PinRef::parse("R1.b"));
    assert_eq!(schematic.connections.len(), 1);
}

#[test]
fn test_schematic_unknown_pin() {
    let source = "pid { part V1 valve pins: [in, out]\n part P1 pump\n V1.side -> P1 }";
    let outcome = parse(source, &ParseConfig::default());
    assert_eq!(codes(&outcome), [ErrorCode::E206]);
}

#[test]
fn test_railroad_profile() {
    let source = r#"
        railroad {
            rule expr {
                nonterminal term
                optional {
                    terminal "+"
                    nonterminal expr
                }
            }
            rule term {
                choice {
                    terminal "x"
                    terminal "y"
                }
            }
        }
    "#;
    let outcome = parse_ok(source);
    let Some(Profile::Railroad(railroad)) = outcome.diagram else {
        panic!("expected a railroad profile");
    };
    assert_eq!(railroad.rules.len(), 2);
    assert_eq!(railroad.rules[0].expr.references(), ["term", "expr"]);
    assert!(matches!(railroad.rules[1].expr, RailroadExpr::Choice(ref options) if options.len() == 2));
}

#[test]
fn test_railroad_rule_takes_no_properties() {
    let outcome = parse(
        "railroad { rule a wide: true { terminal \"x\" } }",
        &ParseConfig::default(),
    );
    assert_eq!(codes(&outcome), [ErrorCode::E202]);
}

#[test]
fn test_railroad_undefined_rule() {
    let outcome = parse("railroad { rule a { nonterminal b } }", &ParseConfig::default());
    assert_eq!(codes(&outcome), [ErrorCode::E206]);
}

#[test]
fn test_glyphset_profile() {
    let source = r#"
        glyphset "Steps" type: process {
            item "Plan"
            item "Build" {
                item "Code"
            }
        }
    "#;
    let outcome = parse_ok(source);
    let Some(Profile::Glyphset(GlyphsetProfile { name, kind, items })) = outcome.diagram else {
        panic!("expected a glyphset profile");
    };
    assert_eq!(name.as_deref(), Some("Steps"));
    assert_eq!(kind, "process");
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].children[0].text, "Code");
}

#[test]
fn test_multiple_profiles_in_one_document() {
    let outcome = parse_ok("diagram { a -> b }\nsequence { A -> B }");
    let document = outcome.document.expect("document on success");
    assert_eq!(document.profiles.len(), 2);
    assert_eq!(document.diagrams().count(), 1);
}

#[test]
fn test_unknown_profile_suggests_keyword() {
    let outcome = parse("diagarm { }", &ParseConfig::default());
    assert!(!outcome.success);
    assert!(outcome.document.is_none());
    assert_eq!(codes(&outcome), [ErrorCode::E200]);
    let help = outcome.errors[0].help().unwrap_or_default();
    assert!(help.contains("`diagram`"), "unexpected help: {help}");
}

#[test]
fn test_lexer_errors_are_reported_with_location() {
    let outcome = parse("diagram {\n  shape a \"open\n}", &ParseConfig::default());
    assert!(!outcome.success);
    assert_eq!(codes(&outcome), [ErrorCode::E001]);
    assert_eq!(outcome.errors[0].line(), 2);
}

#[test]
fn test_conversion_errors_are_all_collected() {
    let source = "sequence {\n  message to: B\n  message from: A\n  shout A\n}";
    let outcome = parse(source, &ParseConfig::default());
    assert_eq!(
        codes(&outcome),
        [ErrorCode::E204, ErrorCode::E204, ErrorCode::E201]
    );
    let lines: Vec<usize> = outcome.errors.iter().map(|e| e.line()).collect();
    assert_eq!(lines, [2, 3, 4]);
}

#[test]
fn test_garbage_input_never_panics() {
    for source in ["{", "}", "diagram", "diagram {", "\"", "@", "[[", "a -> -> b", "é ü"] {
        let outcome = parse(source, &ParseConfig::default());
        assert!(!outcome.success, "{source:?} should fail");
        assert!(!outcome.errors.is_empty());
    }
}
