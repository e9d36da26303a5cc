//! `railroad` profile: grammar rules drawn as syntax diagrams.

use cartograph_core::ast::{RailroadExpr, RailroadProfile, RailroadRule};

use super::{ConvertContext, duplicate, header_title, missing, text};
use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
    span::{Span, Spanned},
};

const STATEMENTS: &[&str] = &["rule"];
const SETTINGS: &[&str] = &["title"];
const EXPRESSIONS: &[&str] = &[
    "terminal",
    "nonterminal",
    "sequence",
    "choice",
    "optional",
    "repeat",
];

pub(super) fn convert(block: &types::ProfileBlock<'_>, ctx: &mut ConvertContext<'_>) -> RailroadProfile {
    let mut profile = RailroadProfile {
        name: header_title(block),
        ..RailroadProfile::default()
    };
    let mut references: Vec<Spanned<String>> = Vec::new();

    for property in &block.properties {
        setting(property, &mut profile, ctx);
    }

    for statement in &block.body {
        match statement {
            types::Statement::Setting(property) => setting(property, &mut profile, ctx),
            types::Statement::Command(command) if *command.keyword.inner() == "rule" => {
                if let Some(rule) = rule(command, &mut references, ctx) {
                    if profile.rules.iter().any(|r| r.name == rule.name) {
                        ctx.emit(duplicate(command.keyword.span(), None, "rule", &rule.name));
                    } else {
                        profile.rules.push(rule);
                    }
                }
            }
            types::Statement::Command(command) => {
                ctx.unknown_statement(&command.keyword, "railroad", STATEMENTS)
            }
            types::Statement::Edge(edge) => ctx.emit(
                Diagnostic::error("railroad diagrams are built from rules, not edges")
                    .with_code(ErrorCode::E201)
                    .with_label(edge.span, "unexpected edge"),
            ),
        }
    }

    for reference in references {
        if profile.rules.iter().any(|r| r.name == *reference.inner()) {
            continue;
        }
        let names: Vec<&str> = profile.rules.iter().map(|r| r.name.as_str()).collect();
        let diagnostic = Diagnostic::error(format!("undefined rule `{}`", reference.inner()))
            .with_code(ErrorCode::E206)
            .with_label(reference.span(), "no rule with this name")
            .with_optional_help(ctx.hint(reference.inner(), names));
        ctx.emit(diagnostic);
    }

    profile
}

fn setting(property: &types::Property<'_>, profile: &mut RailroadProfile, ctx: &mut ConvertContext<'_>) {
    match *property.key.inner() {
        "title" => profile.name = ctx.check(text(&property.value, "title")),
        _ => ctx.unknown_setting(&property.key, SETTINGS),
    }
}

/// `rule NAME { expr ... }`
fn rule(
    command: &types::Command<'_>,
    references: &mut Vec<Spanned<String>>,
    ctx: &mut ConvertContext<'_>,
) -> Option<RailroadRule> {
    ctx.reject_properties(&command.properties);
    let Some(name_arg) = command.args.first() else {
        ctx.emit(missing(command.keyword.span(), "rule", "a name"));
        return None;
    };
    let name = ctx.check(text(name_arg, "rule name"))?;
    let body = command.body.as_deref().unwrap_or_default();
    let expr = sequence_of(body, command.span, "rule", references, ctx)?;
    Some(RailroadRule { name, expr })
}

/// Converts a block body; more than one item becomes an implicit sequence.
fn sequence_of(
    body: &[types::Statement<'_>],
    owner: Span,
    owner_name: &str,
    references: &mut Vec<Spanned<String>>,
    ctx: &mut ConvertContext<'_>,
) -> Option<RailroadExpr> {
    let mut items: Vec<RailroadExpr> = body
        .iter()
        .filter_map(|statement| expression(statement, references, ctx))
        .collect();
    match items.len() {
        0 => {
            ctx.emit(missing(owner, owner_name, "at least one expression"));
            None
        }
        1 => items.pop(),
        _ => Some(RailroadExpr::Sequence(items)),
    }
}

fn expression(
    statement: &types::Statement<'_>,
    references: &mut Vec<Spanned<String>>,
    ctx: &mut ConvertContext<'_>,
) -> Option<RailroadExpr> {
    let types::Statement::Command(command) = statement else {
        ctx.emit(
            Diagnostic::error("expected a railroad expression")
                .with_code(ErrorCode::E201)
                .with_label(statement.span(), "not an expression")
                .with_help(format!("expressions are: {}", EXPRESSIONS.join(", "))),
        );
        return None;
    };
    ctx.reject_properties(&command.properties);
    let keyword = *command.keyword.inner();

    match keyword {
        "terminal" | "nonterminal" => {
            ctx.reject_body(command);
            let Some(arg) = command.args.first() else {
                ctx.emit(missing(command.keyword.span(), keyword, "a name"));
                return None;
            };
            let name = ctx.check(text(arg, keyword))?;
            if keyword == "terminal" {
                Some(RailroadExpr::Terminal(name))
            } else {
                references.push(Spanned::new(name.clone(), arg.span()));
                Some(RailroadExpr::NonTerminal(name))
            }
        }
        "sequence" | "choice" | "optional" | "repeat" => {
            if let Some(arg) = command.args.first() {
                ctx.emit(
                    Diagnostic::error(format!("`{keyword}` takes only a block"))
                        .with_code(ErrorCode::E203)
                        .with_label(arg.span(), "unexpected argument"),
                );
            }
            let body = command.body.as_deref().unwrap_or_default();
            match keyword {
                "choice" => {
                    let options: Vec<RailroadExpr> = body
                        .iter()
                        .filter_map(|statement| expression(statement, references, ctx))
                        .collect();
                    if options.is_empty() {
                        ctx.emit(missing(command.span, keyword, "at least one option"));
                        return None;
                    }
                    Some(RailroadExpr::Choice(options))
                }
                "sequence" => {
                    let items: Vec<RailroadExpr> = body
                        .iter()
                        .filter_map(|statement| expression(statement, references, ctx))
                        .collect();
                    if items.is_empty() {
                        ctx.emit(missing(command.span, keyword, "at least one expression"));
                        return None;
                    }
                    Some(RailroadExpr::Sequence(items))
                }
                "optional" => sequence_of(body, command.span, keyword, references, ctx)
                    .map(|inner| RailroadExpr::Optional(Box::new(inner))),
                _ => sequence_of(body, command.span, keyword, references, ctx)
                    .map(|inner| RailroadExpr::Repeat(Box::new(inner))),
            }
        }
        _ => {
            ctx.unknown_statement(&command.keyword, "railroad rule", EXPRESSIONS);
            None
        }
    }
}
