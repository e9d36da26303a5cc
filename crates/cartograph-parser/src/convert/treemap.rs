//! `treemap` profile: nested weighted nodes.

use cartograph_core::ast::{TreemapNode, TreemapProfile};

use super::{ConvertContext, header_title, missing, number, text};
use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
};

const STATEMENTS: &[&str] = &["node"];
const SETTINGS: &[&str] = &["title"];
const NODE_PROPERTIES: &[&str] = &["label", "value"];

pub(super) fn convert(block: &types::ProfileBlock<'_>, ctx: &mut ConvertContext<'_>) -> TreemapProfile {
    let mut profile = TreemapProfile {
        name: header_title(block),
        ..TreemapProfile::default()
    };
    for property in &block.properties {
        setting(property, &mut profile, ctx);
    }
    for statement in &block.body {
        if let types::Statement::Setting(property) = statement {
            setting(property, &mut profile, ctx);
        }
    }
    profile.roots = nodes(&block.body, ctx);
    profile
}

fn setting(property: &types::Property<'_>, profile: &mut TreemapProfile, ctx: &mut ConvertContext<'_>) {
    match *property.key.inner() {
        "title" => profile.name = ctx.check(text(&property.value, "title")),
        _ => ctx.unknown_setting(&property.key, SETTINGS),
    }
}

/// Converts the `node` statements of one level. Settings are handled by the
/// caller at the top level and rejected below it.
fn nodes(statements: &[types::Statement<'_>], ctx: &mut ConvertContext<'_>) -> Vec<TreemapNode> {
    let mut out = Vec::new();
    for statement in statements {
        match statement {
            types::Statement::Command(command) if *command.keyword.inner() == "node" => {
                if let Some(node) = node(command, ctx) {
                    out.push(node);
                }
            }
            types::Statement::Command(command) => {
                ctx.unknown_statement(&command.keyword, "treemap", STATEMENTS)
            }
            types::Statement::Edge(edge) => ctx.emit(
                Diagnostic::error("treemaps do not have edges")
                    .with_code(ErrorCode::E201)
                    .with_label(edge.span, "unexpected edge")
                    .with_help("nest `node` blocks to express hierarchy"),
            ),
            types::Statement::Setting(_) => {}
        }
    }
    out
}

/// `node "Label" [value: n] { node ... }`
fn node(command: &types::Command<'_>, ctx: &mut ConvertContext<'_>) -> Option<TreemapNode> {
    let props = ctx.properties(&command.properties, NODE_PROPERTIES);
    let label = match (command.args.first(), props.get("label")) {
        (_, Some(value)) | (Some(value), None) => ctx.check(text(value, "node label"))?,
        (None, None) => {
            ctx.emit(missing(command.keyword.span(), "node", "a label"));
            return None;
        }
    };

    let value = match props.get("value") {
        Some(value) => {
            let n = ctx.check(number(value, "node value"))?;
            if n < 0.0 {
                ctx.emit(
                    Diagnostic::error(format!("treemap value {n} is negative"))
                        .with_code(ErrorCode::E209)
                        .with_label(value.span(), "values must be zero or greater"),
                );
                return None;
            }
            Some((n, value.span()))
        }
        None => None,
    };

    if let Some(body) = &command.body {
        for statement in body {
            if let types::Statement::Setting(property) = statement {
                ctx.emit(
                    Diagnostic::error(format!("unexpected setting `{}` inside a node", property.key.inner()))
                        .with_code(ErrorCode::E201)
                        .with_label(property.span(), "settings belong at the top of the treemap"),
                );
            }
        }
    }
    let children = command
        .body
        .as_deref()
        .map(|body| nodes(body, ctx))
        .unwrap_or_default();

    if children.is_empty() {
        let Some((value, _)) = value else {
            ctx.emit(missing(command.keyword.span(), "node", "`value:`"));
            return None;
        };
        return Some(TreemapNode {
            label,
            value,
            children,
        });
    }

    if let Some((_, span)) = value {
        ctx.emit(
            Diagnostic::warning(format!("value of group `{label}` is replaced by the sum of its children"))
                .with_code(ErrorCode::W303)
                .with_label(span, "ignored"),
        );
    }
    Some(TreemapNode {
        label,
        value: children.iter().map(|child| child.value).sum(),
        children,
    })
}
