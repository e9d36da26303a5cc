//! `kanban` profile: columns of cards with optional WIP limits.

use cartograph_core::ast::{KanbanCard, KanbanColumn, KanbanProfile};

use super::{ConvertContext, duplicate, header_title, missing, number, reference_id, text, text_list};
use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
};

const STATEMENTS: &[&str] = &["column"];
const COLUMN_STATEMENTS: &[&str] = &["card"];
const SETTINGS: &[&str] = &["title"];
const COLUMN_PROPERTIES: &[&str] = &["label", "wip"];
const CARD_PROPERTIES: &[&str] = &["title", "assignee", "priority", "tags"];

pub(super) fn convert(block: &types::ProfileBlock<'_>, ctx: &mut ConvertContext<'_>) -> KanbanProfile {
    let mut profile = KanbanProfile {
        name: header_title(block),
        ..KanbanProfile::default()
    };

    for property in &block.properties {
        setting(property, &mut profile, ctx);
    }

    for statement in &block.body {
        match statement {
            types::Statement::Setting(property) => setting(property, &mut profile, ctx),
            types::Statement::Command(command) if *command.keyword.inner() == "column" => {
                let Some(column) = column(command, &profile, ctx) else {
                    continue;
                };
                if column.is_over_limit() {
                    let limit = column.wip.unwrap_or_default();
                    ctx.emit(
                        Diagnostic::warning(format!(
                            "column `{}` holds {} cards, over its WIP limit of {limit}",
                            column.id,
                            column.cards.len()
                        ))
                        .with_code(ErrorCode::W302)
                        .with_label(command.keyword.span(), "work in progress limit exceeded"),
                    );
                }
                profile.columns.push(column);
            }
            types::Statement::Command(command) => {
                ctx.unknown_statement(&command.keyword, "kanban", STATEMENTS)
            }
            types::Statement::Edge(edge) => ctx.emit(
                Diagnostic::error("kanban boards do not have edges")
                    .with_code(ErrorCode::E201)
                    .with_label(edge.span, "unexpected edge"),
            ),
        }
    }

    profile
}

fn setting(property: &types::Property<'_>, profile: &mut KanbanProfile, ctx: &mut ConvertContext<'_>) {
    match *property.key.inner() {
        "title" => profile.name = ctx.check(text(&property.value, "title")),
        _ => ctx.unknown_setting(&property.key, SETTINGS),
    }
}

/// `column ID ["Label"] [wip: n] { card ... }`
fn column(
    command: &types::Command<'_>,
    profile: &KanbanProfile,
    ctx: &mut ConvertContext<'_>,
) -> Option<KanbanColumn> {
    let Some(id_arg) = command.args.first() else {
        ctx.emit(missing(command.keyword.span(), "column", "an id"));
        return None;
    };
    let id = reference_id(id_arg.inner());
    if profile.columns.iter().any(|c| c.id == id) {
        ctx.emit(duplicate(id_arg.span(), None, "column", &id));
        return None;
    }

    let mut label = match (id_arg.inner(), command.args.get(1)) {
        (_, Some(arg)) => ctx.check(text(arg, "column label")),
        (types::Value::String(name), None) => Some(name.clone()),
        _ => None,
    };

    let props = ctx.properties(&command.properties, COLUMN_PROPERTIES);
    if let Some(value) = props.get("label") {
        label = ctx.check(text(value, "column label"));
    }
    let wip = props.get("wip").and_then(|value| {
        let limit = ctx.check(number(value, "WIP limit"))?;
        if limit < 0.0 || limit.fract() != 0.0 {
            ctx.emit(
                Diagnostic::error(format!("WIP limit must be a non-negative whole number, got {limit}"))
                    .with_code(ErrorCode::E209)
                    .with_label(value.span(), "invalid limit"),
            );
            return None;
        }
        Some(limit as u32)
    });

    let mut cards: Vec<KanbanCard> = Vec::new();
    for statement in command.body.as_deref().unwrap_or_default() {
        match statement {
            types::Statement::Command(inner) if *inner.keyword.inner() == "card" => {
                ctx.reject_body(inner);
                let Some(card) = card(inner, ctx) else {
                    continue;
                };
                let taken = cards.iter().any(|c| c.id == card.id)
                    || profile
                        .columns
                        .iter()
                        .flat_map(|c| &c.cards)
                        .any(|c| c.id == card.id);
                if taken {
                    ctx.emit(duplicate(inner.span, None, "card", &card.id));
                } else {
                    cards.push(card);
                }
            }
            types::Statement::Command(inner) => {
                ctx.unknown_statement(&inner.keyword, "kanban column", COLUMN_STATEMENTS)
            }
            other => ctx.emit(
                Diagnostic::error("only `card` statements are allowed inside a column")
                    .with_code(ErrorCode::E201)
                    .with_label(other.span(), "unexpected statement"),
            ),
        }
    }

    Some(KanbanColumn {
        label: label.unwrap_or_else(|| id.clone()),
        id,
        wip,
        cards,
    })
}

/// `card ID ["Title"] [assignee: ..] [priority: ..] [tags: [..]]`
fn card(command: &types::Command<'_>, ctx: &mut ConvertContext<'_>) -> Option<KanbanCard> {
    let Some(id_arg) = command.args.first() else {
        ctx.emit(missing(command.keyword.span(), "card", "an id"));
        return None;
    };
    let id = reference_id(id_arg.inner());
    let mut title = match (id_arg.inner(), command.args.get(1)) {
        (_, Some(arg)) => ctx.check(text(arg, "card title")),
        (types::Value::String(name), None) => Some(name.clone()),
        _ => None,
    };

    let props = ctx.properties(&command.properties, CARD_PROPERTIES);
    if let Some(value) = props.get("title") {
        title = ctx.check(text(value, "card title"));
    }
    let assignee = props
        .get("assignee")
        .and_then(|value| ctx.check(text(value, "assignee")));
    let priority = props
        .get("priority")
        .and_then(|value| ctx.check(text(value, "priority")));
    let tags = props
        .get("tags")
        .and_then(|value| ctx.check(text_list(value, "tag")))
        .unwrap_or_default()
        .into_iter()
        .map(|tag| tag.into_inner())
        .collect();

    Some(KanbanCard {
        title: title.unwrap_or_else(|| id.clone()),
        id,
        assignee,
        priority,
        tags,
    })
}
