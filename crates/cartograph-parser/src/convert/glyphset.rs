//! `glyphset` profile: a templated list graphic of nested items.

use cartograph_core::ast::{GlyphItem, GlyphsetProfile};

use super::{ConvertContext, header_title, missing, text};
use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
};

const STATEMENTS: &[&str] = &["item"];
const SETTINGS: &[&str] = &["title", "type"];
const ITEM_PROPERTIES: &[&str] = &["text"];
/// Layout used when no `type:` is given.
const DEFAULT_KIND: &str = "list";

pub(super) fn convert(block: &types::ProfileBlock<'_>, ctx: &mut ConvertContext<'_>) -> GlyphsetProfile {
    let mut profile = GlyphsetProfile {
        name: header_title(block),
        kind: DEFAULT_KIND.to_string(),
        items: Vec::new(),
    };

    for property in &block.properties {
        setting(property, &mut profile, ctx);
    }
    for statement in &block.body {
        if let types::Statement::Setting(property) = statement {
            setting(property, &mut profile, ctx);
        }
    }
    profile.items = items(&block.body, true, ctx);
    profile
}

fn setting(property: &types::Property<'_>, profile: &mut GlyphsetProfile, ctx: &mut ConvertContext<'_>) {
    match *property.key.inner() {
        "title" => profile.name = ctx.check(text(&property.value, "title")),
        "type" => {
            if let Some(kind) = ctx.check(text(&property.value, "glyphset type")) {
                profile.kind = kind.to_lowercase();
            }
        }
        _ => ctx.unknown_setting(&property.key, SETTINGS),
    }
}

fn items(statements: &[types::Statement<'_>], top_level: bool, ctx: &mut ConvertContext<'_>) -> Vec<GlyphItem> {
    let mut out = Vec::new();
    for statement in statements {
        match statement {
            types::Statement::Command(command) if *command.keyword.inner() == "item" => {
                if let Some(item) = item(command, ctx) {
                    out.push(item);
                }
            }
            types::Statement::Command(command) => {
                ctx.unknown_statement(&command.keyword, "glyphset", STATEMENTS)
            }
            types::Statement::Setting(_) if top_level => {}
            other => ctx.emit(
                Diagnostic::error("only `item` statements are allowed here")
                    .with_code(ErrorCode::E201)
                    .with_label(other.span(), "unexpected statement"),
            ),
        }
    }
    out
}

/// `item "Text" [{ item ... }]`
fn item(command: &types::Command<'_>, ctx: &mut ConvertContext<'_>) -> Option<GlyphItem> {
    let props = ctx.properties(&command.properties, ITEM_PROPERTIES);
    let text = match (props.get("text"), command.args.first()) {
        (Some(value), _) | (None, Some(value)) => ctx.check(text(value, "item text"))?,
        (None, None) => {
            ctx.emit(missing(command.keyword.span(), "item", "its text"));
            return None;
        }
    };
    let children = command
        .body
        .as_deref()
        .map(|body| items(body, false, ctx))
        .unwrap_or_default();
    Some(GlyphItem { text, children })
}
