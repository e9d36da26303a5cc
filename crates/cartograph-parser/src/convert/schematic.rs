//! Schematic profiles (`electrical`, `pneumatic`, `hydraulic`, `hvac`,
//! `control`, `digital`, `pid`): parts, nets and pin-to-pin connections.

use cartograph_core::ast::{Connection, Net, Part, PinRef, SchematicKind, SchematicProfile};

use super::{ConvertContext, data_bag, duplicate, header_title, missing, text, text_list};
use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
    span::Spanned,
};

const STATEMENTS: &[&str] = &["part", "net"];
const SETTINGS: &[&str] = &["title"];
const PART_RESERVED: &[&str] = &["type", "value", "pins"];
const NET_PROPERTIES: &[&str] = &["connects"];
const CONNECTION_PROPERTIES: &[&str] = &["label"];

pub(super) fn convert(
    block: &types::ProfileBlock<'_>,
    kind: SchematicKind,
    ctx: &mut ConvertContext<'_>,
) -> SchematicProfile {
    let mut profile = SchematicProfile::new(kind);
    profile.name = header_title(block);
    // Pin references are resolved once all parts are declared.
    let mut nets: Vec<(Spanned<String>, Vec<Spanned<PinRef>>)> = Vec::new();
    let mut connections: Vec<(Spanned<PinRef>, Spanned<PinRef>, Option<String>)> = Vec::new();

    for property in &block.properties {
        setting(property, &mut profile, ctx);
    }

    for statement in &block.body {
        match statement {
            types::Statement::Setting(property) => setting(property, &mut profile, ctx),
            types::Statement::Edge(edge) => {
                if let Some(connection) = connection(edge, ctx) {
                    connections.push(connection);
                }
            }
            types::Statement::Command(command) => {
                ctx.reject_body(command);
                match *command.keyword.inner() {
                    "part" => part(command, &mut profile, ctx),
                    "net" => {
                        if let Some(net) = net(command, ctx) {
                            if nets.iter().any(|(name, _)| name.inner() == net.0.inner()) {
                                ctx.emit(duplicate(net.0.span(), None, "net", net.0.inner()));
                            } else {
                                nets.push(net);
                            }
                        }
                    }
                    _ => ctx.unknown_statement(&command.keyword, &kind.to_string(), STATEMENTS),
                }
            }
        }
    }

    for (name, connects) in nets {
        let connects: Vec<PinRef> = connects
            .into_iter()
            .filter(|pin| resolve(&profile, pin, ctx))
            .map(Spanned::into_inner)
            .collect();
        if connects.len() < 2 {
            ctx.emit(
                Diagnostic::warning(format!(
                    "net `{}` connects {} pin(s); a net needs at least two",
                    name.inner(),
                    connects.len()
                ))
                .with_code(ErrorCode::W301)
                .with_label(name.span(), "dangling net"),
            );
        }
        profile.nets.push(Net {
            name: name.into_inner(),
            connects,
        });
    }

    for (from, to, label) in connections {
        let from_known = resolve(&profile, &from, ctx);
        let to_known = resolve(&profile, &to, ctx);
        if from_known && to_known {
            profile.connections.push(Connection {
                from: from.into_inner(),
                to: to.into_inner(),
                label,
            });
        }
    }

    profile
}

fn setting(property: &types::Property<'_>, profile: &mut SchematicProfile, ctx: &mut ConvertContext<'_>) {
    match *property.key.inner() {
        "title" => profile.name = ctx.check(text(&property.value, "title")),
        _ => ctx.unknown_setting(&property.key, SETTINGS),
    }
}

/// Checks that the part exists and, when the part lists its pins, that the
/// pin is one of them.
fn resolve(profile: &SchematicProfile, pin: &Spanned<PinRef>, ctx: &mut ConvertContext<'_>) -> bool {
    let Some(part) = profile.part(&pin.part) else {
        let ids: Vec<&str> = profile.parts.iter().map(|p| p.id.as_str()).collect();
        let diagnostic = Diagnostic::error(format!("undefined part `{}`", pin.part))
            .with_code(ErrorCode::E206)
            .with_label(pin.span(), "no part with this id")
            .with_optional_help(ctx.hint(&pin.part, ids));
        ctx.emit(diagnostic);
        return false;
    };
    match &pin.pin {
        Some(name) if !part.pins.is_empty() && !part.pins.contains(name) => {
            let diagnostic = Diagnostic::error(format!("part `{}` has no pin `{name}`", part.id))
                .with_code(ErrorCode::E206)
                .with_label(pin.span(), "unknown pin")
                .with_optional_help(ctx.hint(name, &part.pins));
            ctx.emit(diagnostic);
            false
        }
        _ => true,
    }
}

/// `part ID TYPE ["value"] [pins: [..]] [key: value ...]`
fn part(command: &types::Command<'_>, profile: &mut SchematicProfile, ctx: &mut ConvertContext<'_>) {
    let mut args = command.args.iter();
    let Some(id_arg) = args.next() else {
        ctx.emit(missing(command.keyword.span(), "part", "an id"));
        return;
    };
    let Some(id) = ctx.check(text(id_arg, "part id")) else {
        return;
    };
    if profile.part(&id).is_some() {
        ctx.emit(duplicate(id_arg.span(), None, "part", &id));
        return;
    }

    let mut kind = args.next().and_then(|arg| ctx.check(text(arg, "part type")));
    let mut value = args.next().and_then(|arg| ctx.check(text(arg, "part value")));
    for extra in args {
        ctx.emit(
            Diagnostic::error(format!("unexpected {} in part", extra.kind_name()))
                .with_code(ErrorCode::E203)
                .with_label(extra.span(), "expected at most an id, a type and a value"),
        );
    }

    let mut pins = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    for property in &command.properties {
        let key = *property.key.inner();
        if PART_RESERVED.contains(&key) && seen.contains(&key) {
            ctx.emit(duplicate(property.key.span(), None, "property", key));
            continue;
        }
        seen.push(key);
        match key {
            "type" => kind = ctx.check(text(&property.value, "part type")),
            "value" => value = ctx.check(text(&property.value, "part value")),
            "pins" => {
                pins = ctx
                    .check(text_list(&property.value, "pin"))
                    .unwrap_or_default()
                    .into_iter()
                    .map(Spanned::into_inner)
                    .collect()
            }
            _ => {}
        }
    }

    let Some(kind) = kind else {
        ctx.emit(missing(command.keyword.span(), "part", "a type"));
        return;
    };

    profile.parts.push(Part {
        id,
        kind,
        value,
        pins,
        data: data_bag(&command.properties, PART_RESERVED),
    });
}

fn pin_ref(value: &Spanned<types::Value<'_>>, ctx: &mut ConvertContext<'_>) -> Option<Spanned<PinRef>> {
    let text = ctx.check(text(value, "pin reference"))?;
    Some(Spanned::new(PinRef::parse(&text), value.span()))
}

/// `net NAME [connects: [A.p, B.q]]`
fn net(
    command: &types::Command<'_>,
    ctx: &mut ConvertContext<'_>,
) -> Option<(Spanned<String>, Vec<Spanned<PinRef>>)> {
    let Some(name_arg) = command.args.first() else {
        ctx.emit(missing(command.keyword.span(), "net", "a name"));
        return None;
    };
    let name = ctx.check(text(name_arg, "net name"))?;

    let props = ctx.properties(&command.properties, NET_PROPERTIES);
    let connects = match props.get("connects") {
        Some(value) => ctx
            .check(text_list(value, "pin reference"))
            .unwrap_or_default()
            .into_iter()
            .map(|pin| Spanned::new(PinRef::parse(pin.inner()), pin.span()))
            .collect(),
        None => Vec::new(),
    };

    Some((Spanned::new(name, name_arg.span()), connects))
}

/// `A.p -> B.q ["label"] [label: ..]`
fn connection(
    edge: &types::EdgeStatement<'_>,
    ctx: &mut ConvertContext<'_>,
) -> Option<(Spanned<PinRef>, Spanned<PinRef>, Option<String>)> {
    let from = pin_ref(&edge.from, ctx);
    let to = pin_ref(&edge.to, ctx);

    let props = ctx.properties(&edge.properties, CONNECTION_PROPERTIES);
    let mut label = None;
    for arg in &edge.args {
        match arg.inner() {
            types::Value::String(text) if label.is_none() => label = Some(text.clone()),
            other => ctx.emit(
                Diagnostic::error(format!("unexpected {} in connection", other.kind_name()))
                    .with_code(ErrorCode::E203)
                    .with_label(arg.span(), "expected a single label string"),
            ),
        }
    }
    if let Some(value) = props.get("label") {
        label = ctx.check(text(value, "label"));
    }

    // `B.q <- A.p` reads right to left.
    let (from, to) = match edge.connector.inner() {
        types::Connector::LeftArrow => (to?, from?),
        _ => (from?, to?),
    };
    Some((from, to, label))
}
