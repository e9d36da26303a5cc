//! `sequence` profile: participants, messages and notes.

use cartograph_core::ast::{
    FOUND, LOST, Message, MessageKind, Participant, ParticipantKind, SequenceNote, SequenceProfile,
    SequenceStep,
};

use super::{ConvertContext, duplicate, header_title, missing, slugify, text, text_list};
use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
    span::{Span, Spanned},
};

const STATEMENTS: &[&str] = &["participant", "message", "note"];
const SETTINGS: &[&str] = &["title"];
const PARTICIPANT_PROPERTIES: &[&str] = &["type", "id"];
const MESSAGE_PROPERTIES: &[&str] = &["from", "to", "label", "type"];
const EDGE_PROPERTIES: &[&str] = &["label", "type"];
const NOTE_PROPERTIES: &[&str] = &["over"];

pub(super) fn convert(
    block: &types::ProfileBlock<'_>,
    ctx: &mut ConvertContext<'_>,
) -> SequenceProfile {
    let mut profile = SequenceProfile {
        name: header_title(block),
        ..SequenceProfile::default()
    };
    let mut declared: Vec<Span> = Vec::new();

    for property in block.properties.iter().chain(block.body.iter().filter_map(|s| match s {
        types::Statement::Setting(property) => Some(property),
        _ => None,
    })) {
        match *property.key.inner() {
            "title" => profile.name = ctx.check(text(&property.value, "title")),
            _ => ctx.unknown_setting(&property.key, SETTINGS),
        }
    }

    for statement in &block.body {
        match statement {
            types::Statement::Setting(_) => {}
            types::Statement::Edge(edge) => {
                if let Some(message) = arrow_message(edge, ctx) {
                    push_message(&mut profile, &mut declared, message);
                }
            }
            types::Statement::Command(command) => {
                ctx.reject_body(command);
                match *command.keyword.inner() {
                    "participant" => participant(command, &mut profile, &mut declared, ctx),
                    "message" => {
                        if let Some(message) = message(command, ctx) {
                            push_message(&mut profile, &mut declared, message);
                        }
                    }
                    "note" => note(command, &mut profile, ctx),
                    _ => ctx.unknown_statement(&command.keyword, "sequence", STATEMENTS),
                }
            }
        }
    }

    profile
}

/// `participant "Name" [type: actor|entity|boundary|control|database] [id: ..]`
fn participant(
    command: &types::Command<'_>,
    profile: &mut SequenceProfile,
    declared: &mut Vec<Span>,
    ctx: &mut ConvertContext<'_>,
) {
    let Some(name_arg) = command.args.first() else {
        ctx.emit(missing(command.keyword.span(), "participant", "a name"));
        return;
    };
    let Some(name) = ctx.check(text(name_arg, "participant name")) else {
        return;
    };

    let props = ctx.properties(&command.properties, PARTICIPANT_PROPERTIES);
    let kind = props
        .get("type")
        .and_then(|value| {
            ctx.check(ctx.keyword::<ParticipantKind>(value, ParticipantKind::NAMES, "participant type"))
        })
        .unwrap_or_default();
    let id = match props.get("id") {
        Some(value) => ctx.check(text(value, "participant id")).unwrap_or_else(|| slugify(&name)),
        None => slugify(&name),
    };

    if let Some(index) = profile.participants.iter().position(|p| p.id == id) {
        ctx.emit(duplicate(
            name_arg.span(),
            declared.get(index).copied().filter(|span| !span.is_empty()),
            "participant",
            &id,
        ));
        return;
    }

    profile.participants.push(Participant { id, name, kind });
    declared.push(name_arg.span());
}

/// `message from: A to: B ["label"] [label: ..] [type: ..]`
fn message(command: &types::Command<'_>, ctx: &mut ConvertContext<'_>) -> Option<Message> {
    let props = ctx.properties(&command.properties, MESSAGE_PROPERTIES);

    let from = props.get("from");
    let to = props.get("to");
    if from.is_none() {
        ctx.emit(missing(command.keyword.span(), "message", "`from:`"));
    }
    if to.is_none() {
        ctx.emit(missing(command.keyword.span(), "message", "`to:`"));
    }
    let from = slugify(&ctx.check(text(from?, "sender"))?);
    let to = slugify(&ctx.check(text(to?, "receiver"))?);

    let mut label = label_argument(&command.args, ctx);
    if let Some(value) = props.get("label") {
        label = ctx.check(text(value, "label"));
    }
    let kind = props
        .get("type")
        .and_then(|value| ctx.check(ctx.keyword::<MessageKind>(value, MessageKind::NAMES, "message type")))
        .unwrap_or_default();

    Some(Message {
        from,
        to,
        label,
        kind,
    })
}

/// `A -> B ["label"] [type: ..]`; a dashed arrow is a reply unless a type is given.
fn arrow_message(edge: &types::EdgeStatement<'_>, ctx: &mut ConvertContext<'_>) -> Option<Message> {
    let from = slugify(&ctx.check(text(&edge.from, "sender"))?);
    let to = slugify(&ctx.check(text(&edge.to, "receiver"))?);

    let props = ctx.properties(&edge.properties, EDGE_PROPERTIES);
    let mut label = label_argument(&edge.args, ctx);
    if let Some(value) = props.get("label") {
        label = ctx.check(text(value, "label"));
    }

    let kind = match props.get("type") {
        Some(value) => ctx
            .check(ctx.keyword::<MessageKind>(value, MessageKind::NAMES, "message type"))
            .unwrap_or_default(),
        None => match edge.connector.inner() {
            types::Connector::DashedArrow | types::Connector::DashedLine => MessageKind::Reply,
            _ => MessageKind::default(),
        },
    };

    // `A <- B` reads right to left.
    let (from, to) = if *edge.connector.inner() == types::Connector::LeftArrow {
        (to, from)
    } else {
        (from, to)
    };

    Some(Message {
        from,
        to,
        label,
        kind,
    })
}

fn label_argument(args: &[Spanned<types::Value<'_>>], ctx: &mut ConvertContext<'_>) -> Option<String> {
    let mut label = None;
    for arg in args {
        match arg.inner() {
            types::Value::String(text) if label.is_none() => label = Some(text.clone()),
            other => ctx.emit(
                Diagnostic::error(format!("unexpected {} in message", other.kind_name()))
                    .with_code(ErrorCode::E203)
                    .with_label(arg.span(), "expected a single label string"),
            ),
        }
    }
    label
}

/// Messages may name participants that were never declared; those are added
/// as entities. The `lost` and `found` sentinels are never participants.
fn push_message(profile: &mut SequenceProfile, declared: &mut Vec<Span>, message: Message) {
    for id in [&message.from, &message.to] {
        if id == LOST || id == FOUND || profile.participant(id).is_some() {
            continue;
        }
        profile.participants.push(Participant {
            id: id.clone(),
            name: id.clone(),
            kind: ParticipantKind::default(),
        });
        declared.push(Span::default());
    }
    profile.steps.push(SequenceStep::Message(message));
}

/// `note "text" over: [A, B]`
fn note(command: &types::Command<'_>, profile: &mut SequenceProfile, ctx: &mut ConvertContext<'_>) {
    let Some(text_arg) = command.args.first() else {
        ctx.emit(missing(command.keyword.span(), "note", "the note text"));
        return;
    };
    let Some(text) = ctx.check(text(text_arg, "note text")) else {
        return;
    };

    let props = ctx.properties(&command.properties, NOTE_PROPERTIES);
    let mut over = Vec::new();
    if let Some(value) = props.get("over") {
        for name in ctx.check(text_list(value, "participant")).unwrap_or_default() {
            let id = slugify(name.inner());
            if profile.participant(&id).is_none() {
                let ids: Vec<&str> = profile.participants.iter().map(|p| p.id.as_str()).collect();
                let diagnostic = Diagnostic::error(format!("undefined participant `{id}`"))
                    .with_code(ErrorCode::E206)
                    .with_label(name.span(), "not declared in this sequence")
                    .with_optional_help(ctx.hint(&id, ids));
                ctx.emit(diagnostic);
                continue;
            }
            over.push(id);
        }
    }

    profile
        .steps
        .push(SequenceStep::Note(SequenceNote { text, over }));
}
