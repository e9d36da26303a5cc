//! `timeline` profile: dated events and periods.

use cartograph_core::ast::{Orientation, TimelineEvent, TimelinePeriod, TimelineProfile};

use super::{ConvertContext, duplicate, header_title, missing, reference_id, text};
use crate::{error::Diagnostic, error::ErrorCode, parser_types as types};

const STATEMENTS: &[&str] = &["event", "period"];
const SETTINGS: &[&str] = &["title", "orientation"];
const EVENT_PROPERTIES: &[&str] = &["date", "label"];
const PERIOD_PROPERTIES: &[&str] = &["start", "end", "label"];

pub(super) fn convert(
    block: &types::ProfileBlock<'_>,
    ctx: &mut ConvertContext<'_>,
) -> TimelineProfile {
    let mut profile = TimelineProfile {
        name: header_title(block),
        ..TimelineProfile::default()
    };

    for property in &block.properties {
        setting(property, &mut profile, ctx);
    }

    for statement in &block.body {
        match statement {
            types::Statement::Setting(property) => setting(property, &mut profile, ctx),
            types::Statement::Command(command) => {
                ctx.reject_body(command);
                match *command.keyword.inner() {
                    "event" => {
                        if let Some(event) = event(command, ctx) {
                            if profile.events.iter().any(|e| e.id == event.id) {
                                ctx.emit(duplicate(command.span, None, "event", &event.id));
                            } else {
                                profile.events.push(event);
                            }
                        }
                    }
                    "period" => {
                        if let Some(period) = period(command, ctx) {
                            if profile.periods.iter().any(|p| p.id == period.id) {
                                ctx.emit(duplicate(command.span, None, "period", &period.id));
                            } else {
                                profile.periods.push(period);
                            }
                        }
                    }
                    _ => ctx.unknown_statement(&command.keyword, "timeline", STATEMENTS),
                }
            }
            types::Statement::Edge(edge) => ctx.emit(
                Diagnostic::error("timelines do not have edges")
                    .with_code(ErrorCode::E201)
                    .with_label(edge.span, "unexpected edge"),
            ),
        }
    }

    profile
}

fn setting(property: &types::Property<'_>, profile: &mut TimelineProfile, ctx: &mut ConvertContext<'_>) {
    match *property.key.inner() {
        "title" => profile.name = ctx.check(text(&property.value, "title")),
        "orientation" => {
            let orientation = ctx.check(text(&property.value, "orientation"));
            match orientation.as_deref().map(str::to_lowercase).as_deref() {
                Some("horizontal") => profile.orientation = Orientation::Horizontal,
                Some("vertical") => profile.orientation = Orientation::Vertical,
                Some(other) => {
                    let diagnostic = Diagnostic::error(format!("invalid orientation `{other}`"))
                        .with_code(ErrorCode::E203)
                        .with_label(property.value.span(), "expected `horizontal` or `vertical`")
                        .with_optional_help(ctx.hint(other, ["horizontal", "vertical"]));
                    ctx.emit(diagnostic);
                }
                None => {}
            }
        }
        _ => ctx.unknown_setting(&property.key, SETTINGS),
    }
}

/// Id from the first argument; a quoted name doubles as the default label.
fn identity(command: &types::Command<'_>, ctx: &mut ConvertContext<'_>) -> Option<(String, Option<String>)> {
    let Some(arg) = command.args.first() else {
        ctx.emit(missing(command.keyword.span(), command.keyword.inner(), "an id"));
        return None;
    };
    let label = match arg.inner() {
        types::Value::String(name) => Some(name.clone()),
        _ => None,
    };
    Some((reference_id(arg.inner()), label))
}

/// `event ID date: .. [label: ..]`
fn event(command: &types::Command<'_>, ctx: &mut ConvertContext<'_>) -> Option<TimelineEvent> {
    let (id, default_label) = identity(command, ctx)?;
    let props = ctx.properties(&command.properties, EVENT_PROPERTIES);

    let Some(date) = props.get("date") else {
        ctx.emit(missing(command.keyword.span(), "event", "`date:`"));
        return None;
    };
    let date = ctx.check(text(date, "date"))?;
    let label = match props.get("label") {
        Some(value) => ctx.check(text(value, "label")),
        None => default_label,
    };

    Some(TimelineEvent { id, date, label })
}

/// `period ID start: .. end: .. [label: ..]`
fn period(command: &types::Command<'_>, ctx: &mut ConvertContext<'_>) -> Option<TimelinePeriod> {
    let (id, default_label) = identity(command, ctx)?;
    let props = ctx.properties(&command.properties, PERIOD_PROPERTIES);

    let start = props.get("start");
    let end = props.get("end");
    if start.is_none() {
        ctx.emit(missing(command.keyword.span(), "period", "`start:`"));
    }
    if end.is_none() {
        ctx.emit(missing(command.keyword.span(), "period", "`end:`"));
    }
    let start = ctx.check(text(start?, "start"))?;
    let end = ctx.check(text(end?, "end"))?;
    let label = match props.get("label") {
        Some(value) => ctx.check(text(value, "label")),
        None => default_label,
    };

    Some(TimelinePeriod {
        id,
        start,
        end,
        label,
    })
}
