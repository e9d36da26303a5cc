//! `wardley` profile: components positioned by visibility and evolution,
//! their dependencies and planned evolution.

use cartograph_core::ast::{WardleyComponent, WardleyDependency, WardleyEvolution, WardleyProfile};

use super::{
    ConvertContext, boolean, duplicate, header_title, missing, slugify, text, unit_interval,
};
use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
    span::Spanned,
};

const STATEMENTS: &[&str] = &["component", "anchor", "evolve"];
const SETTINGS: &[&str] = &["title"];
const COMPONENT_PROPERTIES: &[&str] = &["visibility", "evolution", "inertia"];
const EVOLVE_PROPERTIES: &[&str] = &["to"];

pub(super) fn convert(block: &types::ProfileBlock<'_>, ctx: &mut ConvertContext<'_>) -> WardleyProfile {
    let mut profile = WardleyProfile {
        name: header_title(block),
        ..WardleyProfile::default()
    };
    // References are checked after every component is known.
    let mut evolutions: Vec<(Spanned<String>, f32)> = Vec::new();
    let mut dependencies: Vec<(Spanned<String>, Spanned<String>)> = Vec::new();

    for statement in block.properties.iter().map(Setting).chain(block.body.iter().map(Body)) {
        match statement {
            Setting(property) | Body(types::Statement::Setting(property)) => {
                match *property.key.inner() {
                    "title" => profile.name = ctx.check(text(&property.value, "title")),
                    _ => ctx.unknown_setting(&property.key, SETTINGS),
                }
            }
            Body(types::Statement::Edge(edge)) => {
                let from = ctx.check(text(&edge.from, "component"));
                let to = ctx.check(text(&edge.to, "component"));
                if let (Some(from), Some(to)) = (from, to) {
                    dependencies.push((
                        Spanned::new(slugify(&from), edge.from.span()),
                        Spanned::new(slugify(&to), edge.to.span()),
                    ));
                }
            }
            Body(types::Statement::Command(command)) => {
                ctx.reject_body(command);
                match *command.keyword.inner() {
                    "component" | "anchor" => {
                        let is_anchor = *command.keyword.inner() == "anchor";
                        if let Some(component) = component(command, is_anchor, ctx) {
                            if profile.component(&component.id).is_some() {
                                ctx.emit(duplicate(command.span, None, "component", &component.id));
                            } else {
                                profile.components.push(component);
                            }
                        }
                    }
                    "evolve" => {
                        if let Some(evolution) = evolve(command, ctx) {
                            evolutions.push(evolution);
                        }
                    }
                    _ => ctx.unknown_statement(&command.keyword, "wardley", STATEMENTS),
                }
            }
        }
    }

    for (component, target) in evolutions {
        if resolve(&profile, &component, ctx) {
            profile.evolutions.push(WardleyEvolution {
                component: component.into_inner(),
                target,
            });
        }
    }
    for (from, to) in dependencies {
        let from_known = resolve(&profile, &from, ctx);
        let to_known = resolve(&profile, &to, ctx);
        if from_known && to_known {
            profile.dependencies.push(WardleyDependency {
                from: from.into_inner(),
                to: to.into_inner(),
            });
        }
    }

    profile
}

enum Item<'a, 'src> {
    Setting(&'a types::Property<'src>),
    Body(&'a types::Statement<'src>),
}
use Item::{Body, Setting};

fn resolve(profile: &WardleyProfile, id: &Spanned<String>, ctx: &mut ConvertContext<'_>) -> bool {
    if profile.component(id.inner()).is_some() {
        return true;
    }
    let ids: Vec<&str> = profile.components.iter().map(|c| c.id.as_str()).collect();
    let diagnostic = Diagnostic::error(format!("undefined component `{}`", id.inner()))
        .with_code(ErrorCode::E206)
        .with_label(id.span(), "no component with this name")
        .with_optional_help(ctx.hint(id.inner(), ids));
    ctx.emit(diagnostic);
    false
}

/// `component "Name" visibility: 0..1 evolution: 0..1 [inertia]`
fn component(
    command: &types::Command<'_>,
    anchor: bool,
    ctx: &mut ConvertContext<'_>,
) -> Option<WardleyComponent> {
    let Some(name_arg) = command.args.first() else {
        ctx.emit(missing(command.keyword.span(), command.keyword.inner(), "a name"));
        return None;
    };
    let name = ctx.check(text(name_arg, "component name"))?;

    let mut inertia = false;
    for arg in &command.args[1..] {
        match arg.inner() {
            types::Value::Identifier("inertia") => inertia = true,
            other => ctx.emit(
                Diagnostic::error(format!("unexpected {} in component", other.kind_name()))
                    .with_code(ErrorCode::E203)
                    .with_label(arg.span(), "expected `inertia` or a property"),
            ),
        }
    }

    let props = ctx.properties(&command.properties, COMPONENT_PROPERTIES);
    if let Some(value) = props.get("inertia") {
        inertia = ctx.check(boolean(value, "inertia")).unwrap_or(inertia);
    }

    let visibility = props.get("visibility");
    let evolution = props.get("evolution");
    if visibility.is_none() {
        ctx.emit(missing(command.keyword.span(), command.keyword.inner(), "`visibility:`"));
    }
    if evolution.is_none() {
        ctx.emit(missing(command.keyword.span(), command.keyword.inner(), "`evolution:`"));
    }
    let visibility = visibility.and_then(|value| ctx.check(unit_interval(value, "visibility")));
    let evolution = evolution.and_then(|value| ctx.check(unit_interval(value, "evolution")));

    Some(WardleyComponent {
        id: slugify(&name),
        name,
        visibility: visibility?,
        evolution: evolution?,
        anchor,
        inertia,
    })
}

/// `evolve "Name" to: 0..1`
fn evolve(command: &types::Command<'_>, ctx: &mut ConvertContext<'_>) -> Option<(Spanned<String>, f32)> {
    let Some(name_arg) = command.args.first() else {
        ctx.emit(missing(command.keyword.span(), "evolve", "a component name"));
        return None;
    };
    let name = ctx.check(text(name_arg, "component name"))?;

    let props = ctx.properties(&command.properties, EVOLVE_PROPERTIES);
    let Some(target) = props.get("to") else {
        ctx.emit(missing(command.keyword.span(), "evolve", "`to:`"));
        return None;
    };
    let target = ctx.check(unit_interval(target, "evolution target"))?;

    Some((Spanned::new(slugify(&name), name_arg.span()), target))
}
