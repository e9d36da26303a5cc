//! Conversion from the concrete syntax tree to the typed profile model.
//!
//! Each profile keyword has its own converter module. They share the
//! [`ConvertContext`], which carries the optional shape registry and the
//! suggestion limits and collects every conversion diagnostic so that a
//! single run reports all problems.

mod diagram;
mod gitgraph;
mod glyphset;
mod kanban;
mod railroad;
mod schematic;
mod sequence;
mod timeline;
mod treemap;
mod wardley;

use std::str::FromStr;

use log::{debug, trace};

use cartograph_core::{
    ast::{DataBag, DataValue, Document, LOST, FOUND, Profile, ProfileKind},
    shape::ShapeRegistry,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Result},
    parser_types as types,
    span::{Span, Spanned},
    suggest::{SuggestOptions, did_you_mean},
};

/// Shared state for one conversion run.
pub(crate) struct ConvertContext<'cfg> {
    shapes: Option<&'cfg ShapeRegistry>,
    suggestions: SuggestOptions,
    diagnostics: DiagnosticCollector,
}

impl<'cfg> ConvertContext<'cfg> {
    pub(crate) fn new(shapes: Option<&'cfg ShapeRegistry>, suggestions: SuggestOptions) -> Self {
        Self {
            shapes,
            suggestions,
            diagnostics: DiagnosticCollector::new(),
        }
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_diagnostics()
    }

    pub(crate) fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.emit(diagnostic);
    }

    /// Reports a failed check and turns it into `None`.
    pub(crate) fn check<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(diagnostic) => {
                self.emit(diagnostic);
                None
            }
        }
    }

    pub(crate) fn shapes(&self) -> Option<&'cfg ShapeRegistry> {
        self.shapes
    }

    pub(crate) fn hint<I, S>(&self, input: &str, candidates: I) -> Option<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        did_you_mean(input, candidates, &self.suggestions)
    }

    /// Parses an enum-like keyword value, suggesting the closest valid name on failure.
    pub(crate) fn keyword<T: FromStr>(
        &self,
        value: &Spanned<types::Value<'_>>,
        names: &[&str],
        what: &str,
    ) -> Result<T> {
        let text = text(value, what)?;
        T::from_str(&text.to_lowercase()).map_err(|_| {
            Diagnostic::error(format!("invalid {what} `{text}`"))
                .with_code(ErrorCode::E203)
                .with_label(value.span(), format!("expected one of: {}", names.join(", ")))
                .with_optional_help(self.hint(&text, names))
        })
    }

    pub(crate) fn unknown_statement(&mut self, keyword: &Spanned<&str>, profile: &str, known: &[&str]) {
        let diagnostic = Diagnostic::error(format!(
            "unknown statement `{}` in {profile} profile",
            keyword.inner()
        ))
        .with_code(ErrorCode::E201)
        .with_label(keyword.span(), "unknown statement")
        .with_optional_help(self.hint(keyword.inner(), known));
        self.emit(diagnostic);
    }

    pub(crate) fn unknown_setting(&mut self, key: &Spanned<&str>, known: &[&str]) {
        let diagnostic = Diagnostic::error(format!("unknown setting `{}`", key.inner()))
            .with_code(ErrorCode::E202)
            .with_label(key.span(), "unknown setting")
            .with_optional_help(self.hint(key.inner(), known));
        self.emit(diagnostic);
    }

    /// Rejects statements that take no block when one was given.
    pub(crate) fn reject_body(&mut self, command: &types::Command<'_>) {
        if command.body.is_some() {
            self.emit(
                Diagnostic::error(format!("`{}` does not take a block", command.keyword.inner()))
                    .with_code(ErrorCode::E203)
                    .with_label(command.span, "unexpected block"),
            );
        }
    }

    /// Reports every property of a command that accepts none.
    pub(crate) fn reject_properties(&mut self, properties: &[types::Property<'_>]) {
        for property in properties {
            self.emit(
                Diagnostic::error(format!("unknown property `{}`", property.key.inner()))
                    .with_code(ErrorCode::E202)
                    .with_label(property.key.span(), "no properties are accepted here"),
            );
        }
    }

    /// Checks `properties` against a fixed schema, reporting unknown and
    /// repeated keys.
    pub(crate) fn properties<'p, 'src>(
        &mut self,
        properties: &'p [types::Property<'src>],
        known: &[&str],
    ) -> Properties<'p, 'src> {
        for (index, property) in properties.iter().enumerate() {
            let key = *property.key.inner();
            if !known.contains(&key) {
                let diagnostic = Diagnostic::error(format!("unknown property `{key}`"))
                    .with_code(ErrorCode::E202)
                    .with_label(property.key.span(), "unknown property")
                    .with_optional_help(self.hint(key, known));
                self.emit(diagnostic);
            } else if let Some(first) = properties[..index]
                .iter()
                .find(|earlier| *earlier.key.inner() == key)
            {
                self.emit(
                    Diagnostic::error(format!("property `{key}` is set more than once"))
                        .with_code(ErrorCode::E205)
                        .with_label(property.key.span(), "repeated here")
                        .with_secondary_label(first.key.span(), "first set here"),
                );
            }
        }
        Properties { properties }
    }
}

/// Schema-checked view over a statement's properties.
pub(crate) struct Properties<'p, 'src> {
    properties: &'p [types::Property<'src>],
}

impl<'p, 'src> Properties<'p, 'src> {
    pub(crate) fn get(&self, key: &str) -> Option<&'p Spanned<types::Value<'src>>> {
        self.properties
            .iter()
            .find(|property| *property.key.inner() == key)
            .map(|property| &property.value)
    }
}

/// Text of an identifier, string or shape reference; numbers are rendered.
pub(crate) fn text(value: &Spanned<types::Value<'_>>, what: &str) -> Result<String> {
    match value.inner() {
        types::Value::Number(n) => Ok(n.to_string()),
        other => other.as_text().map(str::to_string).ok_or_else(|| {
            Diagnostic::error(format!("{what} must be text, found {}", other.kind_name()))
                .with_code(ErrorCode::E203)
                .with_label(value.span(), "expected a name or string")
        }),
    }
}

pub(crate) fn number(value: &Spanned<types::Value<'_>>, what: &str) -> Result<f32> {
    value.as_number().filter(|n| n.is_finite()).ok_or_else(|| {
        Diagnostic::error(format!("{what} must be a number, found {}", value.kind_name()))
            .with_code(ErrorCode::E203)
            .with_label(value.span(), "expected a number")
    })
}

pub(crate) fn boolean(value: &Spanned<types::Value<'_>>, what: &str) -> Result<bool> {
    match value.inner() {
        types::Value::Identifier("true") => Ok(true),
        types::Value::Identifier("false") => Ok(false),
        other => Err(Diagnostic::error(format!(
            "{what} must be `true` or `false`, found {}",
            other.kind_name()
        ))
        .with_code(ErrorCode::E203)
        .with_label(value.span(), "expected `true` or `false`")),
    }
}

/// A number in `0.0..=1.0`.
pub(crate) fn unit_interval(value: &Spanned<types::Value<'_>>, what: &str) -> Result<f32> {
    let n = number(value, what)?;
    if (0.0..=1.0).contains(&n) {
        Ok(n)
    } else {
        Err(Diagnostic::error(format!("{what} {n} is out of range"))
            .with_code(ErrorCode::E209)
            .with_label(value.span(), "must be between 0 and 1"))
    }
}

/// A list of texts. A single text is accepted as a one-element list.
pub(crate) fn text_list(value: &Spanned<types::Value<'_>>, what: &str) -> Result<Vec<Spanned<String>>> {
    match value.inner() {
        types::Value::List(items) => items
            .iter()
            .map(|item| text(item, what).map(|t| Spanned::new(t, item.span())))
            .collect(),
        _ => Ok(vec![Spanned::new(text(value, what)?, value.span())]),
    }
}

pub(crate) fn missing(span: Span, statement: &str, what: &str) -> Diagnostic {
    Diagnostic::error(format!("`{statement}` requires {what}"))
        .with_code(ErrorCode::E204)
        .with_label(span, format!("missing {what}"))
}

pub(crate) fn duplicate(span: Span, first: Option<Span>, kind: &str, name: &str) -> Diagnostic {
    let diagnostic = Diagnostic::error(format!("{kind} `{name}` is already defined"))
        .with_code(ErrorCode::E205)
        .with_label(span, "duplicate definition");
    match first {
        Some(first) => diagnostic.with_secondary_label(first, "first defined here"),
        None => diagnostic,
    }
}

/// Converts a property value into the opaque data bag representation.
pub(crate) fn data_value(value: &types::Value<'_>) -> DataValue {
    match value {
        types::Value::Identifier("true") => DataValue::Bool(true),
        types::Value::Identifier("false") => DataValue::Bool(false),
        types::Value::Identifier(text) | types::Value::ShapeRef(text) => {
            DataValue::String((*text).to_string())
        }
        types::Value::String(text) => DataValue::String(text.clone()),
        types::Value::Number(n) => DataValue::Number(*n),
        types::Value::List(items) => {
            DataValue::List(items.iter().map(|item| data_value(item.inner())).collect())
        }
    }
}

/// Collects every property not named in `reserved` into a data bag.
pub(crate) fn data_bag(properties: &[types::Property<'_>], reserved: &[&str]) -> DataBag {
    properties
        .iter()
        .filter(|property| !reserved.contains(property.key.inner()))
        .map(|property| {
            (
                (*property.key.inner()).to_string(),
                data_value(property.value.inner()),
            )
        })
        .collect()
}

/// Turns a display name into an id: lowercase, whitespace runs become `_`.
///
/// The sequence sentinels `lost` and `found` are returned unchanged.
///
/// ```
/// # use cartograph_parser::slugify;
/// assert_eq!(slugify("Web Server"), "web_server");
/// assert_eq!(slugify("found"), "found");
/// ```
pub fn slugify(name: &str) -> String {
    if name == LOST || name == FOUND {
        return name.to_string();
    }
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Id referenced by an endpoint or argument: identifiers are taken
/// verbatim, quoted names are slugified.
pub(crate) fn reference_id(value: &types::Value<'_>) -> String {
    match value {
        types::Value::String(name) => slugify(name),
        other => other.as_text().map_or_else(|| other.to_string(), str::to_string),
    }
}

/// Profile title from the header, overridable by a `title:` setting.
pub(crate) fn header_title(block: &types::ProfileBlock<'_>) -> Option<String> {
    block.title.as_ref().map(|title| title.inner().clone())
}

/// Converts every profile block. Blocks with an unknown keyword are reported
/// and skipped.
pub(crate) fn convert_document(document: &types::Document<'_>, ctx: &mut ConvertContext<'_>) -> Document {
    let mut profiles = Vec::with_capacity(document.profiles.len());

    for block in &document.profiles {
        let keyword = *block.keyword.inner();
        let Ok(kind) = keyword.parse::<ProfileKind>() else {
            let diagnostic = Diagnostic::error(format!("unknown profile `{keyword}`"))
                .with_code(ErrorCode::E200)
                .with_label(block.keyword.span(), "unknown profile keyword")
                .with_optional_help(ctx.hint(keyword, ProfileKind::KEYWORDS));
            ctx.emit(diagnostic);
            continue;
        };

        debug!(profile = keyword, statements = block.body.len(); "Converting profile");
        let profile = match kind {
            ProfileKind::Diagram => Profile::Diagram(diagram::convert(block, ctx)),
            ProfileKind::Sequence => Profile::Sequence(sequence::convert(block, ctx)),
            ProfileKind::Timeline => Profile::Timeline(timeline::convert(block, ctx)),
            ProfileKind::Wardley => Profile::Wardley(wardley::convert(block, ctx)),
            ProfileKind::Kanban => Profile::Kanban(kanban::convert(block, ctx)),
            ProfileKind::GitGraph => Profile::GitGraph(gitgraph::convert(block, ctx)),
            ProfileKind::Treemap => Profile::Treemap(treemap::convert(block, ctx)),
            ProfileKind::Railroad => Profile::Railroad(railroad::convert(block, ctx)),
            ProfileKind::Glyphset => Profile::Glyphset(glyphset::convert(block, ctx)),
            ProfileKind::Electrical
            | ProfileKind::Pneumatic
            | ProfileKind::Hydraulic
            | ProfileKind::Hvac
            | ProfileKind::Control
            | ProfileKind::Digital
            | ProfileKind::Pid => match kind.schematic_kind() {
                Some(schematic_kind) => {
                    Profile::Schematic(schematic::convert(block, schematic_kind, ctx))
                }
                None => continue,
            },
        };
        trace!(profile:? = profile; "Converted profile");
        profiles.push(profile);
    }

    Document { profiles }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spanned<'a>(value: types::Value<'a>) -> Spanned<types::Value<'a>> {
        Spanned::new(value, Span::new(0..1))
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Web Server"), "web_server");
        assert_eq!(slugify("  API   Gateway "), "api_gateway");
        assert_eq!(slugify("Alice"), "alice");
        assert_eq!(slugify("lost"), "lost");
        assert_eq!(slugify("found"), "found");
    }

    #[test]
    fn test_data_value_conversion() {
        assert_eq!(
            data_value(&types::Value::Identifier("true")),
            DataValue::Bool(true)
        );
        assert_eq!(data_value(&types::Value::Number(-2.5)), DataValue::Number(-2.5));
        assert_eq!(
            data_value(&types::Value::ShapeRef("db")),
            DataValue::String("db".to_string())
        );
    }

    #[test]
    fn test_unit_interval_rejects_out_of_range() {
        assert_eq!(unit_interval(&spanned(types::Value::Number(0.5)), "evolution").ok(), Some(0.5));
        let err = unit_interval(&spanned(types::Value::Number(1.5)), "evolution")
            .expect_err("out of range");
        assert_eq!(err.code(), Some(ErrorCode::E209));
    }

    #[test]
    fn test_keyword_suggests_closest_name() {
        let ctx = ConvertContext::new(None, SuggestOptions::default());
        let value = spanned(types::Value::Identifier("circlar"));
        let err = ctx
            .keyword::<cartograph_core::ast::LayoutAlgorithm>(
                &value,
                cartograph_core::ast::LayoutAlgorithm::NAMES,
                "layout algorithm",
            )
            .expect_err("invalid algorithm");
        assert_eq!(err.code(), Some(ErrorCode::E203));
        assert_eq!(err.help(), Some("did you mean `circular`?"));
    }

    #[test]
    fn test_properties_reports_unknown_and_repeated_keys() {
        let property = |key: &'static str| types::Property {
            key: Spanned::new(key, Span::new(0..key.len())),
            value: spanned(types::Value::Number(1.0)),
        };
        let properties = vec![property("wip"), property("wpi"), property("wip")];

        let mut ctx = ConvertContext::new(None, SuggestOptions::default());
        let props = ctx.properties(&properties, &["wip"]);
        assert!(props.get("wip").is_some());

        let diagnostics = ctx.into_diagnostics();
        let codes: Vec<_> = diagnostics.iter().map(Diagnostic::code).collect();
        assert_eq!(codes, vec![Some(ErrorCode::E202), Some(ErrorCode::E205)]);
    }

    #[test]
    fn test_reject_properties_reports_each_key() {
        let property = |key: &'static str| types::Property {
            key: Spanned::new(key, Span::new(0..key.len())),
            value: spanned(types::Value::Number(1.0)),
        };
        let properties = vec![property("color"), property("tag")];

        let mut ctx = ConvertContext::new(None, SuggestOptions::default());
        ctx.reject_properties(&properties);
        ctx.reject_properties(&[]);

        let diagnostics = ctx.into_diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.code() == Some(ErrorCode::E202)));
        assert_eq!(diagnostics[1].message(), "unknown property `tag`");
    }
}
