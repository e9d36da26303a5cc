//! `diagram` profile: nodes, edges, nested containers and container templates.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use cartograph_core::ast::{
    ArrowKind, ContainerDeclaration, ContainerTemplate, DEFAULT_SHAPE, DiagramAst, Direction,
    EdgeAst, LayoutAlgorithm, LineStyle, MetricKind, NodeAst,
};

use super::{
    ConvertContext, boolean, data_bag, duplicate, header_title, missing, number, reference_id,
    text, text_list,
};
use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
    span::{Span, Spanned},
};

const STATEMENTS: &[&str] = &["shape", "node", "container", "group", "template"];
const SETTINGS: &[&str] = &["title", "direction", "directed", "algorithm"];
const CONTAINER_SETTINGS: &[&str] = &["label", "direction", "algorithm"];

// Properties with a dedicated field; everything else lands in the data bag.
const NODE_FIELDS: &[&str] = &["label", "shape", "metrics"];
const EDGE_FIELDS: &[&str] = &["label", "weight", "style"];
const CONTAINER_FIELDS: &[&str] = &["label", "children", "template", "algorithm", "direction"];
const TEMPLATE_FIELDS: &[&str] = &["label", "algorithm"];

struct DiagramConverter<'a, 'cfg> {
    ctx: &'a mut ConvertContext<'cfg>,
    diagram: DiagramAst,
    node_spans: IndexMap<String, Span>,
    /// Edge endpoints in order of appearance, with the label an implicit
    /// node would get.
    endpoints: IndexMap<String, Option<String>>,
}

pub(super) fn convert(block: &types::ProfileBlock<'_>, ctx: &mut ConvertContext<'_>) -> DiagramAst {
    let mut converter = DiagramConverter {
        ctx,
        diagram: DiagramAst {
            name: header_title(block),
            ..DiagramAst::default()
        },
        node_spans: IndexMap::new(),
        endpoints: IndexMap::new(),
    };

    for property in &block.properties {
        converter.setting(property);
    }

    // Templates first so containers may use them regardless of order.
    for statement in &block.body {
        if let types::Statement::Command(command) = statement {
            if *command.keyword.inner() == "template" {
                converter.template(command);
            }
        }
    }

    for statement in &block.body {
        match statement {
            types::Statement::Setting(property) => converter.setting(property),
            types::Statement::Edge(edge) => converter.edge(edge),
            types::Statement::Command(command) => match *command.keyword.inner() {
                "template" => {}
                "shape" | "node" => {
                    converter.node(command);
                }
                "container" | "group" => {
                    let container = converter.container(command);
                    converter.diagram.containers.push(container);
                }
                _ => converter
                    .ctx
                    .unknown_statement(&command.keyword, "diagram", STATEMENTS),
            },
        }
    }

    converter.finish()
}

impl DiagramConverter<'_, '_> {
    fn setting(&mut self, property: &types::Property<'_>) {
        let value = &property.value;
        match *property.key.inner() {
            "title" => self.diagram.name = self.ctx.check(text(value, "title")),
            "direction" => {
                if let Some(direction) =
                    self.ctx
                        .check(self.ctx.keyword::<Direction>(value, Direction::NAMES, "direction"))
                {
                    self.diagram.direction = direction;
                }
            }
            "directed" => {
                if let Some(directed) = self.ctx.check(boolean(value, "directed")) {
                    self.diagram.directed = directed;
                }
            }
            "algorithm" => {
                self.diagram.algorithm = self.ctx.check(self.ctx.keyword::<LayoutAlgorithm>(
                    value,
                    LayoutAlgorithm::NAMES,
                    "layout algorithm",
                ));
            }
            _ => self.ctx.unknown_setting(&property.key, SETTINGS),
        }
    }

    /// `shape ID ["Label"] [as] [@shape] key: value ...`
    ///
    /// Returns the node id when the node was added.
    fn node(&mut self, command: &types::Command<'_>) -> Option<String> {
        self.ctx.reject_body(command);

        let mut args = command.args.iter();
        let Some(id_arg) = args.next() else {
            self.ctx
                .emit(missing(command.keyword.span(), command.keyword.inner(), "a node id"));
            return None;
        };
        let id = match id_arg.inner() {
            types::Value::Identifier(_) | types::Value::String(_) => reference_id(id_arg.inner()),
            other => {
                self.ctx.emit(
                    Diagnostic::error(format!("node id must be a name, found {}", other.kind_name()))
                        .with_code(ErrorCode::E203)
                        .with_label(id_arg.span(), "expected a name"),
                );
                return None;
            }
        };

        let mut node = NodeAst::new(id.clone(), DEFAULT_SHAPE);
        if let types::Value::String(name) = id_arg.inner() {
            node.label = Some(name.clone());
        }

        let mut shape_span = None;
        for arg in args {
            match arg.inner() {
                types::Value::Identifier("as") => {}
                types::Value::ShapeRef(shape) => {
                    node.shape = (*shape).to_string();
                    shape_span = Some(arg.span());
                }
                types::Value::String(label) => node.label = Some(label.clone()),
                other => self.ctx.emit(
                    Diagnostic::error(format!("unexpected {} in node declaration", other.kind_name()))
                        .with_code(ErrorCode::E203)
                        .with_label(arg.span(), "expected `@shape` or a label string"),
                ),
            }
        }

        for property in &command.properties {
            let value = &property.value;
            match *property.key.inner() {
                "label" => {
                    if let Some(label) = self.ctx.check(text(value, "label")) {
                        node.label = Some(label);
                    }
                }
                "shape" => {
                    if let Some(shape) = self.ctx.check(text(value, "shape")) {
                        node.shape = shape;
                        shape_span = Some(value.span());
                    }
                }
                "metrics" => node.metrics = self.metrics(value),
                _ => {}
            }
        }
        node.data = data_bag(&command.properties, NODE_FIELDS);

        if let Some(span) = shape_span {
            self.check_shape(&node.shape, span);
        }

        if let Some(first) = self.node_spans.get(&id) {
            self.ctx
                .emit(duplicate(id_arg.span(), Some(*first), "node", &id));
            return None;
        }

        debug!(node = id.as_str(), shape = node.shape.as_str(); "Declared node");
        self.node_spans.insert(id.clone(), id_arg.span());
        self.diagram.nodes.push(node);
        Some(id)
    }

    fn metrics(&mut self, value: &Spanned<types::Value<'_>>) -> Vec<MetricKind> {
        let Some(names) = self.ctx.check(text_list(value, "metric")) else {
            return Vec::new();
        };

        let mut metrics = Vec::new();
        for name in names {
            match name.to_lowercase().parse::<MetricKind>() {
                Ok(metric) if !metrics.contains(&metric) => metrics.push(metric),
                Ok(_) => {}
                Err(_) => {
                    let diagnostic = Diagnostic::error(format!("unknown metric `{}`", name.inner()))
                        .with_code(ErrorCode::E208)
                        .with_label(name.span(), "unknown metric")
                        .with_optional_help(self.ctx.hint(name.inner(), MetricKind::NAMES));
                    self.ctx.emit(diagnostic);
                }
            }
        }
        metrics
    }

    /// Unknown shapes are only a warning: renderers may bring their own.
    fn check_shape(&mut self, shape: &str, span: Span) {
        let Some(registry) = self.ctx.shapes() else {
            return;
        };
        if registry.contains(shape) {
            return;
        }
        let diagnostic = Diagnostic::warning(format!("unknown shape `{shape}`"))
            .with_code(ErrorCode::W300)
            .with_label(span, "not in the shape registry")
            .with_optional_help(self.ctx.hint(shape, registry.names()));
        self.ctx.emit(diagnostic);
    }

    fn edge(&mut self, statement: &types::EdgeStatement<'_>) {
        let from = reference_id(statement.from.inner());
        let to = reference_id(statement.to.inner());
        self.note_endpoint(&from, statement.from.inner());
        self.note_endpoint(&to, statement.to.inner());

        let mut edge = EdgeAst::new(from, to);
        let (arrow, line_style) = match statement.connector.inner() {
            types::Connector::Arrow => (ArrowKind::Forward, None),
            types::Connector::DashedArrow => (ArrowKind::Forward, Some(LineStyle::Dashed)),
            types::Connector::ThickArrow => (ArrowKind::Forward, Some(LineStyle::Thick)),
            types::Connector::LeftArrow => (ArrowKind::Backward, None),
            types::Connector::DoubleArrow => (ArrowKind::Both, None),
            types::Connector::DashedLine => (ArrowKind::None, Some(LineStyle::Dashed)),
            types::Connector::Line => (ArrowKind::None, None),
        };
        edge.arrow = arrow;
        edge.line_style = line_style;

        for arg in &statement.args {
            match arg.inner() {
                types::Value::String(label) if edge.label.is_none() => {
                    edge.label = Some(label.clone());
                }
                other => self.ctx.emit(
                    Diagnostic::error(format!("unexpected {} after edge", other.kind_name()))
                        .with_code(ErrorCode::E203)
                        .with_label(arg.span(), "expected a single label string"),
                ),
            }
        }

        for property in &statement.properties {
            let value = &property.value;
            match *property.key.inner() {
                "label" => {
                    if let Some(label) = self.ctx.check(text(value, "label")) {
                        edge.label = Some(label);
                    }
                }
                "weight" => edge.weight = self.ctx.check(number(value, "weight")),
                "style" => {
                    if let Some(style) = self.ctx.check(self.ctx.keyword::<LineStyle>(
                        value,
                        LineStyle::NAMES,
                        "line style",
                    )) {
                        edge.line_style = Some(style);
                    }
                }
                _ => {}
            }
        }
        edge.data = data_bag(&statement.properties, EDGE_FIELDS);

        self.diagram.edges.push(edge);
    }

    fn note_endpoint(&mut self, id: &str, value: &types::Value<'_>) {
        if self.endpoints.contains_key(id) {
            return;
        }
        let label = match value {
            types::Value::String(name) => Some(name.clone()),
            _ => None,
        };
        self.endpoints.insert(id.to_string(), label);
    }

    /// `template ID ["Label"] [algorithm: ..] style...`
    fn template(&mut self, command: &types::Command<'_>) {
        self.ctx.reject_body(command);

        let Some(id_arg) = command.args.first() else {
            self.ctx
                .emit(missing(command.keyword.span(), "template", "a template id"));
            return;
        };
        let Some(id) = self.ctx.check(text(id_arg, "template id")) else {
            return;
        };
        if self.diagram.template(&id).is_some() {
            self.ctx.emit(duplicate(id_arg.span(), None, "template", &id));
            return;
        }

        let mut template = ContainerTemplate {
            id,
            ..ContainerTemplate::default()
        };
        for arg in &command.args[1..] {
            match arg.inner() {
                types::Value::String(label) => template.label = Some(label.clone()),
                other => self.ctx.emit(
                    Diagnostic::error(format!("unexpected {} in template", other.kind_name()))
                        .with_code(ErrorCode::E203)
                        .with_label(arg.span(), "expected a label string"),
                ),
            }
        }
        for property in &command.properties {
            match *property.key.inner() {
                "label" => template.label = self.ctx.check(text(&property.value, "label")),
                "algorithm" => {
                    template.algorithm = self.ctx.check(self.ctx.keyword::<LayoutAlgorithm>(
                        &property.value,
                        LayoutAlgorithm::NAMES,
                        "layout algorithm",
                    ));
                }
                _ => {}
            }
        }
        template.container_style = data_bag(&command.properties, TEMPLATE_FIELDS);

        self.diagram.templates.push(template);
    }

    /// `container [ID] ["Label"] key: value ... { statements }`
    fn container(&mut self, command: &types::Command<'_>) -> ContainerDeclaration {
        let mut container = ContainerDeclaration::default();

        for arg in &command.args {
            match arg.inner() {
                types::Value::Identifier(id) if container.id.is_none() => {
                    container.id = Some((*id).to_string());
                }
                types::Value::String(label) if container.label.is_none() => {
                    container.label = Some(label.clone());
                }
                other => self.ctx.emit(
                    Diagnostic::error(format!("unexpected {} in container", other.kind_name()))
                        .with_code(ErrorCode::E203)
                        .with_label(arg.span(), "expected an id and an optional label"),
                ),
            }
        }

        let mut template_ref = None;
        for property in &command.properties {
            let value = &property.value;
            match *property.key.inner() {
                "label" => container.label = self.ctx.check(text(value, "label")),
                "children" => {
                    if let Some(children) = self.ctx.check(text_list(value, "child")) {
                        container
                            .children
                            .extend(children.into_iter().map(Spanned::into_inner));
                    }
                }
                "template" => {
                    template_ref = self
                        .ctx
                        .check(text(value, "template"))
                        .map(|name| Spanned::new(name, value.span()));
                }
                "algorithm" => {
                    container.algorithm = self.ctx.check(self.ctx.keyword::<LayoutAlgorithm>(
                        value,
                        LayoutAlgorithm::NAMES,
                        "layout algorithm",
                    ));
                }
                "direction" => {
                    container.direction = self.ctx.check(self.ctx.keyword::<Direction>(
                        value,
                        Direction::NAMES,
                        "direction",
                    ));
                }
                _ => {}
            }
        }
        container.container_style = data_bag(&command.properties, CONTAINER_FIELDS);

        if let Some(body) = &command.body {
            for statement in body {
                self.container_statement(&mut container, statement);
            }
        }

        if let Some(name) = template_ref {
            self.apply_template(&mut container, &name);
            container.template = Some(name.into_inner());
        }

        container
    }

    fn container_statement(
        &mut self,
        container: &mut ContainerDeclaration,
        statement: &types::Statement<'_>,
    ) {
        match statement {
            types::Statement::Setting(property) => {
                let value = &property.value;
                match *property.key.inner() {
                    "label" => container.label = self.ctx.check(text(value, "label")),
                    "direction" => {
                        container.direction = self.ctx.check(self.ctx.keyword::<Direction>(
                            value,
                            Direction::NAMES,
                            "direction",
                        ));
                    }
                    "algorithm" => {
                        container.algorithm =
                            self.ctx.check(self.ctx.keyword::<LayoutAlgorithm>(
                                value,
                                LayoutAlgorithm::NAMES,
                                "layout algorithm",
                            ));
                    }
                    _ => self.ctx.unknown_setting(&property.key, CONTAINER_SETTINGS),
                }
            }
            types::Statement::Edge(edge) => self.edge(edge),
            types::Statement::Command(command) => match *command.keyword.inner() {
                "shape" | "node" => {
                    if let Some(id) = self.node(command) {
                        container.children.push(id);
                    }
                }
                "container" | "group" => {
                    let nested = self.container(command);
                    container.containers.push(nested);
                }
                "template" => self.ctx.emit(
                    Diagnostic::error("templates must be declared at the top level")
                        .with_code(ErrorCode::E201)
                        .with_label(command.keyword.span(), "nested template"),
                ),
                _ => self
                    .ctx
                    .unknown_statement(&command.keyword, "diagram", STATEMENTS),
            },
        }
    }

    /// Template style and algorithm fill in whatever the container left unset.
    fn apply_template(&mut self, container: &mut ContainerDeclaration, name: &Spanned<String>) {
        let Some(template) = self.diagram.template(name.inner()) else {
            let names: Vec<&str> = self.diagram.templates.iter().map(|t| t.id.as_str()).collect();
            let diagnostic = Diagnostic::error(format!("unknown template `{}`", name.inner()))
                .with_code(ErrorCode::E207)
                .with_label(name.span(), "no template with this id")
                .with_optional_help(self.ctx.hint(name.inner(), names));
            self.ctx.emit(diagnostic);
            return;
        };

        for (key, value) in &template.container_style {
            container
                .container_style
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        if container.algorithm.is_none() {
            container.algorithm = template.algorithm;
        }
    }

    /// Adds implicit nodes for edge endpoints that were never declared and
    /// do not name a container.
    fn finish(mut self) -> DiagramAst {
        let mut container_keys = HashSet::new();
        collect_container_keys(&self.diagram.containers, &mut container_keys);

        for (id, label) in std::mem::take(&mut self.endpoints) {
            if self.node_spans.contains_key(&id) || container_keys.contains(id.as_str()) {
                continue;
            }
            debug!(node = id.as_str(); "Adding implicit node for edge endpoint");
            let mut node = NodeAst::new(id.clone(), DEFAULT_SHAPE);
            node.label = label;
            self.node_spans.insert(id, Span::default());
            self.diagram.nodes.push(node);
        }

        self.diagram
    }
}

fn collect_container_keys<'a>(containers: &'a [ContainerDeclaration], keys: &mut HashSet<&'a str>) {
    for container in containers {
        if let Some(key) = container.key() {
            keys.insert(key);
        }
        collect_container_keys(&container.containers, keys);
    }
}
