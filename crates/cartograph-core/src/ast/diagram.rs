//! Generic node/edge diagram AST.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use super::{AST_VERSION, DataBag};

/// Shape assigned to nodes declared without one.
pub const DEFAULT_SHAPE: &str = "rectangle";

/// Main flow direction of a diagram or container.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Top to bottom (default)
    #[default]
    TB,
    /// Left to right
    LR,
    /// Bottom to top
    BT,
    /// Right to left
    RL,
}

impl Direction {
    pub const NAMES: &'static [&'static str] = &["TB", "LR", "BT", "RL"];

    /// True when layers advance along the X axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LR | Self::RL)
    }

    /// True when layers advance toward negative coordinates.
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::BT | Self::RL)
    }
}

impl FromStr for Direction {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TB" | "TD" => Ok(Self::TB),
            "LR" => Ok(Self::LR),
            "BT" => Ok(Self::BT),
            "RL" => Ok(Self::RL),
            _ => Err("Unsupported direction"),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TB => "TB",
            Self::LR => "LR",
            Self::BT => "BT",
            Self::RL => "RL",
        };
        write!(f, "{s}")
    }
}

/// Placement strategy for a diagram or a single container.
///
/// The names match external configuration strings (snake_case).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutAlgorithm {
    /// Layered directed-graph layout (default)
    #[default]
    Hierarchical,
    /// Nodes on a circle at equal angular steps
    Circular,
    /// Physics simulation with springs and repulsion
    Force,
}

impl LayoutAlgorithm {
    pub const NAMES: &'static [&'static str] = &["hierarchical", "circular", "force"];
}

impl FromStr for LayoutAlgorithm {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hierarchical" => Ok(Self::Hierarchical),
            "circular" => Ok(Self::Circular),
            "force" => Ok(Self::Force),
            _ => Err("Unsupported layout algorithm"),
        }
    }
}

impl From<LayoutAlgorithm> for &'static str {
    fn from(val: LayoutAlgorithm) -> Self {
        match val {
            LayoutAlgorithm::Hierarchical => "hierarchical",
            LayoutAlgorithm::Circular => "circular",
            LayoutAlgorithm::Force => "force",
        }
    }
}

impl Display for LayoutAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

/// Stroke pattern of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
    Thick,
}

impl LineStyle {
    pub const NAMES: &'static [&'static str] = &["solid", "dashed", "dotted", "thick"];
}

impl FromStr for LineStyle {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(Self::Solid),
            "dashed" => Ok(Self::Dashed),
            "dotted" => Ok(Self::Dotted),
            "thick" => Ok(Self::Thick),
            _ => Err("Unsupported line style"),
        }
    }
}

/// Which ends of an edge carry an arrow head.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowKind {
    #[default]
    Forward,
    Backward,
    Both,
    None,
}

/// A centrality annotation a node can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Degree,
    Betweenness,
    Closeness,
    Clustering,
}

impl MetricKind {
    pub const NAMES: &'static [&'static str] = &["degree", "betweenness", "closeness", "clustering"];
    pub const ALL: [MetricKind; 4] = [
        Self::Degree,
        Self::Betweenness,
        Self::Closeness,
        Self::Clustering,
    ];
}

impl FromStr for MetricKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "degree" => Ok(Self::Degree),
            "betweenness" => Ok(Self::Betweenness),
            "closeness" => Ok(Self::Closeness),
            "clustering" => Ok(Self::Clustering),
            _ => Err("Unsupported metric"),
        }
    }
}

/// A diagram node. Identity is the `id`; `shape` is resolved later against a
/// shape registry and is not checked here beyond being a string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeAst {
    pub id: String,
    pub shape: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "DataBag::is_empty")]
    pub data: DataBag,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<MetricKind>,
}

impl NodeAst {
    pub fn new(id: impl Into<String>, shape: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            shape: shape.into(),
            label: None,
            data: DataBag::new(),
            metrics: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The text a renderer shows: the label, or the id when unlabeled.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// A connection between two nodes or containers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeAst {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Absent when the source did not give one; consumers treat that as `1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_style: Option<LineStyle>,
    pub arrow: ArrowKind,
    #[serde(skip_serializing_if = "DataBag::is_empty")]
    pub data: DataBag,
}

impl EdgeAst {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: None,
            weight: None,
            line_style: None,
            arrow: ArrowKind::default(),
            data: DataBag::new(),
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Synthetic identifier `"{from}-{to}"` used by routed output.
    pub fn edge_id(&self) -> String {
        format!("{}-{}", self.from, self.to)
    }

    /// Weight for numeric consumers: missing or non-finite weights count as `1`.
    pub fn effective_weight(&self) -> f32 {
        self.weight.filter(|w| w.is_finite()).unwrap_or(1.0)
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// A group of nodes, possibly nested inside other containers.
///
/// At least one of `id` or `label` is expected; the validator reports a
/// container that has neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContainerDeclaration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub children: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<ContainerDeclaration>,
    #[serde(skip_serializing_if = "DataBag::is_empty")]
    pub container_style: DataBag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<LayoutAlgorithm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl ContainerDeclaration {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_containers(mut self, containers: Vec<ContainerDeclaration>) -> Self {
        self.containers = containers;
        self
    }

    /// Identity used for lookups: the id, or the label when no id was given.
    pub fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.label.as_deref())
    }
}

/// Reusable container settings referenced with `template: id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContainerTemplate {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "DataBag::is_empty")]
    pub container_style: DataBag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<LayoutAlgorithm>,
}

/// Root artifact of parsing a `diagram` profile. Never mutated by later stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramAst {
    pub ast_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub direction: Direction,
    pub directed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<LayoutAlgorithm>,
    pub nodes: Vec<NodeAst>,
    pub edges: Vec<EdgeAst>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<ContainerDeclaration>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<ContainerTemplate>,
}

impl Default for DiagramAst {
    fn default() -> Self {
        Self {
            ast_version: AST_VERSION,
            name: None,
            direction: Direction::default(),
            directed: false,
            algorithm: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            containers: Vec::new(),
            templates: Vec::new(),
        }
    }
}

impl DiagramAst {
    /// Builds a diagram from nodes and edges with default settings.
    pub fn from_parts(nodes: Vec<NodeAst>, edges: Vec<EdgeAst>) -> Self {
        Self {
            nodes,
            edges,
            ..Self::default()
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeAst> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn template(&self, id: &str) -> Option<&ContainerTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_str() {
        assert_eq!("lr".parse::<Direction>(), Ok(Direction::LR));
        assert_eq!("TD".parse::<Direction>(), Ok(Direction::TB));
        assert!("diagonal".parse::<Direction>().is_err());
        assert!(Direction::RL.is_horizontal());
        assert!(Direction::RL.is_reversed());
        assert!(!Direction::TB.is_reversed());
    }

    #[test]
    fn test_edge_effective_weight() {
        let edge = EdgeAst::new("a", "b");
        assert_eq!(edge.weight, None);
        assert_eq!(edge.effective_weight(), 1.0);
        assert_eq!(edge.clone().with_weight(-3.0).effective_weight(), -3.0);
        assert_eq!(edge.with_weight(f32::NAN).effective_weight(), 1.0);
    }

    #[test]
    fn test_edge_id() {
        assert_eq!(EdgeAst::new("api", "db").edge_id(), "api-db");
    }

    #[test]
    fn test_container_key_prefers_id() {
        let mut container = ContainerDeclaration::default();
        assert_eq!(container.key(), None);
        container.label = Some("Backend".to_string());
        assert_eq!(container.key(), Some("Backend"));
        container.id = Some("backend".to_string());
        assert_eq!(container.key(), Some("backend"));
    }

    #[test]
    fn test_node_display_label() {
        let node = NodeAst::new("web", DEFAULT_SHAPE);
        assert_eq!(node.display_label(), "web");
        assert_eq!(node.with_label("Web App").display_label(), "Web App");
    }
}
