//! Positioned output of the layout engine.
//!
//! A [`LaidOutDiagram`] is built fresh for every layout call and handed to
//! renderers and exporters, which treat it as read-only. Node coordinates are
//! the top-left corner of the node's box. Edge `points` are ordered polyline
//! vertices; the [`PathKind`] hint says how a renderer may smooth them.

use serde::Serialize;

use crate::{
    ast::{EdgeAst, NodeAst},
    geometry::{Bounds, Point, Size},
};

/// Stroke width attached to circular edges that do not set one.
pub const DEFAULT_ARC_STROKE_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    #[serde(flatten)]
    pub node: NodeAst,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PositionedNode {
    pub fn new(node: NodeAst, bounds: Bounds) -> Self {
        Self {
            node,
            x: bounds.min_x(),
            y: bounds.min_y(),
            width: bounds.width(),
            height: bounds.height(),
        }
    }

    pub fn id(&self) -> &str {
        &self.node.id
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(Point::new(self.x, self.y), Size::new(self.width, self.height))
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }
}

/// How consecutive points of a routed edge are meant to be joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    /// Straight segments.
    #[default]
    Polyline,
    /// Axis-aligned segments.
    Orthogonal,
    /// `[start, control, end]` of a quadratic curve.
    Arc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedEdge {
    /// Synthetic id `"{from}-{to}"`.
    pub id: String,
    #[serde(flatten)]
    pub edge: EdgeAst,
    /// Empty when an endpoint could not be resolved.
    pub points: Vec<Point>,
    pub path: PathKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,
}

impl RoutedEdge {
    /// An edge that could not be routed.
    pub fn unrouted(edge: EdgeAst) -> Self {
        Self {
            id: edge.edge_id(),
            edge,
            points: Vec::new(),
            path: PathKind::Polyline,
            stroke_width: None,
        }
    }

    pub fn is_routed(&self) -> bool {
        self.points.len() >= 2
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedContainer {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// `0` for top-level containers.
    pub depth: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PositionedContainer {
    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(Point::new(self.x, self.y), Size::new(self.width, self.height))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LaidOutDiagram {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<RoutedEdge>,
    pub containers: Vec<PositionedContainer>,
    pub size: Size,
}

impl LaidOutDiagram {
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn edge(&self, id: &str) -> Option<&RoutedEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn container(&self, id: &str) -> Option<&PositionedContainer> {
        self.containers.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrouted_edge_keeps_identity() {
        let edge = RoutedEdge::unrouted(EdgeAst::new("a", "ghost"));
        assert_eq!(edge.id, "a-ghost");
        assert!(!edge.is_routed());
    }

    #[test]
    fn test_positioned_node_center() {
        let node = PositionedNode::new(
            NodeAst::new("a", "rectangle"),
            Bounds::new_from_top_left(Point::new(10.0, 10.0), Size::new(100.0, 50.0)),
        );
        assert_eq!(node.center(), Point::new(60.0, 35.0));
        assert_eq!(node.id(), "a");
    }
}
