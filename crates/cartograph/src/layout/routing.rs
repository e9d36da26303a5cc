//! Edge routing.
//!
//! Routes are computed after every box has its absolute position. The style
//! depends on the scope the edge was lifted to:
//!
//! - hierarchical scopes get orthogonal elbows between boundary anchors,
//! - force scopes get one straight segment between boundary anchors,
//! - circular scopes get a quadratic arc that bulges away from the orbit
//!   center.
//!
//! An edge whose endpoint does not exist is kept with no points and a warning.

use std::{
    collections::HashMap,
    f32::consts::{PI, TAU},
};

use log::warn;

use cartograph_core::{
    ast::{DiagramAst, EdgeAst, LayoutAlgorithm},
    geometry::{Bounds, Point},
    layout::{DEFAULT_ARC_STROKE_WIDTH, PathKind, RoutedEdge},
    shape::{Anchor, CARDINAL_ANCHORS, ShapeRegistry},
};

use super::{
    scope::{DiagramStructure, Element},
    sizing::node_anchors,
};
use crate::structure::ContainmentScope;

/// Control points of circular arcs sit this much further out than the
/// outermost endpoint.
const ARC_BULGE: f32 = 1.08;

/// How far a self-loop sticks out of its node.
const LOOP_REACH: f32 = 24.0;

/// How a scope was placed, as far as routing cares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeFrame {
    pub algorithm: LayoutAlgorithm,
    /// Absolute orbit center of circular scopes.
    pub orbit_center: Option<Point>,
}

/// Absolute boxes of everything that was placed.
#[derive(Debug)]
pub struct Placed<'p> {
    pub nodes: &'p [Bounds],
    pub containers: &'p [Bounds],
    pub frames: &'p HashMap<ContainmentScope, ScopeFrame>,
}

impl Placed<'_> {
    fn bounds(&self, element: Element) -> Option<Bounds> {
        match element {
            Element::Node(idx) => self.nodes.get(idx).copied(),
            Element::Container(idx) => self.containers.get(idx).copied(),
        }
    }

    fn frame(&self, scope: ContainmentScope) -> ScopeFrame {
        self.frames.get(&scope).copied().unwrap_or(ScopeFrame {
            algorithm: LayoutAlgorithm::default(),
            orbit_center: None,
        })
    }
}

/// Routes every edge of the diagram, in declaration order.
pub fn route_edges(
    structure: &DiagramStructure<'_>,
    placed: &Placed<'_>,
    shapes: &ShapeRegistry,
) -> (Vec<RoutedEdge>, Vec<String>) {
    let diagram = structure.diagram();
    let mut warnings = Vec::new();
    let edges = diagram
        .edges
        .iter()
        .map(|edge| match route_edge(edge, structure, placed, shapes) {
            Ok(routed) => routed,
            Err(missing) => {
                let message = format!(
                    "Edge `{}` references unknown element `{missing}` and was not routed",
                    edge.edge_id()
                );
                warn!(edge = edge.edge_id().as_str(), missing = missing; "Edge endpoint not found");
                warnings.push(message);
                RoutedEdge::unrouted(edge.clone())
            }
        })
        .collect();
    (edges, warnings)
}

/// Routes one edge, or returns the id of the endpoint that does not exist.
fn route_edge<'e>(
    edge: &'e EdgeAst,
    structure: &DiagramStructure<'_>,
    placed: &Placed<'_>,
    shapes: &ShapeRegistry,
) -> Result<RoutedEdge, &'e str> {
    let source = structure.resolve(&edge.from).ok_or(edge.from.as_str())?;
    let target = structure.resolve(&edge.to).ok_or(edge.to.as_str())?;
    let source_box = placed.bounds(source).ok_or(edge.from.as_str())?;
    let target_box = placed.bounds(target).ok_or(edge.to.as_str())?;

    let mut routed = RoutedEdge::unrouted(edge.clone());
    routed.stroke_width = stroke_width(edge);

    if source == target {
        routed.points = self_loop(source_box);
        routed.path = PathKind::Orthogonal;
        return Ok(routed);
    }

    let lifted = structure.lift_elements(source, target);
    let scope = lifted.map_or_else(|| structure.scope_of(source), |l| l.scope);
    let frame = placed.frame(scope);

    let source_anchors = anchors(structure.diagram(), source, shapes);
    let target_anchors = anchors(structure.diagram(), target, shapes);

    match (frame.algorithm, frame.orbit_center, lifted) {
        (LayoutAlgorithm::Circular, Some(center), Some(lifted)) => {
            // Endpoints stay on the orbit of the member that was placed.
            let source_orbit = placed
                .bounds(lifted.source)
                .map_or(0.0, |b| b.center().distance(center));
            let target_orbit = placed
                .bounds(lifted.target)
                .map_or(0.0, |b| b.center().distance(center));
            routed.points = arc(
                center,
                (source_box.center(), source_orbit),
                (target_box.center(), target_orbit),
            );
            routed.path = PathKind::Arc;
            routed.stroke_width = Some(routed.stroke_width.unwrap_or(DEFAULT_ARC_STROKE_WIDTH));
        }
        (LayoutAlgorithm::Force, ..) | (LayoutAlgorithm::Circular, ..) => {
            let start = nearest_anchor(source_box, source_anchors, target_box.center());
            let end = nearest_anchor(target_box, target_anchors, source_box.center());
            routed.points = vec![start.position(source_box), end.position(target_box)];
            routed.path = PathKind::Polyline;
        }
        (LayoutAlgorithm::Hierarchical, ..) => {
            let start = nearest_anchor(source_box, source_anchors, target_box.center());
            let end = nearest_anchor(target_box, target_anchors, source_box.center());
            routed.points = elbow(start, source_box, end.position(target_box));
            routed.path = PathKind::Orthogonal;
        }
    }

    Ok(routed)
}

fn stroke_width(edge: &EdgeAst) -> Option<f32> {
    edge.data
        .get("stroke_width")
        .and_then(|value| value.as_number())
        .filter(|w| w.is_finite() && *w > 0.0)
}

fn anchors<'s>(diagram: &DiagramAst, element: Element, shapes: &'s ShapeRegistry) -> &'s [Anchor] {
    match element {
        Element::Node(idx) => diagram
            .nodes
            .get(idx)
            .map_or(&CARDINAL_ANCHORS[..], |node| node_anchors(node, shapes)),
        Element::Container(_) => &CARDINAL_ANCHORS,
    }
}

/// The anchor of `bounds` closest to `toward`.
fn nearest_anchor<'a>(bounds: Bounds, anchors: &'a [Anchor], toward: Point) -> &'a Anchor {
    anchors
        .iter()
        .min_by(|a, b| {
            let da = a.position(bounds).distance(toward);
            let db = b.position(bounds).distance(toward);
            da.total_cmp(&db)
        })
        .unwrap_or(&CARDINAL_ANCHORS[0])
}

/// Axis-aligned route from `start` to `end`, leaving the source along the
/// anchor's outward direction and turning halfway.
fn elbow(start: &Anchor, source: Bounds, end: Point) -> Vec<Point> {
    let from = start.position(source);
    let outward = start.outward();
    let points = if outward.y().abs() >= outward.x().abs() {
        let mid = (from.y() + end.y()) / 2.0;
        [from, from.with_y(mid), end.with_y(mid), end]
    } else {
        let mid = (from.x() + end.x()) / 2.0;
        [from, from.with_x(mid), end.with_x(mid), end]
    };

    let mut route: Vec<Point> = Vec::with_capacity(4);
    for point in points {
        if route.last() != Some(&point) {
            route.push(point);
        }
    }
    if route.len() < 2 {
        route = vec![from, end];
    }
    route
}

/// A small rectangle leaving and re-entering the east side of `bounds`.
fn self_loop(bounds: Bounds) -> Vec<Point> {
    let center = bounds.center();
    let half = bounds.height() / 4.0;
    let out = bounds.max_x() + LOOP_REACH;
    vec![
        Point::new(bounds.max_x(), center.y() - half),
        Point::new(out, center.y() - half),
        Point::new(out, center.y() + half),
        Point::new(bounds.max_x(), center.y() + half),
    ]
}

/// Normalizes an angle difference into `(-π, π]`.
fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

/// `[start, control, end]` of an arc around `center`.
///
/// Each endpoint lies on the ray from `center` through the element, at the
/// given orbit radius. The control point takes the shorter way around.
fn arc(center: Point, source: (Point, f32), target: (Point, f32)) -> Vec<Point> {
    let (source_point, source_orbit) = source;
    let (target_point, target_orbit) = target;
    let source_angle = source_point.sub_point(center).angle();
    let target_angle = target_point.sub_point(center).angle();

    let start = Point::from_polar(center, source_orbit, source_angle);
    let end = Point::from_polar(center, target_orbit, target_angle);
    let sweep = normalize_angle(target_angle - source_angle);
    let control = Point::from_polar(
        center,
        ARC_BULGE * source_orbit.max(target_orbit),
        source_angle + sweep / 2.0,
    );
    vec![start, control, end]
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use cartograph_core::geometry::Size;
    use float_cmp::approx_eq;

    use super::*;

    fn square(x: f32, y: f32) -> Bounds {
        Bounds::new_from_center(Point::new(x, y), Size::new(40.0, 40.0))
    }

    #[test]
    fn test_normalize_angle() {
        assert!(approx_eq!(f32, normalize_angle(1.5 * PI), -0.5 * PI, epsilon = 1e-5));
        assert!(approx_eq!(f32, normalize_angle(-1.5 * PI), 0.5 * PI, epsilon = 1e-5));
        assert!(approx_eq!(f32, normalize_angle(PI), PI, epsilon = 1e-5));
        assert!(approx_eq!(f32, normalize_angle(-PI), PI, epsilon = 1e-5));
        assert!(approx_eq!(f32, normalize_angle(0.25), 0.25, epsilon = 1e-6));
    }

    #[test]
    fn test_arc_takes_shorter_path() {
        let center = Point::default();
        // 350° and 10°: the short way crosses 0°.
        let source = Point::from_polar(center, 100.0, 350f32.to_radians());
        let target = Point::from_polar(center, 100.0, 10f32.to_radians());
        let points = arc(center, (source, 100.0), (target, 100.0));
        assert_eq!(points.len(), 3);

        let control = points[1];
        assert!(approx_eq!(f32, control.hypot(), 108.0, epsilon = 1e-3));
        assert!(approx_eq!(f32, control.angle(), 0.0, epsilon = 1e-4));
    }

    #[test]
    fn test_arc_endpoints_keep_own_orbit() {
        let center = Point::new(200.0, 200.0);
        let source = Point::from_polar(center, 150.0, 0.0);
        let target = Point::from_polar(center, 300.0, FRAC_PI_2);
        let points = arc(center, (source, 150.0), (target, 300.0));
        assert!(approx_eq!(f32, points[0].distance(center), 150.0, epsilon = 1e-3));
        assert!(approx_eq!(f32, points[2].distance(center), 300.0, epsilon = 1e-3));
        assert!(approx_eq!(f32, points[1].distance(center), 324.0, epsilon = 1e-2));
    }

    #[test]
    fn test_nearest_anchor_faces_target() {
        let source = square(0.0, 0.0);
        assert_eq!(
            nearest_anchor(source, &CARDINAL_ANCHORS, Point::new(200.0, 0.0)).name(),
            "east"
        );
        assert_eq!(
            nearest_anchor(source, &CARDINAL_ANCHORS, Point::new(0.0, 300.0)).name(),
            "south"
        );
        assert_eq!(nearest_anchor(source, &[], Point::default()).name(), "north");
    }

    #[test]
    fn test_elbow_is_axis_aligned() {
        let source = square(0.0, 0.0);
        let south = &CARDINAL_ANCHORS[2];
        let route = elbow(south, source, Point::new(100.0, 200.0));
        assert_eq!(route.first(), Some(&Point::new(0.0, 20.0)));
        assert_eq!(route.last(), Some(&Point::new(100.0, 200.0)));
        for pair in route.windows(2) {
            assert!(pair[0].x() == pair[1].x() || pair[0].y() == pair[1].y());
        }
    }

    #[test]
    fn test_elbow_straight_line_collapses() {
        let source = square(0.0, 0.0);
        let south = &CARDINAL_ANCHORS[2];
        let route = elbow(south, source, Point::new(0.0, 200.0));
        assert!(route.len() >= 2);
        assert!(route.iter().all(|p| p.x() == 0.0));
    }

    #[test]
    fn test_self_loop_leaves_and_returns() {
        let bounds = square(0.0, 0.0);
        let points = self_loop(bounds);
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].x(), bounds.max_x());
        assert_eq!(points[3].x(), bounds.max_x());
        assert!(points[1].x() > bounds.max_x());
    }
}
