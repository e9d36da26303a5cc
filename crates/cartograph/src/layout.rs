//! Layout engine for positioning diagram elements.
//!
//! This module turns a [`DiagramAst`] into a [`LaidOutDiagram`]: every node
//! gets a box, every container gets a box around its members and every edge
//! gets a route.
//!
//! # Pipeline Position
//!
//! ```text
//! DiagramAst
//!     ↓ structure (scopes, lifted edges)
//! DiagramStructure
//!     ↓ placement (this module, bottom-up per scope)
//! local scope layouts
//!     ↓ composition (top-down) + routing
//! LaidOutDiagram
//! ```
//!
//! Each containment scope (the canvas or the inside of one container) is
//! placed on its own by the engine its `algorithm` selects. Nested
//! containers are placed first so their parents can treat them as sized
//! boxes. Positions are then composed into absolute canvas coordinates.
//!
//! Layout is a pure function of the diagram and the engine configuration; an
//! [`LayoutEngine`] can be reused across calls.

mod engines;
mod routing;
mod scope;
mod sizing;

use std::{collections::HashMap, iter};

use log::{debug, info, warn};

use cartograph_core::{
    ast::{DiagramAst, Direction, LayoutAlgorithm, NodeAst},
    geometry::{Bounds, Insets, Point, Size},
    layout::{LaidOutDiagram, PositionedContainer, PositionedNode},
    shape::ShapeRegistry,
    text::{ApproximateTextMeasure, DEFAULT_FONT_SIZE, TextMeasure},
};

pub use engines::{CircularOptions, ForceOptions, circle_radius};
pub use sizing::node_size;

use crate::{
    budget::Budget,
    error::CartographError,
    structure::{ContainerArena, ContainmentScope},
};
use engines::{Engines, Placement, ScopeEdge, ScopeGraph};
use routing::{Placed, ScopeFrame};
use scope::{DiagramStructure, Element, LiftedEdge};

/// Gap between neighbouring boxes when none is configured.
pub const DEFAULT_SPACING: f32 = 50.0;

/// Space between a container's outline and its members.
pub const DEFAULT_PADDING: f32 = 20.0;

/// Caller-side layout settings.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Overrides the diagram's own direction when set.
    pub direction: Option<Direction>,
    pub spacing: f32,
    /// Used when neither the diagram nor a container picks an algorithm.
    pub algorithm: Option<LayoutAlgorithm>,
    pub padding: f32,
    pub circular: CircularOptions,
    pub force: ForceOptions,
    pub budget: Budget,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: None,
            spacing: DEFAULT_SPACING,
            algorithm: None,
            padding: DEFAULT_PADDING,
            circular: CircularOptions::default(),
            force: ForceOptions::default(),
            budget: Budget::unlimited(),
        }
    }
}

/// Collaborators the layout engine borrows for one call.
#[derive(Clone, Copy)]
pub struct LayoutContext<'c> {
    pub shapes: &'c ShapeRegistry,
    pub measure: &'c dyn TextMeasure,
}

/// Result of one layout call.
#[derive(Debug, Clone)]
pub struct LayoutOutcome {
    pub diagram: LaidOutDiagram,
    /// Problems that did not stop layout, e.g. edges with unknown endpoints.
    pub warnings: Vec<String>,
    /// `false` when the budget ran out and the result is best effort.
    pub complete: bool,
}

/// One scope placed in its own coordinates, top-left at the origin.
#[derive(Debug)]
struct ScopeLayout {
    members: Vec<Element>,
    boxes: Vec<Bounds>,
    size: Size,
    algorithm: LayoutAlgorithm,
    orbit_center: Option<Point>,
}

/// Configured layout engine.
#[derive(Debug)]
pub struct LayoutEngine {
    options: LayoutOptions,
    engines: Engines,
}

impl LayoutEngine {
    pub fn new(mut options: LayoutOptions) -> Self {
        options.spacing = non_negative(options.spacing, DEFAULT_SPACING);
        options.padding = non_negative(options.padding, DEFAULT_PADDING);
        let engines = Engines::new(options.spacing, options.circular, options.force);
        Self { options, engines }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Lays out `diagram`.
    ///
    /// Every node in `diagram.nodes` gets exactly one positioned entry and
    /// all coordinates are finite. Edges whose endpoints do not exist are
    /// returned without points and reported in `warnings`.
    ///
    /// # Errors
    ///
    /// Returns `CartographError::Layout` when a placement engine fails. No
    /// partial result is returned in that case.
    pub fn layout(
        &self,
        diagram: &DiagramAst,
        context: &LayoutContext<'_>,
    ) -> Result<LayoutOutcome, CartographError> {
        let structure = DiagramStructure::new(diagram);
        let arena = structure.arena();

        let node_sizes: Vec<Size> = diagram
            .nodes
            .iter()
            .map(|node| sizing::node_size(node, context.shapes, context.measure))
            .collect();
        let lifted: Vec<Option<LiftedEdge>> = diagram
            .edges
            .iter()
            .map(|edge| structure.lift(&edge.from, &edge.to))
            .collect();

        let mut meter = self.options.budget.meter();
        let mut complete = true;
        let mut warnings = Vec::new();
        let mut container_sizes = vec![Size::default(); arena.len()];
        let mut scopes: HashMap<ContainmentScope, ScopeLayout> = HashMap::new();

        for scope in structure.layout_order() {
            let members = structure.members(scope);
            let (algorithm, direction) = self.scope_settings(diagram, arena, scope);
            let graph = ScopeGraph {
                sizes: members
                    .iter()
                    .map(|&member| match member {
                        Element::Node(idx) => node_sizes[idx],
                        Element::Container(idx) => container_sizes[idx],
                    })
                    .collect(),
                edges: scope_edges(diagram, &lifted, scope, &members),
                orbits: members
                    .iter()
                    .map(|&member| match member {
                        Element::Node(idx) => orbit_radius(&diagram.nodes[idx]),
                        Element::Container(_) => None,
                    })
                    .collect(),
                direction,
            };

            let algorithm_name: &'static str = algorithm.into();
            debug!(
                scope = scope_name(arena, scope),
                members = graph.len(),
                edges = graph.edges.len(),
                algorithm = algorithm_name;
                "Placing scope"
            );
            let placement = self.engines.get(algorithm).place(&graph, &mut meter)?;
            if placement.centers.len() != members.len() {
                return Err(CartographError::Layout(format!(
                    "{algorithm} placement returned {} positions for {} members of `{}`",
                    placement.centers.len(),
                    members.len(),
                    scope_name(arena, scope)
                )));
            }
            complete &= placement.complete;

            let label = match scope {
                ContainmentScope::Root => None,
                ContainmentScope::Container(idx) => arena
                    .get(idx)
                    .and_then(|entry| entry.decl().label.as_deref())
                    .map(|label| finite_size(context.measure.measure(label, DEFAULT_FONT_SIZE))),
            };

            let layout = self.frame_scope(
                &structure,
                members,
                &graph,
                placement,
                label,
                algorithm,
                &mut warnings,
            );
            if let ContainmentScope::Container(idx) = scope {
                container_sizes[idx] = layout.size;
            }
            scopes.insert(scope, layout);
        }

        let (node_bounds, container_bounds, frames) = compose(arena, &scopes, diagram.nodes.len());

        let (edges, route_warnings) = routing::route_edges(
            &structure,
            &Placed {
                nodes: &node_bounds,
                containers: &container_bounds,
                frames: &frames,
            },
            context.shapes,
        );
        warnings.extend(route_warnings);

        let nodes: Vec<PositionedNode> = diagram
            .nodes
            .iter()
            .zip(&node_bounds)
            .map(|(node, bounds)| PositionedNode::new(node.clone(), *bounds))
            .collect();
        let containers = arena
            .iter()
            .map(|(idx, entry)| {
                let bounds = container_bounds[idx];
                PositionedContainer {
                    id: entry.key().to_string(),
                    label: entry.decl().label.clone(),
                    depth: entry.level(),
                    x: bounds.min_x(),
                    y: bounds.min_y(),
                    width: bounds.width(),
                    height: bounds.height(),
                }
            })
            .collect();
        let size = scopes
            .get(&ContainmentScope::Root)
            .map_or_else(Size::default, |root| root.size);

        let laid_out = LaidOutDiagram {
            nodes,
            edges,
            containers,
            size,
        };
        ensure_finite(&laid_out)?;

        if !complete {
            warn!(diagram = diagram.name.as_deref().unwrap_or("<unnamed>"); "Layout budget exhausted, returning best-effort result");
        }
        info!(
            nodes = laid_out.nodes.len(),
            edges = laid_out.edges.len(),
            containers = laid_out.containers.len(),
            complete = complete;
            "Layout finished"
        );

        Ok(LayoutOutcome {
            diagram: laid_out,
            warnings,
            complete,
        })
    }

    /// Algorithm and direction for one scope.
    ///
    /// A container inherits from the closest enclosing container that sets a
    /// value, then from the diagram. The caller's direction overrides the
    /// diagram's; the caller's algorithm only applies when the diagram has
    /// none.
    fn scope_settings(
        &self,
        diagram: &DiagramAst,
        arena: &ContainerArena<'_>,
        scope: ContainmentScope,
    ) -> (LayoutAlgorithm, Direction) {
        let mut algorithm = None;
        let mut direction = None;
        let mut current = match scope {
            ContainmentScope::Root => None,
            ContainmentScope::Container(idx) => Some(idx),
        };
        while let Some(idx) = current {
            let Some(entry) = arena.get(idx) else {
                break;
            };
            algorithm = algorithm.or(entry.decl().algorithm);
            direction = direction.or(entry.decl().direction);
            current = entry.parent();
        }

        (
            algorithm
                .or(diagram.algorithm)
                .or(self.options.algorithm)
                .unwrap_or_default(),
            direction
                .or(self.options.direction)
                .unwrap_or(diagram.direction),
        )
    }

    /// Moves a placement into the scope's own frame: every box at least
    /// `padding` from the edges, with room for the label on top.
    #[allow(clippy::too_many_arguments)]
    fn frame_scope(
        &self,
        structure: &DiagramStructure<'_>,
        members: Vec<Element>,
        graph: &ScopeGraph,
        placement: Placement,
        label: Option<Size>,
        algorithm: LayoutAlgorithm,
        warnings: &mut Vec<String>,
    ) -> ScopeLayout {
        let padding = self.options.padding;
        warnings.extend(placement.warnings);

        let boxes: Vec<Bounds> = placement
            .centers
            .iter()
            .zip(&graph.sizes)
            .zip(&members)
            .map(|((&center, &size), &member)| {
                let center = if center.is_finite() {
                    center
                } else {
                    let name = element_name(structure, member);
                    warn!(element = name; "Placement produced a non-finite position");
                    warnings.push(format!("Position of `{name}` was not finite and has been reset"));
                    Point::default()
                };
                Bounds::new_from_center(center, size)
            })
            .collect();

        let header = label.map_or(0.0, |label| label.height() + padding / 2.0);
        let insets = Insets::uniform(padding).with_top(padding + header);
        let content = boxes.iter().copied().reduce(|acc, b| acc.merge(&b));
        let offset = match content {
            Some(content) => Point::new(
                insets.left() - content.min_x(),
                insets.top() - content.min_y(),
            ),
            None => Point::new(insets.left(), insets.top()),
        };

        let mut size = content
            .map_or_else(Size::default, Bounds::to_size)
            .add_padding(insets);
        if let Some(label) = label {
            size = size.max(Size::new(label.width() + insets.horizontal_sum(), 0.0));
        }

        let orbit_center = placement
            .orbit_center
            .filter(|center| center.is_finite())
            .map(|center| center.add_point(offset));

        ScopeLayout {
            members,
            boxes: boxes.into_iter().map(|b| b.translate(offset)).collect(),
            size,
            algorithm,
            orbit_center,
        }
    }
}

/// Builder for a [`LayoutEngine`].
#[derive(Debug, Default)]
pub struct EngineBuilder {
    options: LayoutOptions,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of options.
    pub fn from_options(options: LayoutOptions) -> Self {
        Self { options }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.options.direction = Some(direction);
        self
    }

    /// Set the gap between neighbouring boxes
    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.options.spacing = spacing;
        self
    }

    pub fn with_algorithm(mut self, algorithm: LayoutAlgorithm) -> Self {
        self.options.algorithm = Some(algorithm);
        self
    }

    /// Set the padding inside containers and around the canvas
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.options.padding = padding;
        self
    }

    pub fn with_circular(mut self, circular: CircularOptions) -> Self {
        self.options.circular = circular;
        self
    }

    pub fn with_force(mut self, force: ForceOptions) -> Self {
        self.options.force = force;
        self
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.options.budget = budget;
        self
    }

    pub fn build(self) -> LayoutEngine {
        LayoutEngine::new(self.options)
    }
}

/// Lays out `diagram` with the built-in shapes and approximate text metrics.
///
/// # Errors
///
/// See [`LayoutEngine::layout`].
pub fn layout(diagram: &DiagramAst, options: &LayoutOptions) -> Result<LayoutOutcome, CartographError> {
    let shapes = ShapeRegistry::with_builtins();
    let measure = ApproximateTextMeasure::default();
    LayoutEngine::new(options.clone()).layout(
        diagram,
        &LayoutContext {
            shapes: &shapes,
            measure: &measure,
        },
    )
}

/// Edges lifted to `scope`, as indices into `members`.
fn scope_edges(
    diagram: &DiagramAst,
    lifted: &[Option<LiftedEdge>],
    scope: ContainmentScope,
    members: &[Element],
) -> Vec<ScopeEdge> {
    let position: HashMap<Element, usize> = members
        .iter()
        .enumerate()
        .map(|(idx, &member)| (member, idx))
        .collect();

    diagram
        .edges
        .iter()
        .zip(lifted)
        .filter_map(|(edge, lifted)| {
            let lifted = lifted.as_ref().filter(|l| l.scope == scope)?;
            Some(ScopeEdge {
                source: *position.get(&lifted.source)?,
                target: *position.get(&lifted.target)?,
                weight: edge.effective_weight(),
            })
        })
        .collect()
}

/// Absolute boxes of every node and container plus the routing frame of
/// every scope. Parents come before their nested containers in the arena, so
/// one pass in arena order sees every container's origin before its members.
fn compose(
    arena: &ContainerArena<'_>,
    scopes: &HashMap<ContainmentScope, ScopeLayout>,
    node_count: usize,
) -> (Vec<Bounds>, Vec<Bounds>, HashMap<ContainmentScope, ScopeFrame>) {
    let mut node_bounds = vec![Bounds::default(); node_count];
    let mut container_bounds = vec![Bounds::default(); arena.len()];
    let mut frames = HashMap::with_capacity(scopes.len());

    let order = iter::once(ContainmentScope::Root)
        .chain((0..arena.len()).map(ContainmentScope::Container));
    for scope in order {
        let Some(layout) = scopes.get(&scope) else {
            continue;
        };
        let origin = match scope {
            ContainmentScope::Root => Point::default(),
            ContainmentScope::Container(idx) => container_bounds[idx].min_point(),
        };
        for (&member, local) in layout.members.iter().zip(&layout.boxes) {
            let absolute = local.translate(origin);
            match member {
                Element::Node(idx) => node_bounds[idx] = absolute,
                Element::Container(idx) => container_bounds[idx] = absolute,
            }
        }
        frames.insert(
            scope,
            ScopeFrame {
                algorithm: layout.algorithm,
                orbit_center: layout.orbit_center.map(|center| center.add_point(origin)),
            },
        );
    }

    (node_bounds, container_bounds, frames)
}

/// Orbit radius a node requests with `radius` data.
fn orbit_radius(node: &NodeAst) -> Option<f32> {
    node.data
        .get("radius")
        .and_then(|value| value.as_number())
        .filter(|r| r.is_finite() && *r >= 0.0)
}

fn element_name<'a>(structure: &'a DiagramStructure<'_>, element: Element) -> &'a str {
    match element {
        Element::Node(idx) => structure
            .diagram()
            .nodes
            .get(idx)
            .map_or("<node>", |node| node.id.as_str()),
        Element::Container(idx) => structure
            .arena()
            .get(idx)
            .map_or("<container>", |entry| entry.key()),
    }
}

fn scope_name<'a>(arena: &'a ContainerArena<'_>, scope: ContainmentScope) -> &'a str {
    match scope {
        ContainmentScope::Root => "<canvas>",
        ContainmentScope::Container(idx) => arena.get(idx).map_or("<container>", |entry| entry.key()),
    }
}

fn non_negative(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        fallback
    }
}

fn finite_size(size: Size) -> Size {
    Size::new(non_negative(size.width(), 0.0), non_negative(size.height(), 0.0))
}

fn bounds_are_finite(bounds: Bounds) -> bool {
    bounds.min_point().is_finite() && Point::new(bounds.max_x(), bounds.max_y()).is_finite()
}

fn ensure_finite(diagram: &LaidOutDiagram) -> Result<(), CartographError> {
    if let Some(node) = diagram.nodes.iter().find(|n| !bounds_are_finite(n.bounds())) {
        return Err(CartographError::Layout(format!(
            "node `{}` ended up with a non-finite position",
            node.id()
        )));
    }
    if let Some(edge) = diagram
        .edges
        .iter()
        .find(|e| !e.points.iter().all(|p| p.is_finite()))
    {
        return Err(CartographError::Layout(format!(
            "edge `{}` ended up with a non-finite route",
            edge.id
        )));
    }
    if !(diagram.size.width().is_finite() && diagram.size.height().is_finite()) {
        return Err(CartographError::Layout("canvas size is not finite".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use cartograph_core::{
        ast::{ContainerDeclaration, DataValue, EdgeAst},
        layout::PathKind,
    };
    use float_cmp::approx_eq;

    use super::*;

    fn nodes(ids: &[&str]) -> Vec<NodeAst> {
        ids.iter().map(|id| NodeAst::new(*id, "rectangle")).collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<EdgeAst> {
        pairs.iter().map(|(a, b)| EdgeAst::new(*a, *b)).collect()
    }

    fn run(diagram: &DiagramAst) -> LayoutOutcome {
        layout(diagram, &LayoutOptions::default()).expect("layout succeeds")
    }

    fn overlaps(a: Bounds, b: Bounds) -> bool {
        a.min_x() < b.max_x() && b.min_x() < a.max_x() && a.min_y() < b.max_y() && b.min_y() < a.max_y()
    }

    #[test]
    fn test_empty_diagram() {
        let outcome = run(&DiagramAst::default());
        assert!(outcome.diagram.nodes.is_empty());
        assert!(outcome.diagram.edges.is_empty());
        assert!(outcome.complete);
        assert!(outcome.diagram.size.width().is_finite());
    }

    #[test]
    fn test_single_node_respects_padding() {
        let outcome = run(&DiagramAst::from_parts(nodes(&["a"]), vec![]));
        let node = &outcome.diagram.nodes[0];
        assert!(approx_eq!(f32, node.x, DEFAULT_PADDING, epsilon = 1e-3));
        assert!(approx_eq!(f32, node.y, DEFAULT_PADDING, epsilon = 1e-3));
        assert!(approx_eq!(
            f32,
            outcome.diagram.size.width(),
            node.width + 2.0 * DEFAULT_PADDING,
            epsilon = 1e-3
        ));
    }

    #[test]
    fn test_every_node_positioned_once() {
        let diagram = DiagramAst::from_parts(
            nodes(&["a", "b", "c", "lonely"]),
            edges(&[("a", "b"), ("b", "c"), ("c", "c")]),
        );
        let outcome = run(&diagram);
        let ids: Vec<_> = outcome.diagram.nodes.iter().map(|n| n.id()).collect();
        assert_eq!(ids, ["a", "b", "c", "lonely"]);
        for (i, a) in outcome.diagram.nodes.iter().enumerate() {
            for b in &outcome.diagram.nodes[i + 1..] {
                assert!(!overlaps(a.bounds(), b.bounds()), "{} overlaps {}", a.id(), b.id());
            }
        }
    }

    #[test]
    fn test_hierarchical_edges_are_orthogonal() {
        let diagram = DiagramAst::from_parts(nodes(&["a", "b"]), edges(&[("a", "b")]));
        let outcome = run(&diagram);
        let edge = &outcome.diagram.edges[0];
        assert_eq!(edge.id, "a-b");
        assert_eq!(edge.path, PathKind::Orthogonal);
        assert!(edge.points.len() >= 2);

        let a = outcome.diagram.node("a").expect("a placed").bounds();
        let b = outcome.diagram.node("b").expect("b placed").bounds();
        // Routes start and end on the boundary, never at the center.
        assert_ne!(edge.points[0], a.center());
        assert!(approx_eq!(f32, edge.points[0].y(), a.max_y(), epsilon = 1e-3));
        let end = edge.points.last().expect("route has an end");
        assert!(approx_eq!(f32, end.y(), b.min_y(), epsilon = 1e-3));
    }

    #[test]
    fn test_missing_endpoint_is_reported() {
        let diagram = DiagramAst::from_parts(nodes(&["a"]), edges(&[("a", "ghost")]));
        let outcome = run(&diagram);
        assert!(outcome.diagram.edges[0].points.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("ghost"));
    }

    #[test]
    fn test_circular_edges_are_arcs() {
        let mut diagram = DiagramAst::from_parts(
            nodes(&["a", "b", "c", "d"]),
            edges(&[("a", "b"), ("b", "c")]),
        );
        diagram.algorithm = Some(LayoutAlgorithm::Circular);
        diagram.edges[1]
            .data
            .insert("stroke_width".to_string(), DataValue::Number(4.0));
        let outcome = run(&diagram);

        let first = &outcome.diagram.edges[0];
        assert_eq!(first.path, PathKind::Arc);
        assert_eq!(first.points.len(), 3);
        assert_eq!(first.stroke_width, Some(2.0));
        assert_eq!(outcome.diagram.edges[1].stroke_width, Some(4.0));

        // All nodes share one orbit.
        let centers: Vec<Point> = outcome.diagram.nodes.iter().map(|n| n.center()).collect();
        let middle = centers
            .iter()
            .fold(Point::default(), |acc, c| acc.add_point(*c))
            .scale(1.0 / centers.len() as f32);
        let radius = centers[0].distance(middle);
        for center in &centers {
            assert!(approx_eq!(f32, center.distance(middle), radius, epsilon = 1e-2));
        }
        // Arc endpoints sit on the orbit.
        assert!(approx_eq!(f32, first.points[0].distance(middle), radius, epsilon = 1e-2));
        assert!(first.points[1].distance(middle) > radius);
    }

    #[test]
    fn test_nested_containers_enclose_members() {
        let mut diagram = DiagramAst::from_parts(
            nodes(&["a", "b", "c", "d"]),
            edges(&[("a", "b"), ("b", "c"), ("d", "c")]),
        );
        let mut outer = ContainerDeclaration::new("outer")
            .with_children(["b"])
            .with_containers(vec![ContainerDeclaration::new("inner").with_children(["c"])]);
        outer.label = Some("Outer".to_string());
        diagram.containers = vec![outer];
        let outcome = run(&diagram);
        let laid_out = &outcome.diagram;

        let outer = laid_out.container("outer").expect("outer placed");
        let inner = laid_out.container("inner").expect("inner placed");
        assert_eq!(outer.depth, 0);
        assert_eq!(inner.depth, 1);

        let outer_box = outer.bounds();
        let inner_box = inner.bounds();
        let contains = |outer: Bounds, inner: Bounds| {
            inner.min_x() >= outer.min_x()
                && inner.max_x() <= outer.max_x()
                && inner.min_y() >= outer.min_y()
                && inner.max_y() <= outer.max_y()
        };
        assert!(contains(outer_box, inner_box));
        let b = laid_out.node("b").expect("b placed").bounds();
        let c = laid_out.node("c").expect("c placed").bounds();
        assert!(contains(outer_box, b));
        assert!(contains(inner_box, c));
        // The label header keeps members below the top edge plus padding.
        assert!(b.min_y() > outer_box.min_y() + DEFAULT_PADDING);

        let a = laid_out.node("a").expect("a placed").bounds();
        assert!(!overlaps(a, outer_box));
        assert!(laid_out.edges.iter().all(|e| e.is_routed()));
    }

    #[test]
    fn test_container_algorithm_overrides_diagram() {
        let mut diagram = DiagramAst::from_parts(
            nodes(&["a", "b", "c", "x"]),
            edges(&[("a", "b"), ("b", "c"), ("x", "a")]),
        );
        let mut ring = ContainerDeclaration::new("ring").with_children(["a", "b", "c"]);
        ring.algorithm = Some(LayoutAlgorithm::Circular);
        diagram.containers = vec![ring];
        let outcome = run(&diagram);

        let edge = outcome.diagram.edge("a-b").expect("edge routed");
        assert_eq!(edge.path, PathKind::Arc);
        let lifted = outcome.diagram.edge("x-a").expect("edge routed");
        assert_eq!(lifted.path, PathKind::Orthogonal);
    }

    #[test]
    fn test_force_layout_is_deterministic() {
        let mut diagram = DiagramAst::from_parts(
            nodes(&["a", "b", "c", "d", "e"]),
            edges(&[("a", "b"), ("b", "c"), ("c", "a"), ("d", "e")]),
        );
        diagram.algorithm = Some(LayoutAlgorithm::Force);
        let first = run(&diagram);
        let second = run(&diagram);
        assert_eq!(first.diagram, second.diagram);
        assert!(first.diagram.edges.iter().all(|e| e.path == PathKind::Polyline));
    }

    #[test]
    fn test_exhausted_budget_is_incomplete() {
        let mut diagram = DiagramAst::from_parts(
            nodes(&["a", "b", "c"]),
            edges(&[("a", "b"), ("b", "c")]),
        );
        diagram.algorithm = Some(LayoutAlgorithm::Force);
        let engine = EngineBuilder::new()
            .with_budget(Budget::unlimited().with_max_iterations(1))
            .build();
        let shapes = ShapeRegistry::with_builtins();
        let measure = ApproximateTextMeasure::default();
        let outcome = engine
            .layout(
                &diagram,
                &LayoutContext {
                    shapes: &shapes,
                    measure: &measure,
                },
            )
            .expect("layout succeeds");
        assert!(!outcome.complete);
        assert_eq!(outcome.diagram.nodes.len(), 3);
        assert!(outcome.diagram.nodes.iter().all(|n| n.x.is_finite() && n.y.is_finite()));
    }

    #[test]
    fn test_direction_override() {
        let diagram = DiagramAst::from_parts(nodes(&["a", "b"]), edges(&[("a", "b")]));
        let options = LayoutOptions {
            direction: Some(Direction::LR),
            ..LayoutOptions::default()
        };
        let outcome = layout(&diagram, &options).expect("layout succeeds");
        let a = outcome.diagram.node("a").expect("a placed");
        let b = outcome.diagram.node("b").expect("b placed");
        assert!(b.x > a.x + a.width);
    }

    #[test]
    fn test_edge_to_container() {
        let mut diagram = DiagramAst::from_parts(nodes(&["a", "b"]), edges(&[("a", "group")]));
        diagram.containers = vec![ContainerDeclaration::new("group").with_children(["b"])];
        let outcome = run(&diagram);
        assert!(outcome.diagram.edges[0].is_routed());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_reused_engine_gives_same_result() {
        let diagram = DiagramAst::from_parts(nodes(&["a", "b"]), edges(&[("a", "b")]));
        let engine = EngineBuilder::new().with_spacing(30.0).build();
        let shapes = ShapeRegistry::with_builtins();
        let measure = ApproximateTextMeasure::default();
        let context = LayoutContext {
            shapes: &shapes,
            measure: &measure,
        };
        let first = engine.layout(&diagram, &context).expect("layout succeeds");
        let second = engine.layout(&diagram, &context).expect("layout succeeds");
        assert_eq!(first.diagram, second.diagram);
    }
}
