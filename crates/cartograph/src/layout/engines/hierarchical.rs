//! Layered layout for directed graphs.
//!
//! Layer assignment, crossing reduction and in-layer coordinates come from
//! `rust-sugiyama`. The solver only knows about connected nodes and returns
//! one layout per connected component, so every component is mapped back and
//! packed side by side; isolated members follow in the first layer. When the
//! solver fails (it panics on some inputs) the engine falls back to
//! longest-path layering.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    panic,
};

use log::{debug, warn};
use rust_sugiyama::configure::Config;

use cartograph_core::geometry::Point;

use super::{Placement, PlacementEngine, ScopeGraph};
use crate::{budget::Meter, error::CartographError};

/// Distance the solver keeps between neighbours of one layer, in solver units.
const VERTEX_SPACING: f64 = 2.0;

/// A member with its layer and preferred position across the layer.
#[derive(Debug, Clone, Copy)]
struct LayerItem {
    member: usize,
    rank: usize,
    desired: f32,
}

#[derive(Debug)]
pub struct Engine {
    /// Gap between layers and between neighbours within a layer.
    spacing: f32,
}

impl Engine {
    pub fn new() -> Self {
        Self { spacing: 50.0 }
    }

    pub fn set_spacing(&mut self, spacing: f32) -> &mut Self {
        self.spacing = spacing;
        self
    }

    /// `(across-layer, along-flow)` extent of a member.
    fn extent(graph: &ScopeGraph, member: usize) -> (f32, f32) {
        let size = graph.sizes[member];
        if graph.direction.is_horizontal() {
            (size.height(), size.width())
        } else {
            (size.width(), size.height())
        }
    }

    /// Converts solver output into layer items, one group per component.
    fn components_from_solver(
        &self,
        graph: &ScopeGraph,
        layouts: Vec<Vec<(usize, f64, f64)>>,
        edges: &[(u32, u32)],
    ) -> Vec<Vec<LayerItem>> {
        let max_across = (0..graph.len())
            .map(|member| Self::extent(graph, member).0)
            .fold(0.0_f32, f32::max);
        let unit = (max_across + self.spacing) / VERTEX_SPACING as f32;

        let mut seen = HashSet::new();
        let mut components = Vec::with_capacity(layouts.len());
        for coords in layouts {
            let mut levels: Vec<f64> = coords.iter().map(|&(_, _, y)| y).collect();
            levels.sort_by(f64::total_cmp);
            levels.dedup_by(|a, b| (*a - *b).abs() < 1e-6);

            let mut items: Vec<LayerItem> = Vec::with_capacity(coords.len());
            for (member, x, y) in coords {
                if member >= graph.len() || !seen.insert(member) {
                    debug!(member = member; "Ignoring unknown solver vertex");
                    continue;
                }
                let rank = levels
                    .iter()
                    .position(|level| (*level - y).abs() < 1e-6)
                    .unwrap_or(0);
                items.push(LayerItem {
                    member,
                    rank,
                    desired: x as f32 * unit,
                });
            }
            orient_flow(&mut items, edges);
            components.push(items);
        }
        components
    }

    /// Longest-path layering used when the solver is unavailable.
    fn components_from_longest_path(
        &self,
        graph: &ScopeGraph,
        edges: &[(u32, u32)],
    ) -> Vec<Vec<LayerItem>> {
        let connected: HashSet<usize> = edges
            .iter()
            .flat_map(|&(s, t)| [s as usize, t as usize])
            .collect();
        let ranks = longest_path_ranks(graph.len(), edges);

        let max_across = (0..graph.len())
            .map(|member| Self::extent(graph, member).0)
            .fold(0.0_f32, f32::max);
        let unit = max_across + self.spacing;

        let mut layers: HashMap<usize, Vec<usize>> = HashMap::new();
        for member in (0..graph.len()).filter(|m| connected.contains(m)) {
            layers.entry(ranks[member]).or_default().push(member);
        }
        let items = layers
            .into_iter()
            .flat_map(|(rank, members)| {
                let middle = (members.len() as f32 - 1.0) / 2.0;
                members
                    .into_iter()
                    .enumerate()
                    .map(move |(slot, member)| LayerItem {
                        member,
                        rank,
                        desired: (slot as f32 - middle) * unit,
                    })
            })
            .collect();
        vec![items]
    }

    /// Packs components side by side and converts layers to coordinates.
    fn arrange(&self, graph: &ScopeGraph, mut components: Vec<Vec<LayerItem>>) -> Vec<Point> {
        let placed: HashSet<usize> = components.iter().flatten().map(|item| item.member).collect();
        for member in (0..graph.len()).filter(|m| !placed.contains(m)) {
            components.push(vec![LayerItem {
                member,
                rank: 0,
                desired: 0.0,
            }]);
        }

        let layer_count = components
            .iter()
            .flatten()
            .map(|item| item.rank + 1)
            .max()
            .unwrap_or(0);
        let mut thickness = vec![0.0_f32; layer_count];
        for item in components.iter().flatten() {
            thickness[item.rank] = thickness[item.rank].max(Self::extent(graph, item.member).1);
        }
        let mut layer_center = Vec::with_capacity(layer_count);
        let mut cursor = 0.0;
        for t in &thickness {
            layer_center.push(cursor + t / 2.0);
            cursor += t + self.spacing;
        }

        let mut across = vec![0.0_f32; graph.len()];
        let mut along = vec![0.0_f32; graph.len()];
        let mut offset = 0.0;
        for component in &mut components {
            if component.is_empty() {
                continue;
            }
            component.sort_by(|a, b| a.rank.cmp(&b.rank).then(a.desired.total_cmp(&b.desired)));

            let mut low = f32::INFINITY;
            let mut high = f32::NEG_INFINITY;
            let mut previous: Option<(usize, f32)> = None;
            for item in component.iter() {
                let half = Self::extent(graph, item.member).0 / 2.0;
                let mut position = item.desired;
                // Neighbours in a layer never overlap.
                if let Some((rank, right)) = previous {
                    if rank == item.rank {
                        position = position.max(right + self.spacing + half);
                    }
                }
                across[item.member] = position;
                along[item.member] = layer_center[item.rank];
                previous = Some((item.rank, position + half));
                low = low.min(position - half);
                high = high.max(position + half);
            }

            let shift = offset - low;
            for item in component.iter() {
                across[item.member] += shift;
            }
            offset += (high - low) + self.spacing;
        }

        let reversed = graph.direction.is_reversed();
        let horizontal = graph.direction.is_horizontal();
        (0..graph.len())
            .map(|member| {
                let flow = if reversed { -along[member] } else { along[member] };
                if horizontal {
                    Point::new(flow, across[member])
                } else {
                    Point::new(across[member], flow)
                }
            })
            .collect()
    }
}

impl PlacementEngine for Engine {
    fn place(
        &self,
        graph: &ScopeGraph,
        meter: &mut Meter<'_>,
    ) -> Result<Placement, CartographError> {
        if graph.is_empty() {
            return Ok(Placement::new(Vec::new()));
        }

        let mut edges: Vec<(u32, u32)> = graph
            .edges
            .iter()
            .filter(|edge| edge.source != edge.target)
            .filter_map(|edge| {
                let source = u32::try_from(edge.source).ok()?;
                let target = u32::try_from(edge.target).ok()?;
                Some((source, target))
            })
            .collect();
        edges.sort_unstable();
        edges.dedup();

        let mut warnings = Vec::new();
        let mut complete = true;
        let components = if edges.is_empty() {
            debug!(members = graph.len(); "Scope has no edges, arranging in one layer");
            Vec::new()
        } else if !meter.tick() {
            complete = false;
            self.components_from_longest_path(graph, &edges)
        } else {
            debug!(members = graph.len(), edges = edges.len(); "Applying Sugiyama layering");
            match solve(&edges) {
                Ok(layouts) => self.components_from_solver(graph, layouts, &edges),
                Err(message) => {
                    warn!(reason = message.as_str(); "Falling back to longest-path layering");
                    warnings.push(format!("{message}; used longest-path layering instead"));
                    self.components_from_longest_path(graph, &edges)
                }
            }
        };

        let mut placement = Placement::new(self.arrange(graph, components));
        placement.complete = complete;
        placement.warnings = warnings;
        Ok(placement)
    }
}

/// Runs the solver, turning a panic into an error message.
fn solve(edges: &[(u32, u32)]) -> Result<Vec<Vec<(usize, f64, f64)>>, String> {
    let edges = edges.to_vec();
    let result = panic::catch_unwind(move || {
        let config = Config {
            minimum_length: 1,
            vertex_spacing: VERTEX_SPACING,
            ..Default::default()
        };
        rust_sugiyama::from_edges(&edges, &config)
            .into_iter()
            .map(|(coords, _, _)| {
                coords
                    .into_iter()
                    .map(|(id, (x, y))| (id, x, y))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
    });

    match result {
        Ok(layouts) if layouts.iter().any(|coords| !coords.is_empty()) => Ok(layouts),
        Ok(_) => Err("Rust-sugiyama returned empty layout results".to_string()),
        Err(err) => Err(match err.downcast_ref::<String>() {
            Some(panic_msg) => format!("Rust-sugiyama layout engine panicked: {panic_msg}"),
            None => match err.downcast_ref::<&str>() {
                Some(panic_msg) => format!("Rust-sugiyama layout engine panicked: {panic_msg}"),
                None => "Rust-sugiyama layout engine panicked with unknown error".to_string(),
            },
        }),
    }
}

/// Flips the ranks of a component when most edges point against the flow.
fn orient_flow(items: &mut [LayerItem], edges: &[(u32, u32)]) {
    let rank: HashMap<usize, usize> = items.iter().map(|item| (item.member, item.rank)).collect();
    let (mut forward, mut backward) = (0usize, 0usize);
    for &(s, t) in edges {
        if let (Some(rs), Some(rt)) = (rank.get(&(s as usize)), rank.get(&(t as usize))) {
            match rs.cmp(rt) {
                std::cmp::Ordering::Less => forward += 1,
                std::cmp::Ordering::Greater => backward += 1,
                std::cmp::Ordering::Equal => {}
            }
        }
    }
    if backward > forward {
        let deepest = items.iter().map(|item| item.rank).max().unwrap_or(0);
        for item in items.iter_mut() {
            item.rank = deepest - item.rank;
        }
    }
}

/// Layer index of every member: the length of the longest path reaching it
/// once back edges (found by depth-first search) are ignored.
fn longest_path_ranks(count: usize, edges: &[(u32, u32)]) -> Vec<usize> {
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); count];
    for &(s, t) in edges {
        let (s, t) = (s as usize, t as usize);
        if s < count && t < count {
            outgoing[s].push(t);
        }
    }

    // 0 = unvisited, 1 = on the stack, 2 = finished
    let mut state = vec![0u8; count];
    let mut kept: Vec<Vec<usize>> = vec![Vec::new(); count];
    for start in 0..count {
        if state[start] != 0 {
            continue;
        }
        let mut stack = vec![(start, 0usize)];
        state[start] = 1;
        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            if let Some(&target) = outgoing[node].get(next) {
                frame.1 += 1;
                match state[target] {
                    0 => {
                        kept[node].push(target);
                        state[target] = 1;
                        stack.push((target, 0));
                    }
                    2 => kept[node].push(target),
                    _ => {}
                }
            } else {
                state[node] = 2;
                stack.pop();
            }
        }
    }

    let mut indegree = vec![0usize; count];
    for targets in &kept {
        for &t in targets {
            indegree[t] += 1;
        }
    }
    let mut ranks = vec![0usize; count];
    let mut queue: VecDeque<usize> = (0..count).filter(|&n| indegree[n] == 0).collect();
    while let Some(node) = queue.pop_front() {
        for &t in &kept[node] {
            ranks[t] = ranks[t].max(ranks[node] + 1);
            indegree[t] -= 1;
            if indegree[t] == 0 {
                queue.push_back(t);
            }
        }
    }
    ranks
}
