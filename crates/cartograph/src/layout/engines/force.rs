//! Force-directed placement
//!
//! Members start on a jittered grid and then move under pairwise repulsion
//! and spring attraction along edges. Spring strength scales with the edge
//! weight. The per-iteration move limit cools linearly, and the simulation
//! stops once no member moves further than the convergence threshold, after
//! the configured number of iterations, or when the budget runs out.

use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;

use cartograph_core::geometry::Point;

use super::{Placement, PlacementEngine, ScopeGraph};
use crate::{budget::Meter, error::CartographError};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForceOptions {
    pub iterations: usize,
    pub spring_constant: f32,
    pub repulsion_constant: f32,
    /// Velocity kept from one iteration to the next.
    pub damping_factor: f32,
    /// Largest distance a member may move in one iteration.
    pub max_displacement: f32,
    /// The simulation has settled once no member moves further than this.
    pub convergence_threshold: f32,
    /// Extra distance kept between members on top of their sizes.
    pub min_distance: f32,
    pub seed: u64,
}

impl Default for ForceOptions {
    fn default() -> Self {
        Self {
            iterations: 300,
            spring_constant: 0.1,
            repulsion_constant: 1000.0,
            damping_factor: 0.85,
            max_displacement: 50.0,
            convergence_threshold: 0.5,
            min_distance: 80.0,
            seed: 42,
        }
    }
}

#[derive(Debug)]
pub struct Engine {
    options: ForceOptions,
    spacing: f32,
}

impl Engine {
    pub fn new(options: ForceOptions, spacing: f32) -> Self {
        Self { options, spacing }
    }

    /// Grid positions with seeded jitter so coincident starts are impossible
    /// and reruns are reproducible.
    fn initialize_positions(&self, graph: &ScopeGraph) -> Vec<Point> {
        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let grid_size = (graph.len() as f32).sqrt().ceil().max(1.0) as usize;
        let largest = graph.max_size();
        let cell_size = largest.width().max(largest.height()) + self.spacing.max(1.0);
        let jitter = cell_size / 8.0;

        (0..graph.len())
            .map(|i| {
                let row = i / grid_size;
                let col = i % grid_size;
                let base = Point::new(col as f32 * cell_size, row as f32 * cell_size);
                let offset = Point::new(
                    rng.random_range(-jitter..=jitter),
                    rng.random_range(-jitter..=jitter),
                );
                base.add_point(offset)
            })
            .collect()
    }

    fn forces(&self, graph: &ScopeGraph, positions: &[Point]) -> Vec<Point> {
        let mut forces = vec![Point::default(); positions.len()];

        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let (size_i, size_j) = (graph.sizes[i], graph.sizes[j]);
                let min_dist = (size_i.width() + size_j.width() + size_i.height() + size_j.height())
                    / 4.0
                    + self.options.min_distance;

                let trans = positions[i].sub_point(positions[j]);
                let distance = trans.hypot().max(1.0);
                // Stronger repulsion when members are too close.
                let crowding = (min_dist / distance).max(1.0).powi(2);
                let force_factor = self.options.repulsion_constant / distance * crowding;
                let direction = if trans.hypot() < f32::EPSILON {
                    // Coincident members are pushed apart along a fixed axis.
                    let angle = (i * 7 + j * 13) as f32;
                    Point::new(angle.cos(), angle.sin())
                } else {
                    trans.scale(1.0 / distance)
                };
                let push = direction.scale(force_factor);
                forces[i] = forces[i].add_point(push);
                forces[j] = forces[j].sub_point(push);
            }
        }

        for edge in &graph.edges {
            let (source, target) = (edge.source, edge.target);
            if source == target || source >= positions.len() || target >= positions.len() {
                continue;
            }
            let weight = if edge.weight.is_finite() { edge.weight } else { 1.0 };
            // Spring force grows linearly with the distance.
            let dist = positions[source].sub_point(positions[target]);
            let pull = dist.scale(self.options.spring_constant * weight);
            forces[source] = forces[source].sub_point(pull);
            forces[target] = forces[target].add_point(pull);
        }

        forces
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

        let mut positions = self.initialize_positions(graph);
        let mut velocities = vec![Point::default(); graph.len()];
        let mut complete = true;
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.options.iterations {
            if !meter.tick() {
                complete = false;
                break;
            }

            // The displacement limit cools linearly so the simulation always settles.
            let progress = iterations as f32 / self.options.iterations as f32;
            let limit = self.options.max_displacement * (1.0 - progress);

            let forces = self.forces(graph, &positions);
            let mut largest_move = 0.0_f32;
            for ((position, velocity), force) in
                positions.iter_mut().zip(&mut velocities).zip(forces)
            {
                let mut next = velocity.add_point(force).scale(self.options.damping_factor);
                if !next.is_finite() {
                    next = Point::default();
                }
                let speed = next.hypot();
                if speed > limit {
                    next = if speed > 0.0 {
                        next.scale(limit / speed)
                    } else {
                        Point::default()
                    };
                }
                *velocity = next;
                *position = position.add_point(next);
                largest_move = largest_move.max(next.hypot());
            }

            iterations += 1;
            if largest_move < self.options.convergence_threshold {
                converged = true;
                break;
            }
        }

        debug!(
            members = graph.len(),
            iterations = iterations,
            converged = converged,
            complete = complete;
            "Force simulation finished"
        );

        let mut placement = Placement::new(positions);
        placement.complete = complete;
        Ok(placement)
    }
}
