//! Circular placement: members on one circle at equal angular steps.

use std::f32::consts::{FRAC_PI_2, TAU};

use log::debug;
use serde::Deserialize;

use cartograph_core::geometry::Point;

use super::{Placement, PlacementEngine, ScopeGraph};
use crate::{budget::Meter, error::CartographError};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CircularOptions {
    /// Fixed radius. Computed from the member count when absent.
    pub radius: Option<f32>,
    /// The circle never gets smaller than this.
    pub min_radius: f32,
    /// Angle of the first member, in radians. `-π/2` is twelve o'clock.
    pub start_angle: f32,
    pub clockwise: bool,
}

impl Default for CircularOptions {
    fn default() -> Self {
        Self {
            radius: None,
            min_radius: 100.0,
            start_angle: -FRAC_PI_2,
            clockwise: true,
        }
    }
}

/// Radius that keeps `count` boxes of `node_width` from overlapping around
/// the circumference: `max(count * (node_width + spacing) / 2π, min_radius)`.
pub fn circle_radius(count: usize, node_width: f32, spacing: f32, min_radius: f32) -> f32 {
    let circumference = count as f32 * (node_width + spacing);
    (circumference / TAU).max(min_radius)
}

#[derive(Debug)]
pub struct Engine {
    options: CircularOptions,
    spacing: f32,
}

impl Engine {
    pub fn new(options: CircularOptions, spacing: f32) -> Self {
        Self { options, spacing }
    }

    fn radius(&self, graph: &ScopeGraph) -> f32 {
        let min_radius = if self.options.min_radius.is_finite() {
            self.options.min_radius.max(0.0)
        } else {
            0.0
        };
        match self.options.radius.filter(|r| r.is_finite() && *r > 0.0) {
            Some(radius) => radius.max(min_radius),
            None => circle_radius(graph.len(), graph.max_size().width(), self.spacing, min_radius),
        }
    }
}

impl PlacementEngine for Engine {
    fn place(
        &self,
        graph: &ScopeGraph,
        _meter: &mut Meter<'_>,
    ) -> Result<Placement, CartographError> {
        if graph.is_empty() {
            return Ok(Placement::new(Vec::new()));
        }

        let radius = self.radius(graph);
        let step = TAU / graph.len() as f32;
        // Reversed flow directions walk the circle the other way round.
        let clockwise = self.options.clockwise != graph.direction.is_reversed();
        let turn = if clockwise { step } else { -step };
        let start = if self.options.start_angle.is_finite() {
            self.options.start_angle
        } else {
            -FRAC_PI_2
        };
        debug!(members = graph.len(), radius = radius; "Placing members on a circle");

        let origin = Point::default();
        let centers = (0..graph.len())
            .map(|member| {
                let orbit = graph
                    .orbits
                    .get(member)
                    .copied()
                    .flatten()
                    .filter(|r| r.is_finite() && *r >= 0.0)
                    .unwrap_or(radius);
                Point::from_polar(origin, orbit, start + turn * member as f32)
            })
            .collect();

        let mut placement = Placement::new(centers);
        placement.orbit_center = Some(origin);
        Ok(placement)
    }
}
