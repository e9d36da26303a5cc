//! Placement strategies.
//!
//! Every containment scope is placed by one engine. An engine sees the scope
//! as a small graph of boxes (member nodes plus nested containers, already
//! sized) and returns one center point per box. Coordinates are relative; the
//! caller normalizes them into the scope's frame afterwards.

mod circular;
mod force;
mod hierarchical;

pub use circular::{CircularOptions, circle_radius};
pub use force::ForceOptions;

use std::fmt;

use cartograph_core::{
    ast::{Direction, LayoutAlgorithm},
    geometry::{Point, Size},
};

use crate::{budget::Meter, error::CartographError};

/// One lifted edge between two members of a scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeEdge {
    pub source: usize,
    pub target: usize,
    /// Already sanitized: missing or non-finite weights are `1`.
    pub weight: f32,
}

/// The input of a placement engine.
#[derive(Debug, Clone, Default)]
pub struct ScopeGraph {
    pub sizes: Vec<Size>,
    pub edges: Vec<ScopeEdge>,
    /// Per-member orbit radius requested through node data.
    pub orbits: Vec<Option<f32>>,
    pub direction: Direction,
}

impl ScopeGraph {
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Largest member width and height.
    pub fn max_size(&self) -> Size {
        self.sizes
            .iter()
            .fold(Size::default(), |acc, size| acc.max(*size))
    }
}

/// Result of placing one scope.
#[derive(Debug, Clone, Default)]
pub struct Placement {
    /// Member centers, in member order.
    pub centers: Vec<Point>,
    /// Center of the circle members were placed on, for circular scopes.
    pub orbit_center: Option<Point>,
    /// `false` when the engine stopped because the budget ran out.
    pub complete: bool,
    pub warnings: Vec<String>,
}

impl Placement {
    pub fn new(centers: Vec<Point>) -> Self {
        Self {
            centers,
            orbit_center: None,
            complete: true,
            warnings: Vec::new(),
        }
    }
}

/// Trait implemented by every placement strategy.
pub trait PlacementEngine: fmt::Debug + Send + Sync {
    /// Places every member of `graph`.
    ///
    /// Engines claim work from `meter`; once it is exhausted they return
    /// their best placement so far with `complete = false`.
    ///
    /// # Errors
    /// Returns `CartographError::Layout` when the engine cannot produce a
    /// position for every member.
    fn place(&self, graph: &ScopeGraph, meter: &mut Meter<'_>)
    -> Result<Placement, CartographError>;
}

/// The three engines, configured once and shared by every scope.
#[derive(Debug)]
pub struct Engines {
    hierarchical: hierarchical::Engine,
    circular: circular::Engine,
    force: force::Engine,
}

impl Engines {
    pub fn new(spacing: f32, circular: CircularOptions, force: ForceOptions) -> Self {
        let mut hierarchical = hierarchical::Engine::new();
        hierarchical.set_spacing(spacing);
        Self {
            hierarchical,
            circular: circular::Engine::new(circular, spacing),
            force: force::Engine::new(force, spacing),
        }
    }

    pub fn get(&self, algorithm: LayoutAlgorithm) -> &dyn PlacementEngine {
        match algorithm {
            LayoutAlgorithm::Hierarchical => &self.hierarchical,
            LayoutAlgorithm::Circular => &self.circular,
            LayoutAlgorithm::Force => &self.force,
        }
    }
}
