use std::time::Duration;

use serde::Deserialize;

use cartograph_core::ast::{Direction, LayoutAlgorithm};
use cartograph_parser::suggest::SuggestOptions;

use crate::{
    budget::Budget,
    layout::{CircularOptions, DEFAULT_PADDING, DEFAULT_SPACING, ForceOptions, LayoutOptions},
    metrics::MetricsOptions,
    validate::{DEFAULT_MAX_DEPTH, ValidationOptions},
};

/// Application configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Container validation section
    #[serde(default)]
    pub validation: ValidationConfig,

    /// "Did you mean" hints in parse errors
    #[serde(default)]
    pub suggestions: SuggestionConfig,

    /// Centrality metrics section
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Layout configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Overrides every diagram's direction when set
    pub direction: Option<Direction>,

    /// Algorithm for diagrams that do not pick one
    pub algorithm: Option<LayoutAlgorithm>,

    pub spacing: f32,
    pub padding: f32,
    pub circular: CircularOptions,
    pub force: ForceOptions,

    /// Upper bound on engine iterations per layout call
    pub max_iterations: Option<usize>,

    /// Wall-clock limit per layout call, in milliseconds
    pub timeout_ms: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: None,
            algorithm: None,
            spacing: DEFAULT_SPACING,
            padding: DEFAULT_PADDING,
            circular: CircularOptions::default(),
            force: ForceOptions::default(),
            max_iterations: None,
            timeout_ms: None,
        }
    }
}

impl LayoutConfig {
    /// Layout options for one call. Timeouts start counting now.
    pub fn options(&self) -> LayoutOptions {
        LayoutOptions {
            direction: self.direction,
            spacing: self.spacing,
            algorithm: self.algorithm,
            padding: self.padding,
            circular: self.circular,
            force: self.force,
            budget: budget(self.max_iterations, self.timeout_ms),
        }
    }
}

/// Container validation section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Nesting depth beyond which a warning is reported
    pub max_depth: usize,

    /// Treat validation warnings as failures
    pub warnings_as_errors: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            warnings_as_errors: false,
        }
    }
}

impl ValidationConfig {
    pub fn options(&self) -> ValidationOptions {
        ValidationOptions {
            max_depth: self.max_depth,
        }
    }
}

/// Suggestion limits section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    pub max_suggestions: Option<usize>,
    pub max_distance: Option<usize>,
}

impl SuggestionConfig {
    pub fn options(&self) -> SuggestOptions {
        let defaults = SuggestOptions::default();
        SuggestOptions {
            max_suggestions: self.max_suggestions.unwrap_or(defaults.max_suggestions),
            max_distance: self.max_distance.unwrap_or(defaults.max_distance),
        }
    }
}

/// Centrality metrics section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Compute metrics even for diagrams where no node requests them
    pub enabled: bool,

    /// Compute every metric for every node
    pub all_nodes: bool,

    /// Use edge weights as distances for closeness
    pub weighted: bool,

    pub max_iterations: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl MetricsConfig {
    pub fn options(&self) -> MetricsOptions {
        MetricsOptions {
            all_nodes: self.all_nodes,
            weighted: self.weighted,
            budget: budget(self.max_iterations, self.timeout_ms),
        }
    }
}

fn budget(max_iterations: Option<usize>, timeout_ms: Option<u64>) -> Budget {
    let mut budget = Budget::unlimited();
    if let Some(max_iterations) = max_iterations {
        budget = budget.with_max_iterations(max_iterations);
    }
    if let Some(timeout_ms) = timeout_ms {
        budget = budget.with_timeout(Duration::from_millis(timeout_ms));
    }
    budget
}
