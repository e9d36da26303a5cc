//! Chart-like profiles: timelines, Wardley maps, kanban boards, git graphs and treemaps.

use serde::Serialize;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEvent {
    pub id: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePeriod {
    pub id: String,
    pub start: String,
    pub end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimelineProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub orientation: Orientation,
    pub events: Vec<TimelineEvent>,
    pub periods: Vec<TimelinePeriod>,
}

/// A component placed on the Wardley map.
///
/// `visibility` (Y) and `evolution` (X) are both in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WardleyComponent {
    pub id: String,
    pub name: String,
    pub visibility: f32,
    pub evolution: f32,
    pub anchor: bool,
    pub inertia: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WardleyEvolution {
    pub component: String,
    pub target: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WardleyDependency {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WardleyProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub components: Vec<WardleyComponent>,
    pub evolutions: Vec<WardleyEvolution>,
    pub dependencies: Vec<WardleyDependency>,
}

impl WardleyProfile {
    pub fn component(&self, id: &str) -> Option<&WardleyComponent> {
        self.components.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KanbanCard {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KanbanColumn {
    pub id: String,
    pub label: String,
    /// Work-in-progress limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wip: Option<u32>,
    pub cards: Vec<KanbanCard>,
}

impl KanbanColumn {
    pub fn is_over_limit(&self) -> bool {
        self.wip.is_some_and(|limit| self.cards.len() > limit as usize)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KanbanProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<KanbanColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GitCommit {
    pub id: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Parent commit ids. Merge commits have two.
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GitBranch {
    pub name: String,
    /// Commit the branch was created from, `None` for the initial branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GitGraphProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub branches: Vec<GitBranch>,
    pub commits: Vec<GitCommit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreemapNode {
    pub label: String,
    /// Own value for leaves, sum of children for groups.
    pub value: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreemapNode>,
}

impl TreemapNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreemapProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub roots: Vec<TreemapNode>,
}

impl TreemapProfile {
    pub fn total(&self) -> f32 {
        self.roots.iter().map(|r| r.value).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kanban_wip_limit() {
        let card = KanbanCard {
            id: "c1".to_string(),
            title: "Card".to_string(),
            assignee: None,
            priority: None,
            tags: Vec::new(),
        };
        let mut column = KanbanColumn {
            id: "doing".to_string(),
            label: "Doing".to_string(),
            wip: Some(1),
            cards: vec![card.clone()],
        };
        assert!(!column.is_over_limit());
        column.cards.push(card);
        assert!(column.is_over_limit());
        column.wip = None;
        assert!(!column.is_over_limit());
    }
}
