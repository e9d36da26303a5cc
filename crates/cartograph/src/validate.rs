//! Structural checks over a diagram's container hierarchy.
//!
//! Validation never stops at the first problem: every rule runs and the
//! [`ValidationReport`] lists all errors and warnings. Errors make the diagram
//! invalid; warnings never do.
//!
//! The module also exposes the read-only membership queries the layout and
//! metrics stages rely on.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cartograph_core::ast::{ContainerDeclaration, DiagramAst, NodeAst};

use crate::structure::{ContainerArena, ContainerIdx};

/// Nesting depth above which a warning is reported.
pub const DEFAULT_MAX_DEPTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Deepest allowed nesting; a container without nested containers has depth 1.
    pub max_depth: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One problem found in the container hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("container `{container}` has no children and no nested containers")]
    EmptyContainer { container: String },

    #[error("container `{container}` lists `{child}` more than once")]
    DuplicateChild { container: String, child: String },

    #[error("container `{container}` references unknown node `{child}`")]
    UnknownChild { container: String, child: String },

    #[error("container `{container}` is nested inside itself ({})", path.join(" > "))]
    CircularReference { container: String, path: Vec<String> },

    #[error("container `{container}` nests {depth} levels deep (maximum is {max})")]
    NestingTooDeep {
        container: String,
        depth: usize,
        max: usize,
    },

    #[error("top-level container id `{container}` is declared more than once")]
    DuplicateContainer { container: String },

    #[error("container `{container}` has neither an id nor a label")]
    MissingIdentity { container: String },

    #[error("node `{node}` belongs to both `{first}` and `{second}`")]
    SharedMember {
        node: String,
        first: String,
        second: String,
    },
}

impl ValidationIssue {
    /// Whether this issue makes the diagram invalid.
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            Self::EmptyContainer { .. } | Self::NestingTooDeep { .. } | Self::SharedMember { .. }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            issues.into_iter().partition(ValidationIssue::is_error);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Validates the containers of `diagram` against its node list.
pub fn validate_diagram(diagram: &DiagramAst, options: &ValidationOptions) -> ValidationReport {
    validate_containers(&diagram.containers, Some(diagram.nodes.as_slice()), options)
}

/// Validates a container forest.
///
/// Child references are only checked against `nodes` when it is given, so a
/// container list can be validated on its own.
pub fn validate_containers(
    containers: &[ContainerDeclaration],
    nodes: Option<&[NodeAst]>,
    options: &ValidationOptions,
) -> ValidationReport {
    let arena = ContainerArena::new(containers);
    let known: Option<HashSet<&str>> =
        nodes.map(|nodes| nodes.iter().map(|node| node.id.as_str()).collect());

    let mut issues = Vec::new();
    check_top_level_ids(&arena, &mut issues);
    for (idx, _) in arena.iter() {
        check_container(&arena, idx, known.as_ref(), &mut issues);
    }
    for &root in arena.roots() {
        check_cycles(&arena, root, Vec::new(), &mut issues);

        let depth = nesting_depth(&arena, root);
        if depth > options.max_depth {
            issues.push(ValidationIssue::NestingTooDeep {
                container: key(&arena, root),
                depth,
                max: options.max_depth,
            });
        }
    }
    check_shared_members(&arena, &mut issues);

    let report = ValidationReport::from_issues(issues);
    info!(
        containers = arena.len(),
        errors = report.errors.len(),
        warnings = report.warnings.len();
        "Validated containers"
    );
    report
}

fn key(arena: &ContainerArena<'_>, idx: ContainerIdx) -> String {
    arena
        .get(idx)
        .map(|entry| entry.key().to_string())
        .unwrap_or_default()
}

fn check_top_level_ids(arena: &ContainerArena<'_>, issues: &mut Vec<ValidationIssue>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for entry in arena.roots().iter().filter_map(|&idx| arena.get(idx)) {
        let Some(id) = entry.decl().id.as_deref() else {
            continue;
        };
        if !seen.insert(id) && reported.insert(id) {
            issues.push(ValidationIssue::DuplicateContainer {
                container: id.to_string(),
            });
        }
    }
}

/// Rules that look at one container in isolation.
fn check_container(
    arena: &ContainerArena<'_>,
    idx: ContainerIdx,
    known: Option<&HashSet<&str>>,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(entry) = arena.get(idx) else {
        return;
    };
    let decl = entry.decl();
    let container = entry.key().to_string();

    if decl.id.is_none() && decl.label.is_none() {
        issues.push(ValidationIssue::MissingIdentity {
            container: container.clone(),
        });
    }

    if decl.children.is_empty() && decl.containers.is_empty() {
        issues.push(ValidationIssue::EmptyContainer {
            container: container.clone(),
        });
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for child in &decl.children {
        if !seen.insert(child.as_str()) {
            if reported.insert(child.as_str()) {
                issues.push(ValidationIssue::DuplicateChild {
                    container: container.clone(),
                    child: child.clone(),
                });
            }
            continue;
        }
        if known.is_some_and(|known| !known.contains(child.as_str())) {
            issues.push(ValidationIssue::UnknownChild {
                container: container.clone(),
                child: child.clone(),
            });
        }
    }
}

/// Walks down from `idx` carrying the ids on the current path. Each branch
/// gets its own copy, so only a container that reappears among its own
/// ancestors is reported; siblings sharing an id are not a cycle.
fn check_cycles<'a>(
    arena: &'a ContainerArena<'_>,
    idx: ContainerIdx,
    mut path: Vec<&'a str>,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(entry) = arena.get(idx) else {
        return;
    };
    if let Some(id) = entry.decl().id.as_deref() {
        if path.contains(&id) {
            debug!(container = id; "Circular container reference");
            let mut cycle: Vec<String> = path.iter().map(|s| s.to_string()).collect();
            cycle.push(id.to_string());
            issues.push(ValidationIssue::CircularReference {
                container: id.to_string(),
                path: cycle,
            });
            return;
        }
        path.push(id);
    }
    for &child in entry.nested() {
        check_cycles(arena, child, path.clone(), issues);
    }
}

/// Depth of the subtree rooted at `idx`; a leaf container counts as 1.
fn nesting_depth(arena: &ContainerArena<'_>, idx: ContainerIdx) -> usize {
    arena.get(idx).map_or(0, |entry| {
        1 + entry
            .nested()
            .iter()
            .map(|&child| nesting_depth(arena, child))
            .max()
            .unwrap_or(0)
    })
}

fn check_shared_members(arena: &ContainerArena<'_>, issues: &mut Vec<ValidationIssue>) {
    let mut owners: HashMap<&str, &str> = HashMap::new();
    let mut reported: HashSet<(&str, &str)> = HashSet::new();
    for (_, entry) in arena.iter() {
        let mut local = HashSet::new();
        for child in &entry.decl().children {
            if !local.insert(child.as_str()) {
                continue;
            }
            match owners.get(child.as_str()) {
                Some(&first) if first != entry.key() => {
                    if reported.insert((child.as_str(), entry.key())) {
                        issues.push(ValidationIssue::SharedMember {
                            node: child.clone(),
                            first: first.to_string(),
                            second: entry.key().to_string(),
                        });
                    }
                }
                Some(_) => {}
                None => {
                    owners.insert(child.as_str(), entry.key());
                }
            }
        }
    }
}

/// Maps every listed node id to the container that owns it.
///
/// Containers are visited depth-first in declaration order; when a node is
/// listed by several containers the last one visited wins.
pub fn get_container_membership(diagram: &DiagramAst) -> IndexMap<String, String> {
    let arena = ContainerArena::new(&diagram.containers);
    let mut membership = IndexMap::new();
    for (_, entry) in arena.iter() {
        for child in &entry.decl().children {
            membership.insert(child.clone(), entry.key().to_string());
        }
    }
    membership
}

/// First container, depth-first, that lists `node_id` among its direct children.
pub fn find_container_for_node<'a>(
    node_id: &str,
    containers: &'a [ContainerDeclaration],
) -> Option<&'a ContainerDeclaration> {
    containers.iter().find_map(|container| {
        if container.children.iter().any(|child| child == node_id) {
            Some(container)
        } else {
            find_container_for_node(node_id, &container.containers)
        }
    })
}

/// Node ids listed by `container` and every container nested in it, in
/// declaration order.
pub fn get_all_descendants(container: &ContainerDeclaration) -> Vec<String> {
    let mut out = container.children.clone();
    for inner in &container.containers {
        out.extend(get_all_descendants(inner));
    }
    out
}
