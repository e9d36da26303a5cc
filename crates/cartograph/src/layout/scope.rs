//! Which scope every node and container belongs to, and where edges land.
//!
//! A node listed by a container is placed inside it; every other node sits on
//! the canvas. When a node is listed by several containers the last one
//! visited wins, matching `get_container_membership`.
//!
//! Edges may connect elements in different scopes. Such an edge is *lifted*
//! to the innermost scope containing both endpoints and connects the two
//! members of that scope that enclose them.

use std::collections::HashMap;

use cartograph_core::ast::DiagramAst;

use crate::structure::{ContainerArena, ContainerIdx, ContainmentScope};

/// A box placed by some scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    /// Index into `DiagramAst::nodes`.
    Node(usize),
    Container(ContainerIdx),
}

/// An edge reduced to one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiftedEdge {
    pub scope: ContainmentScope,
    pub source: Element,
    pub target: Element,
}

#[derive(Debug)]
pub struct DiagramStructure<'a> {
    diagram: &'a DiagramAst,
    arena: ContainerArena<'a>,
    node_index: HashMap<&'a str, usize>,
    node_scope: Vec<ContainmentScope>,
}

impl<'a> DiagramStructure<'a> {
    pub fn new(diagram: &'a DiagramAst) -> Self {
        let arena = ContainerArena::new(&diagram.containers);

        let mut node_index = HashMap::with_capacity(diagram.nodes.len());
        for (idx, node) in diagram.nodes.iter().enumerate() {
            node_index.entry(node.id.as_str()).or_insert(idx);
        }

        let mut owner: HashMap<&str, ContainerIdx> = HashMap::new();
        for (idx, entry) in arena.iter() {
            for child in &entry.decl().children {
                owner.insert(child.as_str(), idx);
            }
        }
        let node_scope = diagram
            .nodes
            .iter()
            .map(|node| {
                owner
                    .get(node.id.as_str())
                    .map_or(ContainmentScope::Root, |&idx| ContainmentScope::Container(idx))
            })
            .collect();

        Self {
            diagram,
            arena,
            node_index,
            node_scope,
        }
    }

    pub fn diagram(&self) -> &'a DiagramAst {
        self.diagram
    }

    pub fn arena(&self) -> &ContainerArena<'a> {
        &self.arena
    }

    /// Scopes in the order they are laid out: nested containers first, the
    /// canvas last.
    pub fn layout_order(&self) -> Vec<ContainmentScope> {
        self.arena
            .post_order()
            .into_iter()
            .map(ContainmentScope::Container)
            .chain(std::iter::once(ContainmentScope::Root))
            .collect()
    }

    /// Elements placed directly in `scope`: its nodes in declaration order,
    /// then its nested containers.
    pub fn members(&self, scope: ContainmentScope) -> Vec<Element> {
        self.node_scope
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s == scope)
            .map(|(idx, _)| Element::Node(idx))
            .chain(
                self.arena
                    .scope_containers(scope)
                    .iter()
                    .map(|&idx| Element::Container(idx)),
            )
            .collect()
    }

    /// Looks up an edge endpoint: node ids first, then container keys.
    pub fn resolve(&self, id: &str) -> Option<Element> {
        self.node_index
            .get(id)
            .map(|&idx| Element::Node(idx))
            .or_else(|| self.arena.find(id).map(Element::Container))
    }

    /// The scope that places `element`.
    pub fn scope_of(&self, element: Element) -> ContainmentScope {
        match element {
            Element::Node(idx) => self
                .node_scope
                .get(idx)
                .copied()
                .unwrap_or(ContainmentScope::Root),
            Element::Container(idx) => self
                .arena
                .get(idx)
                .map_or(ContainmentScope::Root, |entry| entry.outer_scope()),
        }
    }

    /// `(scope, member of that scope enclosing element)` from the canvas down
    /// to the scope placing `element` itself.
    fn ancestry(&self, element: Element) -> Vec<(ContainmentScope, Element)> {
        let path = match self.scope_of(element) {
            ContainmentScope::Root => vec![ContainmentScope::Root],
            ContainmentScope::Container(idx) => self.arena.scope_path(idx),
        };
        let mut chain = Vec::with_capacity(path.len());
        for (i, &scope) in path.iter().enumerate() {
            let member = match path.get(i + 1) {
                Some(&ContainmentScope::Container(next)) => Element::Container(next),
                _ => element,
            };
            chain.push((scope, member));
        }
        chain
    }

    /// Lifts an edge to the innermost scope that holds both endpoints.
    ///
    /// Returns `None` when either endpoint is unknown, when both ends are the
    /// same element, or when one end encloses the other.
    pub fn lift(&self, from: &str, to: &str) -> Option<LiftedEdge> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        self.lift_elements(source, target)
    }

    pub fn lift_elements(&self, source: Element, target: Element) -> Option<LiftedEdge> {
        let a = self.ancestry(source);
        let b = self.ancestry(target);
        let common = a
            .iter()
            .zip(&b)
            .take_while(|((sa, _), (sb, _))| sa == sb)
            .last()?;
        let ((scope, source), (_, target)) = common;
        if source == target {
            return None;
        }
        Some(LiftedEdge {
            scope: *scope,
            source: *source,
            target: *target,
        })
    }
}
