//! Flattened container hierarchy.
//!
//! Container declarations nest by value in the AST. The validator and the
//! layout engine both need parent links, depths and post-order walks, so the
//! forest is flattened once into a [`ContainerArena`] whose entries refer to
//! each other by index.

use cartograph_core::ast::ContainerDeclaration;

/// Index of a container inside a [`ContainerArena`].
pub type ContainerIdx = usize;

/// A region of the diagram laid out as one unit: the canvas itself or the
/// inside of one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainmentScope {
    Root,
    Container(ContainerIdx),
}

#[derive(Debug)]
pub struct ContainerEntry<'a> {
    decl: &'a ContainerDeclaration,
    key: String,
    parent: Option<ContainerIdx>,
    level: usize,
    nested: Vec<ContainerIdx>,
}

impl<'a> ContainerEntry<'a> {
    pub fn decl(&self) -> &'a ContainerDeclaration {
        self.decl
    }

    /// The id, the label when there is no id, or a positional name.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn parent(&self) -> Option<ContainerIdx> {
        self.parent
    }

    /// `0` for top-level containers.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Directly nested containers, in declaration order.
    pub fn nested(&self) -> &[ContainerIdx] {
        &self.nested
    }

    /// The scope this container is placed in.
    pub fn outer_scope(&self) -> ContainmentScope {
        self.parent
            .map_or(ContainmentScope::Root, ContainmentScope::Container)
    }
}

/// Containers stored in pre-order, addressed by [`ContainerIdx`].
#[derive(Debug, Default)]
pub struct ContainerArena<'a> {
    entries: Vec<ContainerEntry<'a>>,
    roots: Vec<ContainerIdx>,
}

impl<'a> ContainerArena<'a> {
    pub fn new(containers: &'a [ContainerDeclaration]) -> Self {
        let mut arena = Self::default();
        for decl in containers {
            let idx = arena.insert(decl, None, 0);
            arena.roots.push(idx);
        }
        arena
    }

    fn insert(
        &mut self,
        decl: &'a ContainerDeclaration,
        parent: Option<ContainerIdx>,
        level: usize,
    ) -> ContainerIdx {
        let idx = self.entries.len();
        let key = decl
            .key()
            .map_or_else(|| format!("container-{idx}"), str::to_string);
        self.entries.push(ContainerEntry {
            decl,
            key,
            parent,
            level,
            nested: Vec::new(),
        });
        for inner in &decl.containers {
            let child = self.insert(inner, Some(idx), level + 1);
            self.entries[idx].nested.push(child);
        }
        idx
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, idx: ContainerIdx) -> Option<&ContainerEntry<'a>> {
        self.entries.get(idx)
    }

    /// Top-level containers, in declaration order.
    pub fn roots(&self) -> &[ContainerIdx] {
        &self.roots
    }

    /// Containers placed directly in `scope`.
    pub fn scope_containers(&self, scope: ContainmentScope) -> &[ContainerIdx] {
        match scope {
            ContainmentScope::Root => &self.roots,
            ContainmentScope::Container(idx) => self
                .entries
                .get(idx)
                .map_or(&[][..], |entry| entry.nested.as_slice()),
        }
    }

    /// Every entry in pre-order (parents before their nested containers).
    pub fn iter(&self) -> impl Iterator<Item = (ContainerIdx, &ContainerEntry<'a>)> {
        self.entries.iter().enumerate()
    }

    /// Container indices with nested containers before their parents.
    pub fn post_order(&self) -> Vec<ContainerIdx> {
        fn visit(arena: &ContainerArena<'_>, idx: ContainerIdx, out: &mut Vec<ContainerIdx>) {
            for &child in &arena.entries[idx].nested {
                visit(arena, child, out);
            }
            out.push(idx);
        }

        let mut out = Vec::with_capacity(self.entries.len());
        for &root in &self.roots {
            visit(self, root, &mut out);
        }
        out
    }

    /// Chain of scopes from the canvas down to the inside of `idx`.
    pub fn scope_path(&self, idx: ContainerIdx) -> Vec<ContainmentScope> {
        let mut path = vec![ContainmentScope::Container(idx)];
        let mut current = self.entries.get(idx).and_then(|entry| entry.parent);
        while let Some(parent) = current {
            path.push(ContainmentScope::Container(parent));
            current = self.entries[parent].parent;
        }
        path.push(ContainmentScope::Root);
        path.reverse();
        path
    }

    /// First container (pre-order) whose key is `key`.
    pub fn find(&self, key: &str) -> Option<ContainerIdx> {
        self.entries.iter().position(|entry| entry.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ContainerDeclaration> {
        vec![
            ContainerDeclaration::new("outer")
                .with_children(["a"])
                .with_containers(vec![
                    ContainerDeclaration::new("inner").with_children(["b"]),
                    ContainerDeclaration::new("side"),
                ]),
            ContainerDeclaration::new("other"),
        ]
    }

    #[test]
    fn test_arena_is_pre_order() {
        let containers = sample();
        let arena = ContainerArena::new(&containers);
        let keys: Vec<&str> = arena.iter().map(|(_, entry)| entry.key()).collect();
        assert_eq!(keys, ["outer", "inner", "side", "other"]);
        assert_eq!(arena.len(), 4);
        assert_eq!(arena.roots(), &[0, 3]);
        assert_eq!(arena.get(1).and_then(ContainerEntry::parent), Some(0));
        assert_eq!(arena.get(2).map(ContainerEntry::level), Some(1));
    }

    #[test]
    fn test_post_order_visits_children_first() {
        let containers = sample();
        let arena = ContainerArena::new(&containers);
        assert_eq!(arena.post_order(), [1, 2, 0, 3]);
    }

    #[test]
    fn test_scope_path() {
        let containers = sample();
        let arena = ContainerArena::new(&containers);
        assert_eq!(
            arena.scope_path(1),
            [
                ContainmentScope::Root,
                ContainmentScope::Container(0),
                ContainmentScope::Container(1)
            ]
        );
    }

    #[test]
    fn test_anonymous_container_key() {
        let containers = vec![ContainerDeclaration {
            label: Some("Backend".to_string()),
            ..ContainerDeclaration::default()
        }, ContainerDeclaration::default()];
        let arena = ContainerArena::new(&containers);
        assert_eq!(arena.get(0).map(ContainerEntry::key), Some("Backend"));
        assert_eq!(arena.get(1).map(ContainerEntry::key), Some("container-1"));
    }
}
