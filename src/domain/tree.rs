//! Arena-backed field tree
//!
//! The tree is built once through [`FieldTreeBuilder`] and never changes shape
//! afterwards. Only leaf values and leaf error sets are mutated.

use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::{instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::errors::ErrorSet;
use crate::domain::path::{FieldPath, SEPARATOR};
use crate::domain::snapshot::Snapshot;
use crate::domain::value::FieldValue;

/// Value-holding node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaf {
    value: FieldValue,
    errors: ErrorSet,
}

impl Leaf {
    fn new(value: FieldValue) -> Self {
        Self {
            value,
            errors: ErrorSet::default(),
        }
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn errors(&self) -> &ErrorSet {
        &self.errors
    }

    pub(in crate::domain) fn errors_mut(&mut self) -> &mut ErrorSet {
        &mut self.errors
    }
}

/// Named children in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Group {
    children: Vec<(String, Index)>,
}

impl Group {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Tree node: either a leaf or a group.
#[derive(Debug, Clone)]
pub enum FieldNode {
    Leaf(Leaf),
    Group(Group),
}

/// Addressable, nested model of a form.
#[derive(Debug)]
pub struct FieldTree {
    arena: Arena<FieldNode>,
    root: Index,
    /// Path index, valid for the whole lifetime since the shape is fixed.
    index: HashMap<FieldPath, Index>,
}

impl FieldTree {
    pub fn builder() -> FieldTreeBuilder {
        FieldTreeBuilder::default()
    }

    /// Node at `path`. The root path yields the root group.
    pub fn get(&self, path: &FieldPath) -> DomainResult<&FieldNode> {
        self.index
            .get(path)
            .and_then(|idx| self.arena.get(*idx))
            .ok_or_else(|| DomainError::NotFound(path.clone()))
    }

    /// Leaf at `path`; groups fail with `TypeMismatch`.
    pub fn leaf(&self, path: &FieldPath) -> DomainResult<&Leaf> {
        match self.get(path)? {
            FieldNode::Leaf(leaf) => Ok(leaf),
            FieldNode::Group(_) => Err(DomainError::TypeMismatch(path.clone())),
        }
    }

    pub fn value(&self, path: &FieldPath) -> DomainResult<&FieldValue> {
        self.leaf(path).map(Leaf::value)
    }

    pub fn errors(&self, path: &FieldPath) -> DomainResult<&ErrorSet> {
        self.leaf(path).map(Leaf::errors)
    }

    /// Replace a leaf's value. Error state is left to the rules and the merger.
    #[instrument(level = "debug", skip(self, value), fields(path = %path))]
    pub fn set_value(&mut self, path: &FieldPath, value: FieldValue) -> DomainResult<()> {
        let leaf = self.leaf_mut(path)?;
        trace!(old = %leaf.value, new = %value, "set_value");
        leaf.value = value;
        Ok(())
    }

    /// Depth-first traversal of all leaves in declaration order.
    ///
    /// Lazy; call again to restart.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            tree: self,
            stack: vec![(FieldPath::root(), self.root)],
        }
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    /// Point-in-time copy of all leaf values.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.leaves()
                .map(|(path, leaf)| (path, leaf.value.clone()))
                .collect(),
        )
    }

    pub(in crate::domain) fn leaf_mut(&mut self, path: &FieldPath) -> DomainResult<&mut Leaf> {
        let idx = *self
            .index
            .get(path)
            .ok_or_else(|| DomainError::NotFound(path.clone()))?;
        match self.arena.get_mut(idx) {
            Some(FieldNode::Leaf(leaf)) => Ok(leaf),
            Some(FieldNode::Group(_)) => Err(DomainError::TypeMismatch(path.clone())),
            None => Err(DomainError::NotFound(path.clone())),
        }
    }

    /// Visit every leaf mutably, in the same order as [`FieldTree::leaves`].
    pub(in crate::domain) fn for_each_leaf_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&FieldPath, &mut Leaf),
    {
        let slots: Vec<(FieldPath, Index)> = self
            .leaves()
            .filter_map(|(path, _)| self.index.get(&path).copied().map(|idx| (path, idx)))
            .collect();
        for (path, idx) in slots {
            if let Some(FieldNode::Leaf(leaf)) = self.arena.get_mut(idx) {
                visit(&path, leaf);
            }
        }
    }
}

/// Iterator returned by [`FieldTree::leaves`].
pub struct Leaves<'a> {
    tree: &'a FieldTree,
    stack: Vec<(FieldPath, Index)>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = (FieldPath, &'a Leaf);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((path, idx)) = self.stack.pop() {
            match self.tree.arena.get(idx) {
                Some(FieldNode::Leaf(leaf)) => return Some((path, leaf)),
                Some(FieldNode::Group(group)) => {
                    // reversed so the first declared child is popped first
                    for (name, child) in group.children.iter().rev() {
                        self.stack.push((path.child(name), *child));
                    }
                }
                None => continue,
            }
        }
        None
    }
}

#[derive(Debug, Clone)]
enum Decl {
    Leaf(FieldValue),
    Group(Vec<(String, Decl)>),
}

/// Declares the shape and initial values of a [`FieldTree`].
///
/// ```ignore
/// let tree = FieldTree::builder()
///     .leaf("amount", 12.5)
///     .group("creditor", |g| g.leaf("name", "Lea Simmen"))
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldTreeBuilder {
    children: Vec<(String, Decl)>,
}

impl FieldTreeBuilder {
    pub fn leaf(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.children.push((name.to_string(), Decl::Leaf(value.into())));
        self
    }

    pub fn group<F>(mut self, name: &str, declare: F) -> Self
    where
        F: FnOnce(FieldTreeBuilder) -> FieldTreeBuilder,
    {
        let nested = declare(FieldTreeBuilder::default());
        self.children.push((name.to_string(), Decl::Group(nested.children)));
        self
    }

    /// Materialize the tree, rejecting duplicate or malformed names.
    pub fn build(self) -> DomainResult<FieldTree> {
        let mut arena = Arena::new();
        let mut index = HashMap::new();
        let root = insert_group(
            &mut arena,
            &mut index,
            FieldPath::root(),
            self.children,
        )?;
        Ok(FieldTree { arena, root, index })
    }
}

fn insert_group(
    arena: &mut Arena<FieldNode>,
    index: &mut HashMap<FieldPath, Index>,
    path: FieldPath,
    children: Vec<(String, Decl)>,
) -> DomainResult<Index> {
    let mut group = Group::default();
    for (name, decl) in children {
        if name.is_empty() || name.contains(SEPARATOR) {
            return Err(DomainError::InvalidPath(name));
        }
        let child_path = path.child(&name);
        if index.contains_key(&child_path) {
            return Err(DomainError::DuplicateField(child_path));
        }
        let child = match decl {
            Decl::Leaf(value) => {
                let idx = arena.insert(FieldNode::Leaf(Leaf::new(value)));
                index.insert(child_path, idx);
                idx
            }
            Decl::Group(nested) => insert_group(arena, index, child_path, nested)?,
        };
        group.children.push((name, child));
    }
    let idx = arena.insert(FieldNode::Group(group));
    index.insert(path, idx);
    Ok(idx)
}
