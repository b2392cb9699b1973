// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The node tree the cascade is resolved over.
//!
//! [`StyleTree`] is an arena of nodes addressed by generational [`NodeId`]s.
//! Parent links are plain ids used for upward traversal only; a node is
//! owned by its slot, and removing a node removes its whole subtree.

use alloc::vec::Vec;
use core::fmt;

use crate::rule::Rule;
use crate::scope::Scope;
use crate::selector::{ClassId, IdSet, PseudoClassId, SelectorInputs, TypeTag};

/// Identifier for a node in a [`StyleTree`].
///
/// This is a small, copyable handle that stays stable across updates but becomes
/// invalid when the underlying node is removed.
/// It consists of a slot index and a generation counter.
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// Stale `NodeId`s never alias a different live node because the generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(u32, u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.0, self.1)
    }
}

struct NodeData<D> {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    scope: Option<Scope<D>>,
    override_rule: Option<Rule<D>>,
    type_tag: Option<TypeTag>,
    classes: IdSet<ClassId>,
    pseudos: IdSet<PseudoClassId>,
}

impl<D> NodeData<D> {
    fn new(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            scope: None,
            override_rule: None,
            type_tag: None,
            classes: IdSet::default(),
            pseudos: IdSet::default(),
        }
    }
}

struct Slot<D> {
    generation: u32,
    node: Option<NodeData<D>>,
}

/// An arena-backed tree of styleable nodes.
///
/// Each node may own one [`Scope`] (its style sheet), one override [`Rule`],
/// and the selector inputs its rules are matched against. Setting a scope or
/// override replaces the previous one.
///
/// The tree is acyclic by construction: a node is attached to its parent when
/// it is created and cannot be moved afterwards.
///
/// # Example
///
/// ```rust
/// use understory_cascade::{ClassId, Rule, ScopeBuilder, StyleTree};
///
/// let mut tree = StyleTree::<&str>::new();
/// let window = tree.add_root();
/// let button = tree.add_child(window).unwrap();
///
/// tree.set_scope(window, Some(ScopeBuilder::new().rule(Rule::always("base")).build()));
/// tree.set_classes(button, [ClassId(3)]);
///
/// assert_eq!(tree.parent(button), Some(window));
/// assert_eq!(tree.children(window), &[button]);
/// assert!(tree.scope(window).is_some());
///
/// tree.remove(window);
/// assert!(!tree.is_alive(button));
/// ```
pub struct StyleTree<D> {
    slots: Vec<Slot<D>>,
    free: Vec<u32>,
    len: usize,
}

impl<D> Default for StyleTree<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for StyleTree<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleTree")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl<D> StyleTree<D> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree has no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if `id` refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Creates a new root node.
    ///
    /// A tree may hold several roots.
    ///
    /// # Panics
    ///
    /// Panics if the tree would exceed `u32::MAX` slots.
    pub fn add_root(&mut self) -> NodeId {
        self.alloc(NodeData::new(None))
    }

    /// Creates a new node as the last child of `parent`.
    ///
    /// Returns `None` if `parent` is stale.
    ///
    /// # Panics
    ///
    /// Panics if the tree would exceed `u32::MAX` slots.
    pub fn add_child(&mut self, parent: NodeId) -> Option<NodeId> {
        if !self.is_alive(parent) {
            return None;
        }
        let id = self.alloc(NodeData::new(Some(parent)));
        self.node_mut(parent)?.children.push(id);
        Some(id)
    }

    /// Removes `id` and its whole subtree.
    ///
    /// Returns `false` if `id` was already stale.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.node(id).map(|n| n.parent) else {
            return false;
        };
        if let Some(parent) = parent
            && let Some(parent) = self.node_mut(parent)
        {
            parent.children.retain(|&c| c != id);
        }

        let mut stack = Vec::from([id]);
        while let Some(next) = stack.pop() {
            let slot = &mut self.slots[next.idx()];
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
                self.free.push(next.0);
                self.len -= 1;
            }
        }
        true
    }

    /// Returns the parent of `id`, or `None` for roots and stale ids.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Returns the children of `id` in order. Stale ids have no children.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Returns an iterator from the parent of `id` up to its root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, D> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Returns the scope owned by `id`, if any.
    #[must_use]
    pub fn scope(&self, id: NodeId) -> Option<&Scope<D>> {
        self.node(id)?.scope.as_ref()
    }

    /// Returns the override rule owned by `id`, if any.
    #[must_use]
    pub fn override_rule(&self, id: NodeId) -> Option<&Rule<D>> {
        self.node(id)?.override_rule.as_ref()
    }

    /// Returns the selector inputs of `id`, or `None` if `id` is stale.
    #[must_use]
    pub fn inputs(&self, id: NodeId) -> Option<SelectorInputs<'_>> {
        let node = self.node(id)?;
        Some(SelectorInputs::new(
            node.type_tag,
            node.classes.as_slice(),
            node.pseudos.as_slice(),
        ))
    }

    /// Sets or clears the scope owned by `id`.
    ///
    /// Returns `false` if `id` is stale.
    pub fn set_scope(&mut self, id: NodeId, scope: Option<Scope<D>>) -> bool {
        self.update(id, |n| n.scope = scope)
    }

    /// Sets or clears the override rule owned by `id`.
    ///
    /// Returns `false` if `id` is stale.
    pub fn set_override(&mut self, id: NodeId, rule: Option<Rule<D>>) -> bool {
        self.update(id, |n| n.override_rule = rule)
    }

    /// Sets or clears the type tag of `id`.
    ///
    /// Returns `false` if `id` is stale.
    pub fn set_type_tag(&mut self, id: NodeId, tag: Option<TypeTag>) -> bool {
        self.update(id, |n| n.type_tag = tag)
    }

    /// Replaces the style classes of `id`.
    ///
    /// Returns `false` if `id` is stale.
    pub fn set_classes(&mut self, id: NodeId, classes: impl IntoIterator<Item = ClassId>) -> bool {
        let classes = IdSet::from_ids(classes);
        self.update(id, |n| n.classes = classes)
    }

    /// Replaces the active pseudoclasses of `id`.
    ///
    /// Returns `false` if `id` is stale.
    pub fn set_pseudos(
        &mut self,
        id: NodeId,
        pseudos: impl IntoIterator<Item = PseudoClassId>,
    ) -> bool {
        let pseudos = IdSet::from_ids(pseudos);
        self.update(id, |n| n.pseudos = pseudos)
    }

    fn update(&mut self, id: NodeId, f: impl FnOnce(&mut NodeData<D>)) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                f(node);
                true
            }
            None => false,
        }
    }

    fn node(&self, id: NodeId) -> Option<&NodeData<D>> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData<D>> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.node.as_mut()
    }

    fn alloc(&mut self, node: NodeData<D>) -> NodeId {
        self.len += 1;
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            return NodeId::new(idx, slot.generation);
        }
        let idx = u32::try_from(self.slots.len()).expect("too many nodes for NodeId (u32)");
        self.slots.push(Slot {
            generation: 1,
            node: Some(node),
        });
        NodeId::new(idx, 1)
    }
}

/// Iterator over the ancestors of a node, nearest first.
///
/// Returned by [`StyleTree::ancestors`].
pub struct Ancestors<'a, D> {
    tree: &'a StyleTree<D>,
    next: Option<NodeId>,
}

impl<D> Iterator for Ancestors<'_, D> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

impl<D> fmt::Debug for Ancestors<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ancestors")
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}
