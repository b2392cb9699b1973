// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The delivery boundary between the resolver and whatever applies styling.

use alloc::vec::Vec;
use core::fmt;

use hashbrown::{HashMap, HashSet};

use crate::rule::Rule;
use crate::tree::NodeId;

/// Consumer of resolved style lists.
///
/// A sink stands for the rendering layer of a whole tree; calls are keyed by
/// [`NodeId`]. The resolver only ever asks whether a node is active and
/// delivers to active nodes.
pub trait StyleSink<D> {
    /// Returns `true` if `node` is attached to a live render target.
    fn is_active(&self, node: NodeId) -> bool;

    /// Applies the resolved rules for `node`, lowest precedence first.
    ///
    /// An empty slice means no rules apply and any applied styling should be
    /// cleared.
    fn deliver(&mut self, node: NodeId, rules: &[Rule<D>]);
}

/// A sink that records what it receives.
///
/// Nodes start inactive; call [`RecordingSink::activate`] for each node that
/// should receive deliveries. The sink keeps the latest list per node and a
/// log of which nodes were delivered to, in delivery order.
///
/// # Example
///
/// ```rust
/// use understory_cascade::{CascadeCx, RecordingSink, Rule, ScopeBuilder, StyleTree};
///
/// let mut tree = StyleTree::new();
/// let root = tree.add_root();
/// let base = Rule::always("base");
/// tree.set_scope(root, Some(ScopeBuilder::new().rule(base.clone()).build()));
///
/// let mut sink = RecordingSink::new();
/// sink.activate(root);
/// CascadeCx::new().restyle(&tree, root, &mut sink).unwrap();
///
/// assert_eq!(sink.styles(root), Some(&[base][..]));
/// assert_eq!(sink.log(), &[root]);
/// ```
pub struct RecordingSink<D> {
    active: HashSet<NodeId>,
    styles: HashMap<NodeId, Vec<Rule<D>>>,
    log: Vec<NodeId>,
}

impl<D> RecordingSink<D> {
    /// Creates an empty sink with no active nodes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: HashSet::new(),
            styles: HashMap::new(),
            log: Vec::new(),
        }
    }

    /// Marks `node` as active.
    pub fn activate(&mut self, node: NodeId) {
        self.active.insert(node);
    }

    /// Marks `node` as inactive. Previously recorded styles are kept.
    pub fn deactivate(&mut self, node: NodeId) {
        self.active.remove(&node);
    }

    /// Returns the most recent list delivered to `node`, if any.
    #[must_use]
    pub fn styles(&self, node: NodeId) -> Option<&[Rule<D>]> {
        self.styles.get(&node).map(Vec::as_slice)
    }

    /// Returns the nodes delivered to, in delivery order.
    ///
    /// The log grows by one entry per delivery and is only emptied by
    /// [`clear`](Self::clear) or [`take_log`](Self::take_log). A sink kept
    /// across many passes should drain it between them.
    #[must_use]
    pub fn log(&self) -> &[NodeId] {
        &self.log
    }

    /// Returns the delivery log and empties it, keeping the recorded styles.
    pub fn take_log(&mut self) -> Vec<NodeId> {
        core::mem::take(&mut self.log)
    }

    /// Forgets all recorded deliveries. Active nodes stay active.
    pub fn clear(&mut self) {
        self.styles.clear();
        self.log.clear();
    }
}

impl<D> Default for RecordingSink<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: fmt::Debug> fmt::Debug for RecordingSink<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingSink")
            .field("active", &self.active)
            .field("styles", &self.styles)
            .field("log", &self.log)
            .finish()
    }
}

impl<D> StyleSink<D> for RecordingSink<D> {
    fn is_active(&self, node: NodeId) -> bool {
        self.active.contains(&node)
    }

    fn deliver(&mut self, node: NodeId, rules: &[Rule<D>]) {
        self.styles.insert(node, rules.to_vec());
        self.log.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_by_default() {
        let sink = RecordingSink::<()>::new();
        assert!(!sink.is_active(NodeId::new(0, 1)));
    }

    #[test]
    fn records_latest_delivery() {
        let node = NodeId::new(0, 1);
        let a = Rule::always('a');
        let b = Rule::always('b');

        let mut sink = RecordingSink::new();
        sink.deliver(node, &[a.clone(), b.clone()]);
        sink.deliver(node, core::slice::from_ref(&b));

        assert_eq!(sink.styles(node), Some(&[b][..]));
        assert_eq!(sink.log(), &[node, node]);

        sink.clear();
        assert_eq!(sink.styles(node), None);
        assert!(sink.log().is_empty());
    }

    #[test]
    fn empty_delivery_is_recorded() {
        let node = NodeId::new(3, 1);
        let mut sink = RecordingSink::<()>::new();
        sink.deliver(node, &[]);
        assert_eq!(sink.styles(node), Some(&[][..]));
    }

    #[test]
    fn deactivate_keeps_recorded_styles() {
        let node = NodeId::new(1, 1);
        let mut sink = RecordingSink::new();
        sink.activate(node);
        sink.deliver(node, &[Rule::always(())]);
        sink.deactivate(node);
        assert!(!sink.is_active(node));
        assert_eq!(sink.styles(node).map(<[_]>::len), Some(1));
    }

    #[test]
    fn take_log_keeps_styles() {
        let node = NodeId::new(0, 1);
        let rule = Rule::always(());

        let mut sink = RecordingSink::new();
        sink.deliver(node, core::slice::from_ref(&rule));
        sink.deliver(node, core::slice::from_ref(&rule));

        assert_eq!(sink.take_log(), [node, node]);
        assert!(sink.log().is_empty());
        assert_eq!(sink.styles(node), Some(&[rule][..]));
    }
}
