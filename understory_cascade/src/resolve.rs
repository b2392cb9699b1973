// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cascade resolution over a [`StyleTree`].
//!
//! This module provides [`CascadeCx`], which computes the ordered rule list
//! for each node of a subtree and hands it to a [`StyleSink`].

use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

use crate::rule::{MatchError, MatchTarget, Rule};
use crate::scope::Scope;
use crate::sink::StyleSink;
use crate::tree::{NodeId, StyleTree};

/// An ordered list of scopes, lowest precedence first.
pub type ScopeChain<D> = SmallVec<[Scope<D>; 4]>;

/// When a node is delivered to relative to its descendants.
///
/// Either order finalizes a node's ancestor chain before delivering to it,
/// so both produce the same lists. Only the order of
/// [`StyleSink::deliver`] calls differs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DeliveryOrder {
    /// Children are delivered before their parent.
    #[default]
    PostOrder,
    /// A parent is delivered before its children.
    PreOrder,
}

/// Error returned by cascade resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RestyleError {
    /// Resolution was requested for a node that is not in the tree.
    StaleNode(NodeId),
    /// A rule predicate failed while resolving `node`.
    Match {
        /// The node being resolved.
        node: NodeId,
        /// The predicate failure.
        source: MatchError,
    },
}

impl fmt::Display for RestyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleNode(node) => write!(f, "node {node} is not in the tree"),
            Self::Match { node, source } => write!(f, "resolving node {node}: {source}"),
        }
    }
}

impl core::error::Error for RestyleError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::StaleNode(_) => None,
            Self::Match { source, .. } => Some(source),
        }
    }
}

/// Counters for a single restyle pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RestyleSummary {
    /// Nodes walked, active or not.
    pub visited: usize,
    /// Nodes whose resolved list was delivered.
    pub delivered: usize,
    /// Nodes skipped because the sink reported them inactive.
    pub skipped: usize,
}

/// Resolution context: the global scope and traversal settings.
///
/// The global scope sits above every root. It has the lowest precedence of
/// all scopes.
///
/// Precedence of the resolved list, lowest first:
///
/// **Global → farthest ancestor scope → … → nearest ancestor scope → own scope → override**
///
/// Within one scope, matched rules are ordered by ascending specificity, with
/// ties kept in authoring order. Rules of one scope never interleave with
/// rules of another.
///
/// # Example
///
/// ```rust
/// use understory_cascade::{
///     CascadeCx, ClassId, RecordingSink, Rule, ScopeBuilder, Selector, StyleTree,
/// };
///
/// const PRIMARY: ClassId = ClassId(1);
///
/// let global_base = Rule::with_selector(Selector::default(), "global base");
/// let global = ScopeBuilder::new().rule(global_base.clone()).build();
///
/// let mut tree = StyleTree::new();
/// let window = tree.add_root();
/// let button = tree.add_child(window).unwrap();
///
/// let primary = Rule::with_selector(Selector::with_classes([PRIMARY]), "primary");
/// tree.set_scope(window, Some(ScopeBuilder::new().rule(primary.clone()).build()));
/// tree.set_classes(button, [PRIMARY]);
///
/// let pinned = Rule::always("pinned");
/// tree.set_override(button, Some(pinned.clone()));
///
/// let cx = CascadeCx::new().with_global(Some(&global));
/// assert_eq!(
///     cx.resolve(&tree, button).unwrap(),
///     [global_base.clone(), primary, pinned],
/// );
///
/// let mut sink = RecordingSink::new();
/// sink.activate(window);
/// sink.activate(button);
/// let summary = cx.restyle(&tree, window, &mut sink).unwrap();
/// assert_eq!(summary.delivered, 2);
/// // Children are delivered first.
/// assert_eq!(sink.log(), &[button, window]);
/// assert_eq!(sink.styles(window), Some(&[global_base][..]));
/// ```
pub struct CascadeCx<'a, D> {
    global: Option<&'a Scope<D>>,
    order: DeliveryOrder,
}

impl<D> Clone for CascadeCx<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for CascadeCx<'_, D> {}

impl<D> Default for CascadeCx<'_, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: fmt::Debug> fmt::Debug for CascadeCx<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadeCx")
            .field("global", &self.global)
            .field("order", &self.order)
            .finish()
    }
}

impl<'a, D> CascadeCx<'a, D> {
    /// Creates a context with no global scope and post-order delivery.
    #[must_use]
    pub fn new() -> Self {
        Self {
            global: None,
            order: DeliveryOrder::PostOrder,
        }
    }

    /// Sets the global scope.
    #[must_use]
    pub fn with_global(mut self, global: Option<&'a Scope<D>>) -> Self {
        self.global = global;
        self
    }

    /// Sets the delivery order.
    #[must_use]
    pub fn with_order(mut self, order: DeliveryOrder) -> Self {
        self.order = order;
        self
    }

    /// Returns the global scope, if any.
    #[must_use]
    #[inline]
    pub fn global(&self) -> Option<&'a Scope<D>> {
        self.global
    }

    /// Returns the delivery order.
    #[must_use]
    #[inline]
    pub fn order(&self) -> DeliveryOrder {
        self.order
    }

    /// Collects the scopes visible to `node` from above.
    ///
    /// The result starts with the global scope (if any), followed by the
    /// scopes of scope-owning ancestors from the root down to the parent.
    /// The node's own scope is not included.
    ///
    /// # Errors
    ///
    /// Returns [`RestyleError::StaleNode`] if `node` is not in `tree`.
    pub fn ancestor_scopes(
        &self,
        tree: &StyleTree<D>,
        node: NodeId,
    ) -> Result<ScopeChain<D>, RestyleError> {
        if !tree.is_alive(node) {
            return Err(RestyleError::StaleNode(node));
        }
        let mut chain: ScopeChain<D> = tree
            .ancestors(node)
            .filter_map(|ancestor| tree.scope(ancestor).cloned())
            .collect();
        if let Some(global) = self.global {
            chain.push(global.clone());
        }
        chain.reverse();
        Ok(chain)
    }

    /// Resolves the rule list of a single node without delivering it.
    ///
    /// The ancestor chain is computed fresh, so the result is what a
    /// [`restyle`](Self::restyle) pass would deliver to `node`.
    ///
    /// # Errors
    ///
    /// Returns [`RestyleError::StaleNode`] if `node` is not in `tree`, or
    /// [`RestyleError::Match`] if a predicate fails.
    pub fn resolve(&self, tree: &StyleTree<D>, node: NodeId) -> Result<Vec<Rule<D>>, RestyleError> {
        let mut chain = self.ancestor_scopes(tree, node)?;
        if let Some(own) = tree.scope(node) {
            chain.push(own.clone());
        }
        self.resolve_with_chain(tree, node, &chain)
    }

    /// Resolves the rule list of `node` against an explicit chain of
    /// in-scope scopes, lowest precedence first.
    ///
    /// `chain` should end with the node's own scope, if it has one. The
    /// node's override rule, if any, is appended last.
    ///
    /// # Errors
    ///
    /// Returns [`RestyleError::StaleNode`] if `node` is not in `tree`, or
    /// [`RestyleError::Match`] if a predicate fails.
    pub fn resolve_with_chain(
        &self,
        tree: &StyleTree<D>,
        node: NodeId,
        chain: &[Scope<D>],
    ) -> Result<Vec<Rule<D>>, RestyleError> {
        let inputs = tree.inputs(node).ok_or(RestyleError::StaleNode(node))?;
        let target = MatchTarget { node, inputs };

        let mut styles = Vec::new();
        for scope in chain {
            scope
                .matching(&target, &mut styles)
                .map_err(|source| RestyleError::Match { node, source })?;
        }
        if let Some(rule) = tree.override_rule(node) {
            styles.push(rule.clone());
        }
        Ok(styles)
    }

    /// Restyles the subtree rooted at `node`.
    ///
    /// The ancestor chain of `node` is collected fresh, so this may be
    /// called on any node, not only on roots. Every node of the subtree is
    /// visited; nodes the sink reports inactive are skipped without
    /// matching, but their descendants are still visited.
    ///
    /// # Errors
    ///
    /// Returns [`RestyleError::StaleNode`] if `node` is not in `tree`, or
    /// [`RestyleError::Match`] if a predicate fails. A failure ends the pass;
    /// deliveries made before it are not undone.
    pub fn restyle<S>(
        &self,
        tree: &StyleTree<D>,
        node: NodeId,
        sink: &mut S,
    ) -> Result<RestyleSummary, RestyleError>
    where
        S: StyleSink<D> + ?Sized,
    {
        let chain = self.ancestor_scopes(tree, node)?;
        self.walk(tree, node, chain, sink)
    }

    /// Restyles the subtree rooted at `node` using a precomputed ancestor
    /// chain.
    ///
    /// `ancestors` must be what [`ancestor_scopes`](Self::ancestor_scopes)
    /// returns for `node` on the current tree; the result is then identical
    /// to [`restyle`](Self::restyle).
    ///
    /// # Errors
    ///
    /// As for [`restyle`](Self::restyle).
    pub fn restyle_with_ancestors<S>(
        &self,
        tree: &StyleTree<D>,
        node: NodeId,
        ancestors: &[Scope<D>],
        sink: &mut S,
    ) -> Result<RestyleSummary, RestyleError>
    where
        S: StyleSink<D> + ?Sized,
    {
        if !tree.is_alive(node) {
            return Err(RestyleError::StaleNode(node));
        }
        self.walk(tree, node, ancestors.iter().cloned().collect(), sink)
    }

    fn walk<S>(
        &self,
        tree: &StyleTree<D>,
        root: NodeId,
        mut chain: ScopeChain<D>,
        sink: &mut S,
    ) -> Result<RestyleSummary, RestyleError>
    where
        S: StyleSink<D> + ?Sized,
    {
        struct Frame {
            node: NodeId,
            next_child: usize,
            pushed_scope: bool,
        }

        let span = tracing::debug_span!("restyle", node = %root, order = ?self.order);
        let _guard = span.enter();

        let mut summary = RestyleSummary::default();
        let mut stack: Vec<Frame> = Vec::new();
        let mut entering = Some(root);

        loop {
            if let Some(node) = entering.take() {
                // The node's own scope is visible to itself and its subtree.
                let pushed_scope = match tree.scope(node) {
                    Some(scope) => {
                        chain.push(scope.clone());
                        true
                    }
                    None => false,
                };
                summary.visited += 1;
                if self.order == DeliveryOrder::PreOrder {
                    self.deliver(tree, node, &chain, sink, &mut summary)?;
                }
                stack.push(Frame {
                    node,
                    next_child: 0,
                    pushed_scope,
                });
                continue;
            }

            let Some(frame) = stack.last_mut() else {
                break;
            };
            if let Some(&child) = tree.children(frame.node).get(frame.next_child) {
                frame.next_child += 1;
                entering = Some(child);
                continue;
            }

            let node = frame.node;
            let pushed_scope = frame.pushed_scope;
            stack.pop();
            if self.order == DeliveryOrder::PostOrder {
                self.deliver(tree, node, &chain, sink, &mut summary)?;
            }
            if pushed_scope {
                chain.pop();
            }
        }

        tracing::debug!(
            visited = summary.visited,
            delivered = summary.delivered,
            skipped = summary.skipped,
            "restyle finished"
        );
        Ok(summary)
    }

    fn deliver<S>(
        &self,
        tree: &StyleTree<D>,
        node: NodeId,
        chain: &[Scope<D>],
        sink: &mut S,
        summary: &mut RestyleSummary,
    ) -> Result<(), RestyleError>
    where
        S: StyleSink<D> + ?Sized,
    {
        if !sink.is_active(node) {
            tracing::trace!(node = %node, "inactive, skipped");
            summary.skipped += 1;
            return Ok(());
        }
        let styles = self.resolve_with_chain(tree, node, chain)?;
        tracing::trace!(node = %node, rules = styles.len(), "delivering");
        sink.deliver(node, &styles);
        summary.delivered += 1;
        Ok(())
    }
}
