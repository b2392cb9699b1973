// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Cascade: scoped style-sheet resolution over a tree of nodes.
//!
//! Each node of a [`StyleTree`] may own a [`Scope`] (an ordered set of
//! [`Rule`]s) and a single override [`Rule`]. For every node, the resolver
//! computes the ordered list of rules that apply to it and delivers that list
//! to a [`StyleSink`], which is responsible for actually applying styling.
//!
//! The resolved list is ordered from lowest to highest precedence:
//!
//! **Global scope → farthest ancestor scope → … → nearest ancestor scope → own scope → override**
//!
//! ## Core Concepts
//!
//! ### Rules
//!
//! A [`Rule`] pairs a [`Matcher`] with an opaque declaration payload. The
//! matcher scores the rule against a node; a [`Specificity`] of `0` means the
//! rule does not apply. Rules are `Rc`-backed and immutable, so resolved
//! lists hold cheap handles rather than copies.
//!
//! Matchers come in three forms: [`Matcher::Always`], a [`Selector`] over the
//! node's type tag, style classes and pseudoclasses, or a custom (possibly
//! fallible) function.
//!
//! ### Scopes
//!
//! A [`Scope`] is an ordered collection of rules. Within one scope, matching
//! rules are sorted by ascending specificity, and equal scores keep their
//! authoring order. A scope's matches are never interleaved with another
//! scope's: a nearer scope always follows a farther one.
//!
//! ### Resolution
//!
//! [`CascadeCx`] carries the global scope and drives resolution. A restyle
//! pass may start at any node; it collects the node's ancestor scopes fresh
//! and then walks the subtree, delivering to each node the sink reports as
//! active.
//!
//! ```rust
//! use understory_cascade::{
//!     CascadeCx, ClassId, PseudoClassId, RecordingSink, Rule, ScopeBuilder, Selector,
//!     StyleTree, TypeTag,
//! };
//!
//! const BUTTON: TypeTag = TypeTag(1);
//! const PRIMARY: ClassId = ClassId(1);
//! const HOVER: PseudoClassId = PseudoClassId(1);
//!
//! // Application-wide defaults.
//! let button = Rule::with_selector(Selector::of_type(BUTTON), "button");
//! let global = ScopeBuilder::new().rule(button.clone()).build();
//!
//! let mut tree = StyleTree::new();
//! let window = tree.add_root();
//! let ok = tree.add_child(window).unwrap();
//! tree.set_type_tag(ok, Some(BUTTON));
//! tree.set_classes(ok, [PRIMARY]);
//!
//! // The window's sheet refines primary buttons, and hovered ones even more.
//! let primary = Rule::with_selector(Selector::with_classes([PRIMARY]), "primary");
//! let hovered = Rule::with_selector(
//!     Selector {
//!         required_pseudos: [HOVER].into_iter().collect(),
//!         ..Selector::with_classes([PRIMARY])
//!     },
//!     "primary:hover",
//! );
//! let sheet = ScopeBuilder::new()
//!     .rule(hovered.clone())
//!     .rule(primary.clone())
//!     .build();
//! tree.set_scope(window, Some(sheet));
//!
//! let cx = CascadeCx::new().with_global(Some(&global));
//! let mut sink = RecordingSink::new();
//! sink.activate(ok);
//!
//! cx.restyle(&tree, window, &mut sink).unwrap();
//! assert_eq!(sink.styles(ok), Some(&[button.clone(), primary.clone()][..]));
//!
//! // State changed: restyle just the affected node.
//! tree.set_pseudos(ok, [HOVER]);
//! cx.restyle(&tree, ok, &mut sink).unwrap();
//! assert_eq!(sink.styles(ok), Some(&[button, primary, hovered][..]));
//! ```
//!
//! ## Errors
//!
//! A failing custom predicate aborts the pass with [`RestyleError::Match`].
//! Deliveries already made are not undone, and nothing is retried.
//!
//! ## Logging
//!
//! Each pass opens a `tracing` debug span; deliveries and skips are traced.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. The default `std` feature only
//! enables `std` support in `tracing`.

#![no_std]

extern crate alloc;

mod resolve;
mod rule;
mod scope;
mod selector;
mod sink;
mod tree;

pub use resolve::{CascadeCx, DeliveryOrder, RestyleError, RestyleSummary, ScopeChain};
pub use rule::{MatchError, MatchFn, MatchTarget, Matcher, Rule};
pub use scope::{Scope, ScopeBuilder};
pub use selector::{ClassId, IdSet, PseudoClassId, Selector, SelectorInputs, Specificity, TypeTag};
pub use sink::{RecordingSink, StyleSink};
pub use tree::{Ancestors, NodeId, StyleTree};
