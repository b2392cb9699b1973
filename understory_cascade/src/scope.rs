// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scoped style sheets.
//!
//! A [`Scope`] is an ordered collection of [`Rule`]s owned by one node of a
//! [`StyleTree`](crate::StyleTree), or supplied as the global scope through
//! [`CascadeCx`](crate::CascadeCx).

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

use crate::rule::{MatchError, MatchTarget, Rule};
use crate::selector::Specificity;

struct ScopeData<D> {
    rules: Vec<Rule<D>>,
}

/// An ordered collection of style rules.
///
/// Rule order is authoring order. It only matters as the tie-break between
/// rules of equal specificity.
///
/// `Scope` is immutable after creation. Use [`ScopeBuilder`] to construct
/// instances. Clones are cheap and share the same rules.
pub struct Scope<D> {
    inner: Rc<ScopeData<D>>,
}

impl<D> Scope<D> {
    /// Returns the number of rules in this scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.rules.len()
    }

    /// Returns `true` if this scope has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.rules.is_empty()
    }

    /// Returns an iterator over rules in authoring order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule<D>> + '_ {
        self.inner.rules.iter()
    }

    /// Returns the rule at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Rule<D>> {
        self.inner.rules.get(index)
    }

    /// Returns `true` if both handles refer to the same scope.
    #[must_use]
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Appends the rules of this scope that match `target` to `out`.
    ///
    /// Rules scoring [`Specificity::NONE`] are dropped. The rest are appended
    /// in ascending specificity; equal scores keep authoring order.
    ///
    /// # Errors
    ///
    /// Returns the first predicate failure. Nothing is appended in that case.
    pub fn matching(
        &self,
        target: &MatchTarget<'_>,
        out: &mut Vec<Rule<D>>,
    ) -> Result<(), MatchError> {
        let mut matches: SmallVec<[(Specificity, &Rule<D>); 8]> = SmallVec::new();
        for rule in &self.inner.rules {
            let specificity = rule.specificity_for(target)?;
            if specificity.is_match() {
                matches.push((specificity, rule));
            }
        }
        // Stable sort: ties stay in authoring order.
        matches.sort_by_key(|(specificity, _)| *specificity);
        out.extend(matches.into_iter().map(|(_, rule)| rule.clone()));
        Ok(())
    }
}

impl<D> Clone for Scope<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D> Default for Scope<D> {
    fn default() -> Self {
        ScopeBuilder::new().build()
    }
}

impl<D> PartialEq for Scope<D> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<D> Eq for Scope<D> {}

impl<D: fmt::Debug> fmt::Debug for Scope<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("rules", &self.inner.rules)
            .finish()
    }
}

/// Builder for constructing [`Scope`] instances.
///
/// # Example
///
/// ```rust
/// use understory_cascade::{Rule, ScopeBuilder, Selector, TypeTag};
///
/// const BUTTON: TypeTag = TypeTag(1);
///
/// let scope = ScopeBuilder::new()
///     .rule(Rule::with_selector(Selector::default(), "base"))
///     .rule(Rule::with_selector(Selector::of_type(BUTTON), "button"))
///     .build();
///
/// assert_eq!(scope.len(), 2);
/// assert_eq!(scope.get(1).map(|r| *r.declaration()), Some("button"));
/// ```
pub struct ScopeBuilder<D> {
    rules: Vec<Rule<D>>,
}

impl<D> ScopeBuilder<D> {
    /// Creates a new empty scope builder.
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Appends a rule.
    #[must_use]
    pub fn rule(mut self, rule: Rule<D>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends several rules, in iteration order.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule<D>>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Builds the scope.
    #[must_use]
    pub fn build(self) -> Scope<D> {
        Scope {
            inner: Rc::new(ScopeData { rules: self.rules }),
        }
    }
}

impl<D> Default for ScopeBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: fmt::Debug> fmt::Debug for ScopeBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeBuilder")
            .field("rules", &self.rules)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{ClassId, IdSet, PseudoClassId, Selector, SelectorInputs, TypeTag};
    use crate::tree::NodeId;
    use alloc::vec;

    fn fixed(score: u32, name: &'static str) -> Rule<&'static str> {
        Rule::custom(move |_| Ok(Specificity(score)), name)
    }

    fn names(rules: &[Rule<&'static str>]) -> Vec<&'static str> {
        rules.iter().map(|r| *r.declaration()).collect()
    }

    fn target(inputs: SelectorInputs<'_>) -> MatchTarget<'_> {
        MatchTarget {
            node: NodeId::new(0, 1),
            inputs,
        }
    }

    #[test]
    fn matching_sorts_by_specificity_then_authoring_order() {
        let scope = ScopeBuilder::new()
            .rule(fixed(3, "a"))
            .rule(fixed(1, "b"))
            .rule(fixed(3, "c"))
            .rule(fixed(2, "d"))
            .rule(fixed(1, "e"))
            .build();

        let mut out = Vec::new();
        scope
            .matching(&target(SelectorInputs::EMPTY), &mut out)
            .unwrap();
        assert_eq!(names(&out), vec!["b", "e", "d", "a", "c"]);
    }

    #[test]
    fn matching_drops_zero_specificity() {
        let scope = ScopeBuilder::new()
            .rule(fixed(0, "never"))
            .rule(fixed(5, "five"))
            .build();

        let mut out = Vec::new();
        scope
            .matching(&target(SelectorInputs::EMPTY), &mut out)
            .unwrap();
        assert_eq!(names(&out), vec!["five"]);
    }

    #[test]
    fn matching_with_selectors() {
        let hover = Selector {
            type_tag: Some(TypeTag(1)),
            required_classes: IdSet::default(),
            required_pseudos: IdSet::from_ids([PseudoClassId(1)]),
        };
        let scope = ScopeBuilder::new()
            .rule(Rule::with_selector(hover, "hover"))
            .rule(Rule::with_selector(
                Selector::with_classes([ClassId(4)]),
                "class",
            ))
            .rule(Rule::with_selector(Selector::default(), "base"))
            .build();

        let classes = [ClassId(4)];
        let pseudos = [PseudoClassId(1)];
        let inputs = SelectorInputs::new(Some(TypeTag(1)), &classes, &pseudos);
        let mut out = Vec::new();
        scope.matching(&target(inputs), &mut out).unwrap();
        assert_eq!(names(&out), vec!["base", "class", "hover"]);

        let plain = SelectorInputs::new(Some(TypeTag(1)), &[], &[]);
        out.clear();
        scope.matching(&target(plain), &mut out).unwrap();
        assert_eq!(names(&out), vec!["base"]);
    }

    #[test]
    fn matching_appends_after_existing_entries() {
        let scope = ScopeBuilder::new().rule(fixed(1, "late")).build();
        let early = fixed(9, "early");
        let mut out = vec![early.clone()];
        scope
            .matching(&target(SelectorInputs::EMPTY), &mut out)
            .unwrap();
        assert_eq!(names(&out), vec!["early", "late"]);
        assert_eq!(out[0], early);
    }

    #[test]
    fn matching_failure_appends_nothing() {
        let scope = ScopeBuilder::new()
            .rule(fixed(1, "ok"))
            .rule(Rule::custom(|_| Err(MatchError::new("bad")), "bad"))
            .build();
        let mut out = Vec::new();
        let err = scope
            .matching(&target(SelectorInputs::EMPTY), &mut out)
            .unwrap_err();
        assert_eq!(err.message(), "bad");
        assert!(
            out.is_empty(),
            "a failed scope must not leak partial matches"
        );
    }

    #[test]
    fn clone_shares_rules() {
        let scope: Scope<()> = ScopeBuilder::new().rule(Rule::always(())).build();
        let copy = scope.clone();
        assert!(scope.ptr_eq(&copy));
        assert!(!scope.ptr_eq(&Scope::default()));
        assert!(Scope::<()>::default().is_empty());
    }
}
