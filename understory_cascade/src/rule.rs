// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style rules and their matching capability.

use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;

use crate::selector::{Selector, SelectorInputs, Specificity};
use crate::tree::NodeId;

/// What a rule's predicate is evaluated against.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MatchTarget<'a> {
    /// The node being styled.
    pub node: NodeId,
    /// The node's styling-relevant state.
    pub inputs: SelectorInputs<'a>,
}

/// Error returned when a rule predicate fails instead of producing a score.
#[derive(Clone, PartialEq, Eq)]
pub struct MatchError {
    message: String,
}

impl MatchError {
    /// Creates a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatchError({:?})", self.message)
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule predicate failed: {}", self.message)
    }
}

impl core::error::Error for MatchError {}

/// Signature of a custom rule predicate.
pub type MatchFn = dyn Fn(&MatchTarget<'_>) -> Result<Specificity, MatchError>;

/// The matching predicate of a [`Rule`].
#[derive(Clone)]
pub enum Matcher {
    /// Matches every node with specificity `1`.
    Always,
    /// Matches via a [`Selector`].
    Selector(Selector),
    /// Matches via an arbitrary, possibly fallible, function.
    Custom(Rc<MatchFn>),
}

impl Matcher {
    /// Evaluates the predicate against `target`.
    ///
    /// # Errors
    ///
    /// Returns the [`MatchError`] produced by a [`Matcher::Custom`] predicate.
    pub fn evaluate(&self, target: &MatchTarget<'_>) -> Result<Specificity, MatchError> {
        match self {
            Self::Always => Ok(Specificity(1)),
            Self::Selector(selector) => Ok(selector.match_inputs(&target.inputs)),
            Self::Custom(f) => f(target),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Selector(selector) => f.debug_tuple("Selector").field(selector).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

struct RuleData<D> {
    matcher: Matcher,
    declaration: D,
}

/// An immutable style rule: a matching predicate plus a declaration payload.
///
/// The payload `D` is opaque to the resolver; only the sink interprets it.
///
/// `Rule` wraps an `Rc`, so clones are cheap and refer to the same rule.
/// Equality is identity: two rules are equal only if they are clones of one
/// another, even when their payloads compare equal.
///
/// # Example
///
/// ```rust
/// use understory_cascade::{ClassId, Rule, Selector};
///
/// let primary = Rule::with_selector(Selector::with_classes([ClassId(1)]), "primary");
/// let copy = primary.clone();
/// assert_eq!(primary, copy);
/// assert_ne!(primary, Rule::with_selector(Selector::default(), "primary"));
/// ```
pub struct Rule<D> {
    inner: Rc<RuleData<D>>,
}

impl<D> Rule<D> {
    /// Creates a rule from a matcher and a declaration.
    #[must_use]
    pub fn new(matcher: Matcher, declaration: D) -> Self {
        Self {
            inner: Rc::new(RuleData {
                matcher,
                declaration,
            }),
        }
    }

    /// Creates a rule that matches every node.
    ///
    /// This is the usual shape for a node's override rule, whose predicate
    /// is never consulted.
    #[must_use]
    pub fn always(declaration: D) -> Self {
        Self::new(Matcher::Always, declaration)
    }

    /// Creates a selector-based rule.
    #[must_use]
    pub fn with_selector(selector: Selector, declaration: D) -> Self {
        Self::new(Matcher::Selector(selector), declaration)
    }

    /// Creates a rule with a custom predicate.
    #[must_use]
    pub fn custom<F>(predicate: F, declaration: D) -> Self
    where
        F: Fn(&MatchTarget<'_>) -> Result<Specificity, MatchError> + 'static,
    {
        Self::new(Matcher::Custom(Rc::new(predicate)), declaration)
    }

    /// Returns the matcher.
    #[must_use]
    pub fn matcher(&self) -> &Matcher {
        &self.inner.matcher
    }

    /// Returns the declaration payload.
    #[must_use]
    pub fn declaration(&self) -> &D {
        &self.inner.declaration
    }

    /// Scores this rule against `target`.
    ///
    /// # Errors
    ///
    /// Propagates predicate failures.
    #[inline]
    pub fn specificity_for(&self, target: &MatchTarget<'_>) -> Result<Specificity, MatchError> {
        self.inner.matcher.evaluate(target)
    }

    /// Returns `true` if both handles refer to the same rule.
    #[must_use]
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<D> Clone for Rule<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D> PartialEq for Rule<D> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<D> Eq for Rule<D> {}

impl<D: fmt::Debug> fmt::Debug for Rule<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("matcher", &self.inner.matcher)
            .field("declaration", &self.inner.declaration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{ClassId, TypeTag};

    fn target(inputs: SelectorInputs<'_>) -> MatchTarget<'_> {
        MatchTarget {
            node: NodeId::new(0, 1),
            inputs,
        }
    }

    #[test]
    fn always_matches_everything() {
        let rule = Rule::always(());
        assert_eq!(
            rule.specificity_for(&target(SelectorInputs::EMPTY)),
            Ok(Specificity(1))
        );
    }

    #[test]
    fn selector_rule_scores_by_selector() {
        let rule = Rule::with_selector(Selector::of_type(TypeTag(7)), ());
        let hit = SelectorInputs::new(Some(TypeTag(7)), &[], &[]);
        let miss = SelectorInputs::new(Some(TypeTag(8)), &[], &[]);
        assert_eq!(rule.specificity_for(&target(hit)), Ok(Specificity(2)));
        assert_eq!(rule.specificity_for(&target(miss)), Ok(Specificity::NONE));
    }

    #[test]
    fn custom_predicate_sees_target() {
        let rule = Rule::custom(
            |t| {
                let count = t.inputs.classes.len();
                Ok(Specificity(u32::try_from(count).unwrap_or(0)))
            },
            (),
        );
        let classes = [ClassId(1), ClassId(2)];
        let inputs = SelectorInputs::new(None, &classes, &[]);
        assert_eq!(rule.specificity_for(&target(inputs)), Ok(Specificity(2)));
    }

    #[test]
    fn custom_predicate_failure_is_returned() {
        let rule = Rule::custom(|_| Err(MatchError::new("boom")), ());
        let err = rule
            .specificity_for(&target(SelectorInputs::EMPTY))
            .unwrap_err();
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn equality_is_identity() {
        let a = Rule::always(1_u8);
        let b = Rule::always(1_u8);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.declaration(), b.declaration());
    }
}
