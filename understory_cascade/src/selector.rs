// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selector inputs and the built-in selector predicate.
//!
//! Selectors are single-node predicates over a [`SelectorInputs`] snapshot
//! (no combinators). Rules that need more than this can use
//! [`Matcher::Custom`](crate::Matcher::Custom).

use alloc::boxed::Box;
use alloc::vec::Vec;

/// How strongly a rule applies to a node.
///
/// `0` is reserved for "does not apply"; any other value is a match. Higher
/// values sort later within a scope and therefore take precedence when the
/// sink applies the resolved list.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(pub u32);

impl Specificity {
    /// The "no match" score.
    pub const NONE: Self = Self(0);

    /// Returns `true` if this score denotes a match.
    #[must_use]
    #[inline]
    pub const fn is_match(self) -> bool {
        self.0 != 0
    }
}

/// A stable identifier for a node "type" in selectors.
///
/// This is application-defined (e.g. `Button`, `Label`, `Window`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeTag(pub u32);

/// A stable identifier for a user-defined style class (e.g. `.primary`).
///
/// Class IDs are application-defined and intentionally unbounded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub u32);

/// A stable identifier for a pseudoclass (e.g. `:hover`, `:focus`).
///
/// Pseudoclass IDs are application-defined and intentionally unbounded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PseudoClassId(pub u32);

/// Sorted, deduplicated IDs required by a [`Selector`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdSet<T>(Box<[T]>);

impl<T> Default for IdSet<T> {
    fn default() -> Self {
        Self(Box::default())
    }
}

impl<T: Copy + Ord> IdSet<T> {
    /// Collects `ids` into a set, dropping duplicates.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = T>) -> Self {
        let mut ids: Vec<T> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids.into_boxed_slice())
    }

    /// The IDs in ascending order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// `present` must be sorted.
    fn is_covered_by(&self, present: &[T]) -> bool {
        let mut present = present.iter();
        self.0.iter().all(|id| present.find(|p| *p >= id) == Some(id))
    }
}

impl<T: Copy + Ord> FromIterator<T> for IdSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

/// A borrowed snapshot of the styling-relevant state of a single node.
///
/// The `classes` and `pseudos` slices must be sorted and deduplicated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SelectorInputs<'a> {
    /// Optional type tag for the node.
    pub type_tag: Option<TypeTag>,
    /// Sorted, unique class IDs.
    pub classes: &'a [ClassId],
    /// Sorted, unique pseudoclass IDs.
    pub pseudos: &'a [PseudoClassId],
}

impl SelectorInputs<'static> {
    /// Empty selector inputs (no type, classes, or pseudos).
    pub const EMPTY: Self = Self {
        type_tag: None,
        classes: &[],
        pseudos: &[],
    };
}

impl<'a> SelectorInputs<'a> {
    /// Constructs selector inputs from borrowed slices.
    ///
    /// # Panics (debug only)
    ///
    /// Panics in debug builds if the slices are not sorted and deduplicated.
    #[must_use]
    pub fn new(
        type_tag: Option<TypeTag>,
        classes: &'a [ClassId],
        pseudos: &'a [PseudoClassId],
    ) -> Self {
        debug_assert!(
            is_sorted_unique(classes),
            "`classes` must be sorted and unique"
        );
        debug_assert!(
            is_sorted_unique(pseudos),
            "`pseudos` must be sorted and unique"
        );
        Self {
            type_tag,
            classes,
            pseudos,
        }
    }
}

/// A selector predicate over [`SelectorInputs`].
///
/// The default selector has no requirements and matches every node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    /// Optional type tag predicate.
    pub type_tag: Option<TypeTag>,
    /// Required class IDs.
    pub required_classes: IdSet<ClassId>,
    /// Required pseudoclass IDs.
    pub required_pseudos: IdSet<PseudoClassId>,
}

impl Selector {
    /// A selector requiring only the given type tag.
    #[must_use]
    pub fn of_type(tag: TypeTag) -> Self {
        Self {
            type_tag: Some(tag),
            ..Self::default()
        }
    }

    /// A selector requiring only the given classes.
    #[must_use]
    pub fn with_classes(classes: impl IntoIterator<Item = ClassId>) -> Self {
        Self {
            required_classes: IdSet::from_ids(classes),
            ..Self::default()
        }
    }

    /// Returns `true` if this selector matches the given inputs.
    #[must_use]
    pub fn matches(&self, inputs: &SelectorInputs<'_>) -> bool {
        if let Some(required) = self.type_tag
            && inputs.type_tag != Some(required)
        {
            return false;
        }
        self.required_classes.is_covered_by(inputs.classes)
            && self.required_pseudos.is_covered_by(inputs.pseudos)
    }

    /// Returns the packed specificity of this selector.
    ///
    /// Pseudoclass count outranks class count, which outranks type tag
    /// presence. Counts saturate at 255 per bucket. The result is never
    /// [`Specificity::NONE`]: the universal selector scores `1`.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        let type_score = u32::from(self.type_tag.is_some());
        let classes = bucket(self.required_classes.as_slice().len());
        let pseudos = bucket(self.required_pseudos.as_slice().len());
        Specificity(1 + type_score + (classes << 8) + (pseudos << 16))
    }

    /// Returns [`Selector::specificity`] if the inputs match, otherwise
    /// [`Specificity::NONE`].
    #[must_use]
    pub fn match_inputs(&self, inputs: &SelectorInputs<'_>) -> Specificity {
        if self.matches(inputs) {
            self.specificity()
        } else {
            Specificity::NONE
        }
    }
}

fn bucket(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX).min(0xFF)
}

fn is_sorted_unique<T: Ord>(slice: &[T]) -> bool {
    slice.windows(2).all(|w| w[0] < w[1])
}
