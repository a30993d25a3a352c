//! # Option Value Kinds
//!
//! Every typed option belongs to one of three merge kinds:
//!
//! | Kind | Holder | Merge |
//! |------|--------|-------|
//! | scalar-with-default | [`OptionValue<T>`] | later explicit value wins |
//! | monotonic-max | [`MonotonicOption`] | larger value wins once either side is set |
//! | accumulating-list | [`AccumulatingList<T>`] | first's items, then second's |
//!
//! Merging never mutates its inputs; it returns a fresh holder.

use serde::{Deserialize, Serialize};

/// Merge kind of an option, for introspection and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    Override,
    MonotonicMax,
    Accumulate,
}

// =============================================================================
// SCALAR WITH DEFAULT
// =============================================================================

/// A scalar option: current value, default, and whether it was set explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionValue<T> {
    value: T,
    default: T,
    was_set: bool,
}

impl<T: Clone> OptionValue<T> {
    /// A holder at its default, not explicitly set.
    #[must_use]
    pub fn new(default: T) -> Self {
        Self {
            value: default.clone(),
            default,
            was_set: false,
        }
    }

    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    #[must_use]
    pub fn default_value(&self) -> &T {
        &self.default
    }

    #[must_use]
    pub fn was_set(&self) -> bool {
        self.was_set
    }

    /// Set the value and mark it explicit.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.was_set = true;
    }

    /// `second` layered on `first`.
    ///
    /// The explicit value of `second` wins, then the explicit value of
    /// `first`, then the default. `was_set` follows the winning side.
    #[must_use]
    pub fn merged(first: &Self, second: &Self) -> Self {
        let mut result = Self::new(first.default.clone());
        if second.was_set {
            result.set(second.value.clone());
        } else if first.was_set {
            result.set(first.value.clone());
        }
        result
    }
}

// =============================================================================
// MONOTONIC MAX
// =============================================================================

/// An `i64` option with an "unset" sentinel that only ever moves forward
/// when layered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonotonicOption {
    inner: OptionValue<i64>,
}

impl MonotonicOption {
    /// A holder whose default is the unset sentinel.
    #[must_use]
    pub fn new(unset: i64) -> Self {
        Self {
            inner: OptionValue::new(unset),
        }
    }

    #[must_use]
    pub fn value(&self) -> i64 {
        *self.inner.value()
    }

    #[must_use]
    pub fn was_set(&self) -> bool {
        self.inner.was_set()
    }

    /// True while the value still equals the unset sentinel.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.value() == *self.inner.default_value()
    }

    pub fn set(&mut self, value: i64) {
        self.inner.set(value);
    }

    /// Override merge first, then the max rule when either side is not at
    /// the sentinel.
    #[must_use]
    pub fn merged(first: &Self, second: &Self) -> Self {
        let mut result = Self {
            inner: OptionValue::merged(&first.inner, &second.inner),
        };
        if !first.is_unset() || !second.is_unset() {
            result.set(first.value().max(second.value()));
        }
        result
    }
}

// =============================================================================
// ACCUMULATING LIST
// =============================================================================

/// An ordered list that concatenates on merge, without deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatingList<T> {
    items: Vec<T>,
}

impl<T> Default for AccumulatingList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Clone> AccumulatingList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `first`'s items followed by `second`'s.
    #[must_use]
    pub fn merged(first: &Self, second: &Self) -> Self {
        let mut items = Vec::with_capacity(first.items.len() + second.items.len());
        items.extend(first.items.iter().cloned());
        items.extend(second.items.iter().cloned());
        Self { items }
    }
}
