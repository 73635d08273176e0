//! Ordered label sets describing the triangles of one object.
//!
//! A `LabelSet` is kept sorted and duplicate-free so that iteration order,
//! and everything derived from it, is deterministic.

use std::collections::BTreeSet;

use crate::topology::point::TriLabel;

/// Ordered set of unique triangle labels.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct LabelSet {
    labels: BTreeSet<TriLabel>,
}

impl LabelSet {
    /// Creates an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding a single label.
    pub fn singleton(label: TriLabel) -> Self {
        let mut out = Self::new();
        out.insert(label);
        out
    }

    /// Inserts `label`; returns `true` if it was not already present.
    pub fn insert(&mut self, label: TriLabel) -> bool {
        self.labels.insert(label)
    }

    /// Removes `label`; returns `true` if it was present.
    pub fn remove(&mut self, label: TriLabel) -> bool {
        self.labels.remove(&label)
    }

    pub fn contains(&self, label: TriLabel) -> bool {
        self.labels.contains(&label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Smallest label, if any.
    pub fn first(&self) -> Option<TriLabel> {
        self.labels.first().copied()
    }

    /// Iterates labels in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = TriLabel> + '_ {
        self.labels.iter().copied()
    }

    /// Adds every label of `other` to `self`.
    pub fn union_with(&mut self, other: &LabelSet) {
        self.labels.extend(other.labels.iter().copied());
    }

    /// Returns true when the two sets have at least one label in common.
    pub fn intersects(&self, other: &LabelSet) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().any(|l| large.contains(l))
    }

    /// Labels present in both sets, ascending.
    pub fn intersection(&self, other: &LabelSet) -> Vec<TriLabel> {
        self.labels.intersection(&other.labels).copied().collect()
    }

    /// Returns the labels as a sorted vector.
    pub fn to_vec(&self) -> Vec<TriLabel> {
        self.iter().collect()
    }
}

impl FromIterator<TriLabel> for LabelSet {
    fn from_iter<I: IntoIterator<Item = TriLabel>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

impl Extend<TriLabel> for LabelSet {
    fn extend<I: IntoIterator<Item = TriLabel>>(&mut self, iter: I) {
        self.labels.extend(iter);
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = TriLabel;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, TriLabel>>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter().copied()
    }
}
