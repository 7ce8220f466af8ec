//! Seed-to-leaf resolution over a [`GroupHierarchyIndex`].

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;
use tracing::debug;

use super::GroupHierarchyIndex;
use crate::models::GroupId;

/// Leaf groups reachable from a seed set. Built once, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedLeafSet(BTreeSet<GroupId>);

impl ResolvedLeafSet {
    pub fn contains(&self, group: &GroupId) -> bool {
        self.0.contains(group)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Leaves in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &GroupId> {
        self.0.iter()
    }

    /// Union of two resolved sets.
    pub fn union(&self, other: &ResolvedLeafSet) -> ResolvedLeafSet {
        ResolvedLeafSet(self.0.union(&other.0).cloned().collect())
    }
}

impl FromIterator<GroupId> for ResolvedLeafSet {
    fn from_iter<I: IntoIterator<Item = GroupId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ResolvedLeafSet {
    type Item = GroupId;
    type IntoIter = std::collections::btree_set::IntoIter<GroupId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Descends from seed groups to the terminal groups beneath them.
///
/// Termination relies on the index having rejected cycles at build time.
#[derive(Debug, Clone, Copy)]
pub struct LeafGroupResolver<'a> {
    index: &'a GroupHierarchyIndex,
}

impl<'a> LeafGroupResolver<'a> {
    pub fn new(index: &'a GroupHierarchyIndex) -> Self {
        Self { index }
    }

    /// All leaves reachable from any of `seeds`.
    ///
    /// A seed with no children (or no rows at all) is itself a leaf.
    pub fn resolve<'s, I>(&self, seeds: I) -> ResolvedLeafSet
    where
        I: IntoIterator<Item = &'s GroupId>,
    {
        let mut worklist: VecDeque<&GroupId> = VecDeque::new();
        let mut leaves: BTreeSet<GroupId> = BTreeSet::new();
        let mut visited = 0usize;

        for seed in seeds {
            worklist.push_back(seed);
        }

        while let Some(group) = worklist.pop_front() {
            visited += 1;
            let children = self.index.children_of(group);
            if children.is_empty() {
                leaves.insert(group.clone());
            } else {
                worklist.extend(children);
            }
        }

        debug!("Resolved {} leaves after {} visits", leaves.len(), visited);
        ResolvedLeafSet(leaves)
    }
}
