//! Group hierarchy.
//!
//! Events are organised as a forest: an event group contains stage groups,
//! which contain series groups, and so on. The groups table stores this as
//! flat parent/child rows. This module turns those rows into a child lookup
//! and resolves seed groups down to the series (leaf) groups beneath them.

mod resolver;

pub use resolver::*;

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{GroupEdge, GroupId};

/// Errors raised while indexing the group relation.
#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("Malformed group hierarchy: cycle through group {group}")]
    MalformedHierarchy { group: GroupId },
}

/// Child lookup built once from the groups table.
#[derive(Debug, Clone, Default)]
pub struct GroupHierarchyIndex {
    children: HashMap<GroupId, Vec<GroupId>>,
    roots: Vec<GroupId>,
}

impl GroupHierarchyIndex {
    /// Index `edges`, rejecting any cycle.
    ///
    /// Sentinel rows register their parent with no children. Repeated
    /// parent/child rows collapse into one child entry.
    pub fn build(edges: &[GroupEdge]) -> Result<Self, HierarchyError> {
        let mut children: HashMap<GroupId, Vec<GroupId>> = HashMap::new();
        let mut seen_edges: HashSet<(&GroupId, &GroupId)> = HashSet::new();
        let mut parent_count: HashMap<&GroupId, u32> = HashMap::new();

        let mut graph: DiGraph<&GroupId, ()> = DiGraph::new();
        let mut nodes: HashMap<&GroupId, NodeIndex> = HashMap::new();

        for edge in edges {
            let parent = &edge.parent_group;
            let parent_idx = *nodes
                .entry(parent)
                .or_insert_with(|| graph.add_node(parent));
            let entry = children.entry(parent.clone()).or_default();

            let Some(child) = edge.child_group.as_ref() else {
                continue;
            };

            if !seen_edges.insert((parent, child)) {
                debug!("Duplicate group edge {} -> {}", parent, child);
                continue;
            }

            entry.push(child.clone());
            *parent_count.entry(child).or_default() += 1;

            let child_idx = *nodes.entry(child).or_insert_with(|| graph.add_node(child));
            graph.add_edge(parent_idx, child_idx, ());
        }

        // Self-loops are reported as cycles too.
        if let Err(cycle) = toposort(&graph, None) {
            let group = graph[cycle.node_id()].clone();
            return Err(HierarchyError::MalformedHierarchy { group });
        }

        for (child, count) in &parent_count {
            if *count > 1 {
                warn!("Group {} has {} parents", child, count);
            }
        }

        let mut roots: Vec<GroupId> = children
            .keys()
            .filter(|g| !parent_count.contains_key(g))
            .cloned()
            .collect();
        roots.sort();

        debug!(
            "Indexed {} group edges: {} parents, {} roots",
            edges.len(),
            children.len(),
            roots.len()
        );

        Ok(Self { children, roots })
    }

    /// Direct, non-sentinel children of `parent`.
    ///
    /// Empty when `parent` has only a sentinel row or no rows at all.
    pub fn children_of(&self, parent: &GroupId) -> &[GroupId] {
        self.children
            .get(parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Groups that appear as a parent but never as a child, sorted.
    pub fn roots(&self) -> &[GroupId] {
        &self.roots
    }

    /// Whether `group` has at least one row as a parent.
    pub fn contains(&self, group: &GroupId) -> bool {
        self.children.contains_key(group)
    }

    /// Number of distinct parent groups.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
