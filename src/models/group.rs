//! Event/series grouping edges.

use serde::{Deserialize, Serialize};

use super::GroupId;

/// One row of the groups table.
///
/// A parent with no children is stored as a single row whose `child_group`
/// is `None`. That row is a marker, not a missing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEdge {
    pub parent_group: GroupId,
    pub child_group: Option<GroupId>,
}

impl GroupEdge {
    /// An edge from `parent` down to `child`.
    pub fn new(parent: impl Into<GroupId>, child: impl Into<GroupId>) -> Self {
        Self {
            parent_group: parent.into(),
            child_group: Some(child.into()),
        }
    }

    /// The "no children" marker row for `parent`.
    pub fn childless(parent: impl Into<GroupId>) -> Self {
        Self {
            parent_group: parent.into(),
            child_group: None,
        }
    }
}
