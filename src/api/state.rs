use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::hierarchy::{GroupHierarchyIndex, LeafGroupResolver, ResolvedLeafSet};
use crate::models::Tables;

use super::parse_group_list;

#[derive(Clone)]
pub struct AppState {
    pub tables: Arc<Tables>,
    pub hierarchy: Arc<GroupHierarchyIndex>,
    pub dashboard: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(tables: Tables, hierarchy: GroupHierarchyIndex, dashboard: DashboardConfig) -> Self {
        Self {
            tables: Arc::new(tables),
            hierarchy: Arc::new(hierarchy),
            dashboard: Arc::new(dashboard),
        }
    }

    /// Resolve an optional `groups` query value to a leaf scope.
    ///
    /// Absent or blank input means "no restriction".
    pub fn scope(&self, groups: Option<&str>) -> Option<ResolvedLeafSet> {
        let seeds = parse_group_list(groups?);
        if seeds.is_empty() {
            return None;
        }
        Some(LeafGroupResolver::new(&self.hierarchy).resolve(&seeds))
    }
}
