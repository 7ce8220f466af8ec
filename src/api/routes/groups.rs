use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{parse_group_list, ApiError};
use crate::catalog::{MapCount, StatisticsCatalog};
use crate::hierarchy::{LeafGroupResolver, ResolvedLeafSet};
use crate::models::GroupId;

#[derive(Debug, Deserialize)]
pub struct ScopeParams {
    pub groups: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MapCountResponse {
    pub maps: Vec<MapCount>,
    pub total_games: usize,
}

/// Games per map, optionally restricted to the leaves under `groups`.
pub async fn map_counts(
    State(state): State<AppState>,
    Query(params): Query<ScopeParams>,
) -> Result<Json<MapCountResponse>, ApiError> {
    let scope = state.scope(params.groups.as_deref());
    let catalog = StatisticsCatalog::new(&state.tables);
    let maps = catalog.map_histogram(scope.as_ref());
    let total_games = maps.iter().map(|m| m.games).sum();

    Ok(Json(MapCountResponse { maps, total_games }))
}

#[derive(Debug, Serialize)]
pub struct RootsResponse {
    pub roots: Vec<GroupId>,
}

pub async fn list_roots(State(state): State<AppState>) -> Json<RootsResponse> {
    Json(RootsResponse {
        roots: state.hierarchy.roots().to_vec(),
    })
}

#[derive(Debug, Deserialize)]
pub struct LeavesParams {
    pub seeds: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeavesResponse {
    pub seeds: Vec<GroupId>,
    /// Seeds with no rows in the hierarchy; each resolves to itself
    pub unknown_seeds: Vec<GroupId>,
    pub leaves: ResolvedLeafSet,
}

pub async fn resolve_leaves(
    State(state): State<AppState>,
    Query(params): Query<LeavesParams>,
) -> Result<Json<LeavesResponse>, ApiError> {
    let seeds = parse_group_list(params.seeds.as_deref().unwrap_or_default());
    if seeds.is_empty() {
        return Err(ApiError::BadRequest(
            "seeds must name at least one group".to_string(),
        ));
    }

    let unknown_seeds: Vec<GroupId> = seeds
        .iter()
        .filter(|s| !state.hierarchy.contains(s))
        .cloned()
        .collect();
    let leaves = LeafGroupResolver::new(&state.hierarchy).resolve(&seeds);
    Ok(Json(LeavesResponse {
        seeds,
        unknown_seeds,
        leaves,
    }))
}
