use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{ApiError, Pagination, PaginationMeta};
use crate::catalog::{CameraHistoryEntry, PlayerSummary, Selection, StatisticsCatalog};
use crate::models::CameraSettings;

use super::groups::ScopeParams;

#[derive(Debug, Serialize)]
pub struct PlayerListResponse {
    pub players: Vec<String>,
    pub default_player: String,
}

pub async fn list_players(State(state): State<AppState>) -> Json<PlayerListResponse> {
    let catalog = StatisticsCatalog::new(&state.tables);
    Json(PlayerListResponse {
        players: catalog.player_names(),
        default_player: state.dashboard.default_player.clone(),
    })
}

pub async fn player_summary(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<ScopeParams>,
) -> Result<Json<PlayerSummary>, ApiError> {
    let scope = state.scope(params.groups.as_deref());
    let catalog = StatisticsCatalog::new(&state.tables);

    let mut sel = Selection::player(&name);
    if let Some(leaves) = &scope {
        sel = sel.within(leaves);
    }

    Ok(Json(catalog.player_summary(sel)?))
}

#[derive(Debug, Deserialize)]
pub struct RecentCamerasParams {
    pub limit: Option<usize>,
    pub groups: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecentCamerasResponse {
    pub player: String,
    pub cameras: Vec<CameraSettings>,
}

/// Latest distinct camera setups, rounded for display.
pub async fn recent_cameras(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<RecentCamerasParams>,
) -> Result<Json<RecentCamerasResponse>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(state.dashboard.recent_camera_limit)
        .clamp(1, 100);
    let scope = state.scope(params.groups.as_deref());
    let catalog = StatisticsCatalog::new(&state.tables);

    let mut sel = Selection::player(&name);
    if let Some(leaves) = &scope {
        sel = sel.within(leaves);
    }

    let cameras = catalog.recent_camera_settings(sel, limit)?;
    Ok(Json(RecentCamerasResponse {
        player: name,
        cameras,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CameraHistoryParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub groups: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CameraHistoryResponse {
    pub player: String,
    pub entries: Vec<CameraHistoryEntry>,
    pub pagination: PaginationMeta,
}

pub async fn camera_history(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<CameraHistoryParams>,
) -> Result<Json<CameraHistoryResponse>, ApiError> {
    let scope = state.scope(params.groups.as_deref());
    let catalog = StatisticsCatalog::new(&state.tables);

    let mut sel = Selection::player(&name);
    if let Some(leaves) = &scope {
        sel = sel.within(leaves);
    }
    let history = catalog.camera_history(sel)?;

    let pagination = Pagination::new(params.page, params.page_size);
    let meta = PaginationMeta::new(&pagination, history.len() as u32);

    Ok(Json(CameraHistoryResponse {
        player: name,
        entries: pagination.apply(history),
        pagination: meta,
    }))
}
