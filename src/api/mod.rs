//! REST API endpoints.
//!
//! Read-only axum API over one loaded snapshot: player statistics, map
//! counts and group hierarchy resolution.

pub mod routes;
pub mod state;

use axum::{
    http::{header::InvalidHeaderValue, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::calculate::AggregateError;
use crate::catalog::CatalogError;
use crate::join::JoinError;
use crate::models::GroupId;

use self::state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    #[error("No data: {0}")]
    EmptyInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Join(JoinError::UnknownPlayer(name)) => ApiError::UnknownPlayer(name),
            CatalogError::Aggregate(e @ AggregateError::EmptyInput { .. }) => {
                ApiError::EmptyInput(e.to_string())
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::UnknownPlayer(_) => (StatusCode::NOT_FOUND, "UNKNOWN_PLAYER"),
            ApiError::EmptyInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_INPUT"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Pagination parameters.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(50).clamp(1, 100),
        }
    }

    /// Saturates for pages far past the end.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }

    /// The slice of `items` on this page.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.page_size as usize)
            .collect()
    }
}

/// Pagination metadata in responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u32) -> Self {
        let total_pages = total_items.div_ceil(pagination.page_size);
        Self {
            page: pagination.page,
            page_size: pagination.page_size,
            total_items,
            total_pages,
            has_next: pagination.page < total_pages,
            has_prev: pagination.page > 1,
        }
    }
}

/// Split a comma-separated list of group ids, dropping blanks.
pub fn parse_group_list(raw: &str) -> Vec<GroupId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(GroupId::from)
        .collect()
}

/// CORS policy for the configured origin; `*` allows any.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    let layer = CorsLayer::new().allow_methods([Method::GET]);
    if origin == "*" {
        Ok(layer.allow_origin(Any))
    } else {
        Ok(layer.allow_origin(origin.parse::<HeaderValue>()?))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/players", get(routes::players::list_players))
        .route(
            "/api/players/:name/summary",
            get(routes::players::player_summary),
        )
        .route(
            "/api/players/:name/cameras",
            get(routes::players::recent_cameras),
        )
        .route(
            "/api/players/:name/cameras/history",
            get(routes::players::camera_history),
        )
        .route("/api/maps", get(routes::groups::map_counts))
        .route("/api/groups/roots", get(routes::groups::list_roots))
        .route("/api/groups/leaves", get(routes::groups::resolve_leaves))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
