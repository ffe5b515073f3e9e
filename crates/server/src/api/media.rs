//! Catalog API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use suasor_core::{
    Album, Artist, Collection, Episode, MediaData, MediaItemFilter, MediaItemRepository,
    MediaType, Movie, Playlist, Season, Series, SqliteMediaStore, Track,
};
use tracing::info;

use super::handlers::{api_error, parse_media_type, store_error, ApiError};
use crate::state::AppState;

/// Maximum allowed limit for media queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for media queries
const DEFAULT_LIMIT: i64 = 100;

/// Run a generic store function for the payload type matching `media_type`.
macro_rules! for_media_type {
    ($media_type:expr, $func:ident($($arg:expr),*)) => {
        match $media_type {
            MediaType::Movie => $func::<Movie>($($arg),*),
            MediaType::Series => $func::<Series>($($arg),*),
            MediaType::Season => $func::<Season>($($arg),*),
            MediaType::Episode => $func::<Episode>($($arg),*),
            MediaType::Track => $func::<Track>($($arg),*),
            MediaType::Album => $func::<Album>($($arg),*),
            MediaType::Artist => $func::<Artist>($($arg),*),
            MediaType::Playlist => $func::<Playlist>($($arg),*),
            MediaType::Collection => $func::<Collection>($($arg),*),
        }
    };
}

/// Query parameters for listing media items
#[derive(Debug, Deserialize)]
pub struct ListMediaParams {
    /// Substring match on the title
    pub query: Option<String>,
    /// Only items known to this client
    pub client_id: Option<u64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response for listing media items
#[derive(Debug, Serialize)]
pub struct ListMediaResponse {
    pub media_type: MediaType,
    pub items: Vec<Value>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

fn to_json<S: Serialize>(value: &S) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

fn list_typed<T: MediaData>(
    store: &SqliteMediaStore,
    filter: &MediaItemFilter,
) -> Result<(Vec<Value>, i64), ApiError> {
    let items = MediaItemRepository::<T>::list(store, filter).map_err(store_error)?;
    let count_filter = MediaItemFilter {
        limit: -1,
        offset: 0,
        ..filter.clone()
    };
    let total = MediaItemRepository::<T>::count(store, &count_filter).map_err(store_error)?;
    let items = items.iter().map(to_json).collect::<Result<Vec<_>, _>>()?;
    Ok((items, total))
}

fn get_typed<T: MediaData>(store: &SqliteMediaStore, id: i64) -> Result<Value, ApiError> {
    let item = MediaItemRepository::<T>::get_by_id(store, id).map_err(store_error)?;
    to_json(&item)
}

fn delete_typed<T: MediaData>(store: &SqliteMediaStore, id: i64) -> Result<Value, ApiError> {
    let item = MediaItemRepository::<T>::delete(store, id).map_err(store_error)?;
    to_json(&item)
}

/// List catalog items of one media type
pub async fn list_media(
    State(state): State<Arc<AppState>>,
    Path(media_type): Path<String>,
    Query(params): Query<ListMediaParams>,
) -> Result<Json<ListMediaResponse>, ApiError> {
    let media_type = parse_media_type(&media_type)?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = MediaItemFilter::new().with_limit(limit).with_offset(offset);
    if let Some(query) = params.query.filter(|q| !q.trim().is_empty()) {
        filter = filter.with_query(query);
    }
    if let Some(client_id) = params.client_id {
        filter = filter.with_client_id(client_id);
    }

    let store = &**state.store();
    let (items, total) = for_media_type!(media_type, list_typed(store, &filter))?;

    Ok(Json(ListMediaResponse {
        media_type,
        items,
        total,
        limit,
        offset,
    }))
}

/// Get one catalog item
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path((media_type, id)): Path<(String, i64)>,
) -> Result<Json<Value>, ApiError> {
    let media_type = parse_media_type(&media_type)?;
    let store = &**state.store();
    for_media_type!(media_type, get_typed(store, id)).map(Json)
}

/// Delete one catalog item
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    Path((media_type, id)): Path<(String, i64)>,
) -> Result<Json<Value>, ApiError> {
    let media_type = parse_media_type(&media_type)?;
    let store = &**state.store();
    let deleted = for_media_type!(media_type, delete_typed(store, id))?;
    info!(%media_type, id, "Deleted media item");
    Ok(Json(deleted))
}
