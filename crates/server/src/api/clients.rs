//! Client API handlers: listing, sync passes and pushed batches.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use suasor_core::{ClientInfo, QueryOptions, SyncReport};
use tracing::info;

use super::handlers::{parse_media_type, sync_error, ApiError};
use crate::state::AppState;

/// Response for listing clients
#[derive(Debug, Serialize)]
pub struct ListClientsResponse {
    pub clients: Vec<ClientInfo>,
    pub count: usize,
}

/// Request body for reconciling a pushed batch
#[derive(Debug, Deserialize)]
pub struct ReconcileBody {
    /// Items already adapted to the catalog model
    pub items: Vec<Value>,
}

/// List clients available for sync
pub async fn list_clients(State(state): State<Arc<AppState>>) -> Json<ListClientsResponse> {
    let clients = state.sync_service().registry().list();
    Json(ListClientsResponse {
        count: clients.len(),
        clients,
    })
}

/// Fetch one media type from a client and reconcile it into the catalog
pub async fn sync_client(
    State(state): State<Arc<AppState>>,
    Path((client_id, media_type)): Path<(u64, String)>,
    body: Option<Json<QueryOptions>>,
) -> Result<Json<SyncReport>, ApiError> {
    let media_type = parse_media_type(&media_type)?;
    let options = body.map(|Json(options)| options).unwrap_or_default();
    let cancel = state.request_token();

    info!(client_id, %media_type, "Sync requested");
    state
        .sync_service()
        .sync(client_id, media_type, &options, &cancel)
        .await
        .map(Json)
        .map_err(sync_error)
}

/// Reconcile a batch pushed by a client
pub async fn reconcile_client(
    State(state): State<Arc<AppState>>,
    Path((client_id, media_type)): Path<(u64, String)>,
    Json(body): Json<ReconcileBody>,
) -> Result<Json<SyncReport>, ApiError> {
    let media_type = parse_media_type(&media_type)?;
    let cancel = state.request_token();

    info!(client_id, %media_type, items = body.items.len(), "Pushed batch received");
    state
        .sync_service()
        .reconcile_json(client_id, media_type, body.items, &cancel)
        .map(Json)
        .map_err(sync_error)
}
