use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use suasor_core::{MediaStoreError, MediaType, RegistryError, SanitizedConfig, SyncError};
use tracing::error;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error body shared by all API handlers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Parse a `{media_type}` path segment.
pub fn parse_media_type(raw: &str) -> Result<MediaType, ApiError> {
    raw.parse::<MediaType>()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))
}

pub fn store_error(e: MediaStoreError) -> ApiError {
    match e {
        MediaStoreError::NotFound(_) => api_error(StatusCode::NOT_FOUND, e.to_string()),
        MediaStoreError::InvalidItem(_) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        _ => {
            error!(error = %e, "Storage failure");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub fn sync_error(e: SyncError) -> ApiError {
    let status = match &e {
        SyncError::Registry(RegistryError::ClientNotFound(_)) => StatusCode::NOT_FOUND,
        SyncError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SyncError::Unsupported { .. } | SyncError::InvalidBatch(_) => StatusCode::BAD_REQUEST,
        SyncError::Fetch { .. } => StatusCode::BAD_GATEWAY,
        SyncError::Reconcile(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SyncError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    };
    if status.is_server_error() {
        error!(error = %e, "Sync failed");
    }
    api_error(status, e.to_string())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus text exposition.
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use suasor_core::ProviderError;

    #[test]
    fn test_sync_error_status_mapping() {
        let cases = [
            (
                SyncError::Registry(RegistryError::ClientNotFound(3)),
                StatusCode::NOT_FOUND,
            ),
            (
                SyncError::Unsupported {
                    client_id: 3,
                    media_type: MediaType::Track,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                SyncError::Fetch {
                    client_id: 3,
                    source: ProviderError::RateLimitExceeded,
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                SyncError::InvalidBatch("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(sync_error(error).0, expected);
        }
    }

    #[test]
    fn test_store_error_status_mapping() {
        assert_eq!(
            store_error(MediaStoreError::NotFound("media item 9".to_string())).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            store_error(MediaStoreError::Database("locked".to_string())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_parse_media_type_rejects_unknown() {
        assert_eq!(parse_media_type("Movie").unwrap(), MediaType::Movie);
        assert_eq!(parse_media_type("podcast").unwrap_err().0, StatusCode::BAD_REQUEST);
    }
}
