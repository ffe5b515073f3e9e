use std::sync::Arc;
use suasor_core::{Config, MediaSyncService, SanitizedConfig, SqliteMediaStore};
use tokio_util::sync::CancellationToken;

/// Shared application state
pub struct AppState {
    config: Config,
    sync_service: MediaSyncService<SqliteMediaStore>,
    /// Cancelled on server shutdown; every sync runs under a child token.
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, sync_service: MediaSyncService<SqliteMediaStore>) -> Self {
        Self {
            config,
            sync_service,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn sync_service(&self) -> &MediaSyncService<SqliteMediaStore> {
        &self.sync_service
    }

    pub fn store(&self) -> &Arc<SqliteMediaStore> {
        self.sync_service.store()
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Token for one request-scoped sync pass.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
