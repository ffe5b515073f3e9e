//! Fetch-and-reconcile orchestration.

mod report;
mod service;

pub use report::SyncReport;
pub use service::MediaSyncService;

use thiserror::Error;

use crate::clients::{ProviderError, RegistryError};
use crate::media::MediaType;
use crate::reconcile::ReconcileError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Client {client_id} does not support {media_type}")]
    Unsupported { client_id: u64, media_type: MediaType },

    #[error("Fetch from client {client_id} failed: {source}")]
    Fetch {
        client_id: u64,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("Sync cancelled")]
    Cancelled,
}
