//! Cross-client reconciliation.
//!
//! A batch of items fetched from one client is merged into the catalog: items
//! the client already reported are updated, items another client reported
//! under the same title are linked, everything else is created.

mod index;
mod reconciler;
mod types;

pub use index::MatchIndex;
pub use reconciler::Reconciler;
pub use types::{
    ClientRef, FailureReason, ItemFailure, MatchPolicy, ReconcileAction, ReconcileReport,
    ReconcileSummary, ReconciledItem,
};

use thiserror::Error;

use crate::store::MediaStoreError;

/// Errors that abort a whole reconciliation batch.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Failed to load existing items: {0}")]
    IndexBuild(#[source] MediaStoreError),
}
