//! Reconciliation inputs and report types.

use serde::{Deserialize, Serialize};

use crate::config::ReconcileConfig;
use crate::media::{ClientType, MediaData, MediaItem, MediaType};

/// The client a batch was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRef {
    pub client_id: u64,
    pub client_type: ClientType,
}

impl ClientRef {
    pub fn new(client_id: u64, client_type: ClientType) -> Self {
        Self {
            client_id,
            client_type,
        }
    }
}

/// How fallback title matches are decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    /// Skip title matching for items with neither a year nor a discriminator.
    pub require_year: bool,
    /// Veto conflicting candidates and prefer confirmed ones.
    pub trust_external_ids: bool,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            require_year: true,
            trust_external_ids: true,
        }
    }
}

impl From<ReconcileConfig> for MatchPolicy {
    fn from(config: ReconcileConfig) -> Self {
        Self {
            require_year: config.require_year,
            trust_external_ids: config.trust_external_ids,
        }
    }
}

/// What happened to one fetched item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    /// New row.
    Created,
    /// Row already known under this client's item ID.
    Updated,
    /// Existing row found by title match, client entry added or relinked.
    Linked,
}

impl ReconcileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileAction::Created => "created",
            ReconcileAction::Updated => "updated",
            ReconcileAction::Linked => "linked",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "T: MediaData"))]
pub struct ReconciledItem<T: MediaData> {
    pub action: ReconcileAction,
    pub item: MediaItem<T>,
}

/// Why an item is missing from the report's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No usable item ID for the batch's client.
    MissingClientId,
    /// Declared type disagrees with the payload type.
    TypeMismatch,
    /// A lookup or write failed.
    Store,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::MissingClientId => "missing_client_id",
            FailureReason::TypeMismatch => "type_mismatch",
            FailureReason::Store => "store",
        }
    }

    /// Data-shape problems count as skips, storage problems as failures.
    pub fn is_skip(&self) -> bool {
        !matches!(self, FailureReason::Store)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Index in the input batch.
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_item_id: Option<String>,
    pub title: String,
    pub reason: FailureReason,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub linked: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Items never looked at because the batch was cancelled.
    pub unprocessed: usize,
    pub cancelled: bool,
}

/// Outcome of one reconciliation batch.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "T: MediaData"))]
pub struct ReconcileReport<T: MediaData> {
    pub media_type: MediaType,
    pub client: ClientRef,
    pub entries: Vec<ReconciledItem<T>>,
    pub failures: Vec<ItemFailure>,
    pub summary: ReconcileSummary,
}

impl<T: MediaData> ReconcileReport<T> {
    pub(crate) fn new(client: ClientRef, fetched: usize) -> Self {
        Self {
            media_type: T::MEDIA_TYPE,
            client,
            entries: Vec::with_capacity(fetched),
            failures: Vec::new(),
            summary: ReconcileSummary {
                fetched,
                ..Default::default()
            },
        }
    }

    pub(crate) fn push(&mut self, action: ReconcileAction, item: MediaItem<T>) {
        match action {
            ReconcileAction::Created => self.summary.created += 1,
            ReconcileAction::Updated => self.summary.updated += 1,
            ReconcileAction::Linked => self.summary.linked += 1,
        }
        self.entries.push(ReconciledItem { action, item });
    }

    pub(crate) fn fail(&mut self, failure: ItemFailure) {
        if failure.reason.is_skip() {
            self.summary.skipped += 1;
        } else {
            self.summary.failed += 1;
        }
        self.failures.push(failure);
    }

    /// Persisted items, in input order.
    pub fn items(&self) -> impl Iterator<Item = &MediaItem<T>> {
        self.entries.iter().map(|e| &e.item)
    }

    pub fn into_items(self) -> Vec<MediaItem<T>> {
        self.entries.into_iter().map(|e| e.item).collect()
    }

    pub fn is_cancelled(&self) -> bool {
        self.summary.cancelled
    }
}
