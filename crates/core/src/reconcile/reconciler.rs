//! Per-batch reconciliation of fetched items against the catalog.

use std::collections::HashSet;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::index::MatchIndex;
use super::types::{
    ClientRef, FailureReason, ItemFailure, MatchPolicy, ReconcileAction, ReconcileReport,
};
use super::ReconcileError;
use crate::media::{MatchKey, MediaData, MediaItem, SyncChange, SyncClients};
use crate::metrics;
use crate::store::{MediaItemRepository, MediaStoreError};

/// Merges client items of one media type into the shared catalog.
///
/// Items are processed sequentially in input order. Each item is written on
/// its own; there is no transaction spanning the batch, so two passes for the
/// same client running at once can both create a row for one item.
pub struct Reconciler<'a, T: MediaData> {
    store: &'a dyn MediaItemRepository<T>,
    policy: MatchPolicy,
}

impl<'a, T: MediaData> Reconciler<'a, T> {
    pub fn new(store: &'a dyn MediaItemRepository<T>, policy: MatchPolicy) -> Self {
        Self { store, policy }
    }

    /// Reconcile a batch fetched from `client`.
    ///
    /// Per-item problems are recorded in the report; only a failure to load
    /// the existing catalog aborts the batch. Items already written when the
    /// token is cancelled stay written.
    pub fn reconcile(
        &self,
        client: ClientRef,
        items: Vec<MediaItem<T>>,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport<T>, ReconcileError> {
        let media_type = T::MEDIA_TYPE.as_str();
        let started = Instant::now();
        let total = items.len();

        let mut index = match self.store.get_by_type() {
            Ok(existing) => MatchIndex::build(&existing, self.policy.require_year),
            Err(e) => {
                metrics::RECONCILE_BATCHES
                    .with_label_values(&[media_type, "aborted"])
                    .inc();
                return Err(ReconcileError::IndexBuild(e));
            }
        };

        debug!(
            client_id = client.client_id,
            media_type,
            fetched = total,
            indexed = index.len(),
            "Starting reconciliation"
        );

        // IDs this client reports in the batch; rows holding one of them
        // belong to that item and are never taken by a title match
        let batch_ids: HashSet<String> = items
            .iter()
            .filter_map(|item| item.sync_clients.item_id_for(client.client_id))
            .map(str::to_string)
            .collect();

        let mut report = ReconcileReport::new(client, total);

        for (position, item) in items.into_iter().enumerate() {
            if cancel.is_cancelled() {
                report.summary.cancelled = true;
                report.summary.unprocessed = total - position;
                warn!(
                    client_id = client.client_id,
                    media_type,
                    processed = position,
                    unprocessed = report.summary.unprocessed,
                    "Reconciliation cancelled"
                );
                break;
            }

            match self.reconcile_item(client, position, &item, &batch_ids, &mut index) {
                Ok((action, stored)) => {
                    metrics::RECONCILED_ITEMS
                        .with_label_values(&[media_type, action.as_str()])
                        .inc();
                    report.push(action, stored);
                }
                Err(failure) => {
                    metrics::RECONCILE_FAILURES
                        .with_label_values(&[media_type, failure.reason.as_str()])
                        .inc();
                    report.fail(failure);
                }
            }
        }

        let result = if report.is_cancelled() {
            "cancelled"
        } else {
            "completed"
        };
        metrics::RECONCILE_BATCHES
            .with_label_values(&[media_type, result])
            .inc();
        metrics::RECONCILE_DURATION
            .with_label_values(&[media_type])
            .observe(started.elapsed().as_secs_f64());

        let summary = &report.summary;
        info!(
            client_id = client.client_id,
            media_type,
            fetched = summary.fetched,
            created = summary.created,
            updated = summary.updated,
            linked = summary.linked,
            skipped = summary.skipped,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Reconciliation finished"
        );

        Ok(report)
    }

    fn reconcile_item(
        &self,
        client: ClientRef,
        position: usize,
        item: &MediaItem<T>,
        batch_ids: &HashSet<String>,
        index: &mut MatchIndex,
    ) -> Result<(ReconcileAction, MediaItem<T>), ItemFailure> {
        let failure = |client_item_id: Option<&str>, reason: FailureReason, message: String| {
            ItemFailure {
                position,
                client_item_id: client_item_id.map(str::to_string),
                title: item.title.clone(),
                reason,
                message,
            }
        };

        if !item.has_consistent_type() {
            warn!(
                position,
                title = %item.title,
                declared = %item.media_type,
                expected = %T::MEDIA_TYPE,
                "Skipping item with mismatched type"
            );
            return Err(failure(
                item.sync_clients.item_id_for(client.client_id),
                FailureReason::TypeMismatch,
                format!("declared {}, expected {}", item.media_type, T::MEDIA_TYPE),
            ));
        }

        let Some(item_id) = item.sync_clients.item_id_for(client.client_id) else {
            warn!(
                position,
                client_id = client.client_id,
                title = %item.title,
                "Skipping item without client item ID"
            );
            return Err(failure(
                None,
                FailureReason::MissingClientId,
                format!("no item id for client {}", client.client_id),
            ));
        };

        let store_failure = |e: MediaStoreError| {
            warn!(position, item_id, title = %item.title, error = %e, "Failed to reconcile item");
            failure(Some(item_id), FailureReason::Store, e.to_string())
        };

        let (action, target) = match self.store.get_by_client_item_id(client.client_id, item_id) {
            Ok(existing) => (ReconcileAction::Updated, Some(existing)),
            Err(e) if e.is_not_found() => match self.find_candidate(client, item_id, item, batch_ids, index) {
                Ok(Some(candidate)) => (ReconcileAction::Linked, Some(candidate)),
                Ok(None) => (ReconcileAction::Created, None),
                Err(e) => return Err(store_failure(e)),
            },
            Err(e) => return Err(store_failure(e)),
        };

        let result = match target {
            Some(mut existing) => {
                existing.overwrite_from(item);
                let change =
                    existing
                        .sync_clients
                        .upsert(client.client_id, client.client_type, item_id);
                if let SyncChange::Relinked { previous_item_id } = change {
                    info!(
                        id = existing.id,
                        client_id = client.client_id,
                        previous_item_id = %previous_item_id,
                        item_id,
                        "Client item ID changed, relinking"
                    );
                }
                self.store.update(existing)
            }
            None => {
                let mut fresh = item.clone();
                fresh.id = 0;
                fresh.sync_clients =
                    SyncClients::single(client.client_id, client.client_type, item_id);
                self.store.create(fresh)
            }
        };

        let stored = result.map_err(store_failure)?;
        index.insert(stored.id, self.key_for(&stored));
        debug!(
            id = stored.id,
            item_id,
            action = action.as_str(),
            "Reconciled item"
        );
        Ok((action, stored))
    }

    /// Pick the row a fetched item should be linked to, if any.
    ///
    /// Rows this client knows under another ID from the same batch are
    /// skipped, and so are candidates with conflicting external IDs. A
    /// candidate confirmed by a shared external ID beats unconfirmed ones;
    /// otherwise the oldest row wins. A row whose ID for this client is not
    /// in the batch is relinked in place.
    fn find_candidate(
        &self,
        client: ClientRef,
        item_id: &str,
        item: &MediaItem<T>,
        batch_ids: &HashSet<String>,
        index: &MatchIndex,
    ) -> Result<Option<MediaItem<T>>, MediaStoreError> {
        let Some(key) = self.key_for(item) else {
            return Ok(None);
        };
        let fetched_ids = &item.data.details().external_ids;

        let mut unconfirmed = Vec::new();
        for &id in index.candidates(&key) {
            let candidate = match self.store.get_by_id(id) {
                Ok(candidate) => candidate,
                // Deleted since the index was built
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };

            if let Some(owner) = candidate.sync_clients.item_id_for(client.client_id) {
                if owner != item_id && batch_ids.contains(owner) {
                    debug!(
                        id,
                        item_id,
                        owner,
                        title = %item.title,
                        "Rejecting title match held by another item of this batch"
                    );
                    continue;
                }
            }

            if self.policy.trust_external_ids {
                let known_ids = &candidate.data.details().external_ids;
                if known_ids.conflicts_with(fetched_ids) {
                    debug!(
                        id,
                        title = %item.title,
                        "Rejecting title match with conflicting external IDs"
                    );
                    continue;
                }
                if known_ids.agrees_with(fetched_ids) {
                    return Ok(Some(candidate));
                }
            }
            unconfirmed.push(candidate);
        }

        if unconfirmed.len() > 1 {
            let ids: Vec<i64> = unconfirmed.iter().map(|c| c.id).collect();
            warn!(
                title = %item.title,
                candidates = ?ids,
                chosen = ids[0],
                "Ambiguous title match, linking to the oldest item"
            );
        }
        Ok(unconfirmed.into_iter().next())
    }

    fn key_for(&self, item: &MediaItem<T>) -> Option<MatchKey> {
        MatchKey::for_item(item, self.policy.require_year)
    }
}
