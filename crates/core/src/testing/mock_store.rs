//! In-memory media repository for testing.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

use crate::media::{MediaData, MediaItem};
use crate::store::{MediaItemFilter, MediaItemRepository, MediaStoreError};

#[derive(Debug)]
struct State<T: MediaData> {
    items: Vec<MediaItem<T>>,
    next_id: i64,
    /// Titles whose create/update calls fail.
    failing_titles: HashSet<String>,
    fail_get_by_type: bool,
}

/// Mock implementation of [`MediaItemRepository`] for a single payload type.
///
/// Provides controllable behavior for testing:
/// - Plain in-memory storage with sequential IDs
/// - Write failures injected per item title
/// - Failure of the full-type scan used to build match indexes
#[derive(Debug)]
pub struct MockMediaStore<T: MediaData> {
    state: Mutex<State<T>>,
}

impl<T: MediaData> Default for MockMediaStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: MediaData> MockMediaStore<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: Vec::new(),
                next_id: 1,
                failing_titles: HashSet::new(),
                fail_get_by_type: false,
            }),
        }
    }

    /// Make writes of items with this title fail.
    pub fn fail_writes_for(&self, title: &str) {
        self.lock().failing_titles.insert(title.to_string());
    }

    pub fn set_fail_get_by_type(&self, fail: bool) {
        self.lock().fail_get_by_type = fail;
    }

    /// Snapshot of all stored items.
    pub fn items(&self) -> Vec<MediaItem<T>> {
        self.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State<T>> {
        // A panicking test thread must not hide the state from the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(state: &State<T>, item: &MediaItem<T>) -> Result<(), MediaStoreError> {
        if state.failing_titles.contains(&item.title) {
            return Err(MediaStoreError::Database(format!(
                "injected write failure for '{}'",
                item.title
            )));
        }
        Ok(())
    }
}

impl<T: MediaData> MediaItemRepository<T> for MockMediaStore<T> {
    fn create(&self, mut item: MediaItem<T>) -> Result<MediaItem<T>, MediaStoreError> {
        let mut state = self.lock();
        Self::check_writable(&state, &item)?;

        item.id = state.next_id;
        state.next_id += 1;
        if item.uuid.is_nil() {
            item.uuid = Uuid::new_v4();
        }
        let now = Utc::now();
        item.created_at = now;
        item.updated_at = now;
        state.items.push(item.clone());
        Ok(item)
    }

    fn update(&self, mut item: MediaItem<T>) -> Result<MediaItem<T>, MediaStoreError> {
        if !item.is_persisted() {
            return Err(MediaStoreError::InvalidItem(
                "cannot update an item without an id".to_string(),
            ));
        }
        let mut state = self.lock();
        Self::check_writable(&state, &item)?;

        let slot = state
            .items
            .iter_mut()
            .find(|existing| existing.id == item.id)
            .ok_or_else(|| MediaStoreError::NotFound(format!("media item {}", item.id)))?;
        item.updated_at = Utc::now();
        *slot = item.clone();
        Ok(item)
    }

    fn get_by_id(&self, id: i64) -> Result<MediaItem<T>, MediaStoreError> {
        self.lock()
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| MediaStoreError::NotFound(format!("media item {}", id)))
    }

    fn get_by_uuid(&self, uuid: &Uuid) -> Result<MediaItem<T>, MediaStoreError> {
        self.lock()
            .items
            .iter()
            .find(|item| &item.uuid == uuid)
            .cloned()
            .ok_or_else(|| MediaStoreError::NotFound(format!("media item {}", uuid)))
    }

    fn get_by_client_item_id(
        &self,
        client_id: u64,
        item_id: &str,
    ) -> Result<MediaItem<T>, MediaStoreError> {
        self.lock()
            .items
            .iter()
            .find(|item| item.sync_clients.contains(client_id, item_id))
            .cloned()
            .ok_or_else(|| {
                MediaStoreError::NotFound(format!("client {} item {}", client_id, item_id))
            })
    }

    fn get_by_type(&self) -> Result<Vec<MediaItem<T>>, MediaStoreError> {
        let state = self.lock();
        if state.fail_get_by_type {
            return Err(MediaStoreError::Database(
                "injected scan failure".to_string(),
            ));
        }
        Ok(state.items.clone())
    }

    fn list(&self, filter: &MediaItemFilter) -> Result<Vec<MediaItem<T>>, MediaStoreError> {
        let state = self.lock();
        let limit = if filter.limit < 0 {
            usize::MAX
        } else {
            filter.limit as usize
        };
        Ok(state
            .items
            .iter()
            .filter(|item| matches_filter(item, filter))
            .skip(filter.offset.max(0) as usize)
            .take(limit)
            .cloned()
            .collect())
    }

    fn count(&self, filter: &MediaItemFilter) -> Result<i64, MediaStoreError> {
        let state = self.lock();
        Ok(state
            .items
            .iter()
            .filter(|item| matches_filter(item, filter))
            .count() as i64)
    }

    fn delete(&self, id: i64) -> Result<MediaItem<T>, MediaStoreError> {
        let mut state = self.lock();
        let pos = state
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| MediaStoreError::NotFound(format!("media item {}", id)))?;
        Ok(state.items.remove(pos))
    }
}

fn matches_filter<T: MediaData>(item: &MediaItem<T>, filter: &MediaItemFilter) -> bool {
    let query_ok = filter.query.as_ref().map_or(true, |q| {
        item.title.to_lowercase().contains(&q.to_lowercase())
    });
    let client_ok = filter
        .client_id
        .map_or(true, |id| item.sync_clients.item_id_for(id).is_some());
    query_ok && client_ok
}
