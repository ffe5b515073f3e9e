//! In-memory match-key index over one media type.

use std::collections::HashMap;

use crate::media::{MatchKey, MediaData, MediaItem};

/// Maps match keys to the IDs of rows carrying them, lowest ID first.
#[derive(Debug, Default)]
pub struct MatchIndex {
    by_key: HashMap<MatchKey, Vec<i64>>,
    key_of: HashMap<i64, MatchKey>,
}

impl MatchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build<T: MediaData>(items: &[MediaItem<T>], require_year: bool) -> Self {
        let mut index = Self::new();
        for item in items {
            index.insert(item.id, MatchKey::for_item(item, require_year));
        }
        index
    }

    /// Candidate row IDs for a key, ascending.
    pub fn candidates(&self, key: &MatchKey) -> &[i64] {
        self.by_key.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Record the current key of a row, replacing any previous key.
    pub fn insert(&mut self, id: i64, key: Option<MatchKey>) {
        if let Some(previous) = self.key_of.remove(&id) {
            if let Some(ids) = self.by_key.get_mut(&previous) {
                ids.retain(|&existing| existing != id);
                if ids.is_empty() {
                    self.by_key.remove(&previous);
                }
            }
        }

        let Some(key) = key else {
            return;
        };
        let ids = self.by_key.entry(key.clone()).or_default();
        if let Err(pos) = ids.binary_search(&id) {
            ids.insert(pos, id);
        }
        self.key_of.insert(id, key);
    }

    /// Number of indexed rows.
    pub fn len(&self) -> usize {
        self.key_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_of.is_empty()
    }
}
