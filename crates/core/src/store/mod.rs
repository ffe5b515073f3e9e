//! Media item persistence.
//!
//! One SQLite table holds every media type; payloads live in a JSON column and
//! the client identity map in a JSON array column.

mod sqlite;

pub use sqlite::SqliteMediaStore;

use thiserror::Error;

use crate::media::{
    Album, Artist, Collection, Episode, MediaData, MediaItem, MediaType, Movie, Playlist, Season,
    Series, Track,
};

/// Errors for media item persistence.
#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: MediaType,
        found: String,
    },

    #[error("Invalid item: {0}")]
    InvalidItem(String),
}

impl MediaStoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MediaStoreError::NotFound(_))
    }
}

/// Filter for listing media items of one type.
#[derive(Debug, Clone)]
pub struct MediaItemFilter {
    /// Substring matched against the title.
    pub query: Option<String>,
    /// Restrict to items known to this client.
    pub client_id: Option<u64>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for MediaItemFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaItemFilter {
    pub fn new() -> Self {
        Self {
            query: None,
            client_id: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_client_id(mut self, client_id: u64) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Repository over media items carrying payload `T`.
///
/// The media type is implied by `T`; rows of other types are invisible.
pub trait MediaItemRepository<T: MediaData>: Send + Sync {
    /// Insert a new item. Assigns the ID, a UUID if nil, and timestamps.
    fn create(&self, item: MediaItem<T>) -> Result<MediaItem<T>, MediaStoreError>;

    /// Replace a persisted item. Bumps `updated_at`.
    fn update(&self, item: MediaItem<T>) -> Result<MediaItem<T>, MediaStoreError>;

    fn get_by_id(&self, id: i64) -> Result<MediaItem<T>, MediaStoreError>;

    fn get_by_uuid(&self, uuid: &uuid::Uuid) -> Result<MediaItem<T>, MediaStoreError>;

    /// Find the item a client knows under `item_id`.
    fn get_by_client_item_id(
        &self,
        client_id: u64,
        item_id: &str,
    ) -> Result<MediaItem<T>, MediaStoreError>;

    /// All items of this media type, oldest first.
    fn get_by_type(&self) -> Result<Vec<MediaItem<T>>, MediaStoreError>;

    fn list(&self, filter: &MediaItemFilter) -> Result<Vec<MediaItem<T>>, MediaStoreError>;

    fn count(&self, filter: &MediaItemFilter) -> Result<i64, MediaStoreError>;

    /// Permanently delete an item, returning it.
    fn delete(&self, id: i64) -> Result<MediaItem<T>, MediaStoreError>;
}

/// A store holding every media type.
pub trait MediaStore:
    MediaItemRepository<Movie>
    + MediaItemRepository<Series>
    + MediaItemRepository<Season>
    + MediaItemRepository<Episode>
    + MediaItemRepository<Track>
    + MediaItemRepository<Album>
    + MediaItemRepository<Artist>
    + MediaItemRepository<Playlist>
    + MediaItemRepository<Collection>
{
}

impl<S> MediaStore for S where
    S: MediaItemRepository<Movie>
        + MediaItemRepository<Series>
        + MediaItemRepository<Season>
        + MediaItemRepository<Episode>
        + MediaItemRepository<Track>
        + MediaItemRepository<Album>
        + MediaItemRepository<Artist>
        + MediaItemRepository<Playlist>
        + MediaItemRepository<Collection>
{
}
