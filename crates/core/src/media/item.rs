//! The generic media item container and its client identity map.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::payload::MediaData;
use super::types::{ClientType, MediaType};

/// Largest client ID the catalog can index. IDs are stored as SQLite integers.
pub const MAX_CLIENT_ID: u64 = i64::MAX as u64;

/// One external client's handle on a media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncClient {
    pub client_id: u64,
    pub client_type: ClientType,
    /// Identifier meaningful only inside that client's namespace.
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// What [`SyncClients::upsert`] did to the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncChange {
    /// First entry for this client.
    Added,
    /// The client already knew the item under another ID.
    Relinked { previous_item_id: String },
    /// Same client and item ID; only the sync timestamp moved.
    Unchanged,
}

/// Ordered list of client handles, at most one per client ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SyncClient>", into = "Vec<SyncClient>")]
pub struct SyncClients(Vec<SyncClient>);

impl SyncClients {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Map holding exactly one entry.
    pub fn single(client_id: u64, client_type: ClientType, item_id: impl Into<String>) -> Self {
        let mut clients = Self::new();
        clients.upsert(client_id, client_type, item_id);
        clients
    }

    pub fn get(&self, client_id: u64) -> Option<&SyncClient> {
        self.0.iter().find(|c| c.client_id == client_id)
    }

    /// Item ID for `client_id`, ignoring blank IDs.
    pub fn item_id_for(&self, client_id: u64) -> Option<&str> {
        self.get(client_id)
            .map(|c| c.item_id.as_str())
            .filter(|id| !id.trim().is_empty())
    }

    pub fn contains(&self, client_id: u64, item_id: &str) -> bool {
        self.item_id_for(client_id) == Some(item_id)
    }

    /// Add or update the entry for `client_id`, keeping its position.
    pub fn upsert(
        &mut self,
        client_id: u64,
        client_type: ClientType,
        item_id: impl Into<String>,
    ) -> SyncChange {
        let item_id = item_id.into();
        let now = Some(Utc::now());

        match self.0.iter_mut().find(|c| c.client_id == client_id) {
            Some(existing) => {
                existing.client_type = client_type;
                existing.last_synced_at = now;
                if existing.item_id == item_id {
                    SyncChange::Unchanged
                } else {
                    let previous_item_id = std::mem::replace(&mut existing.item_id, item_id);
                    SyncChange::Relinked { previous_item_id }
                }
            }
            None => {
                self.0.push(SyncClient {
                    client_id,
                    client_type,
                    item_id,
                    last_synced_at: now,
                });
                SyncChange::Added
            }
        }
    }

    pub fn remove(&mut self, client_id: u64) -> Option<SyncClient> {
        let pos = self.0.iter().position(|c| c.client_id == client_id)?;
        Some(self.0.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyncClient> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<SyncClient>> for SyncClients {
    type Error = String;

    fn try_from(entries: Vec<SyncClient>) -> Result<Self, Self::Error> {
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.client_id == entry.client_id) {
                return Err(format!(
                    "duplicate sync client entry for client {}",
                    entry.client_id
                ));
            }
        }
        Ok(Self(entries))
    }
}

impl From<SyncClients> for Vec<SyncClient> {
    fn from(clients: SyncClients) -> Self {
        clients.0
    }
}

/// A client-independent media entity wrapping a typed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: MediaData"))]
pub struct MediaItem<T: MediaData> {
    /// Database ID, `0` until persisted.
    #[serde(default)]
    pub id: i64,
    #[serde(default = "Uuid::nil")]
    pub uuid: Uuid,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub sync_clients: SyncClients,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    pub data: T,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl<T: MediaData> MediaItem<T> {
    /// Wrap a payload, copying its title and release info onto the item.
    pub fn new(data: T) -> Self {
        let details = data.details();
        let now = Utc::now();
        Self {
            id: 0,
            uuid: Uuid::nil(),
            media_type: T::MEDIA_TYPE,
            title: details.title.clone(),
            release_year: details.year(),
            release_date: details.release_date,
            sync_clients: SyncClients::new(),
            stream_url: None,
            download_url: None,
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style helper used by adapters: record this client's handle.
    pub fn with_client(
        mut self,
        client_id: u64,
        client_type: ClientType,
        item_id: impl Into<String>,
    ) -> Self {
        self.sync_clients.upsert(client_id, client_type, item_id);
        self
    }

    pub fn with_stream_url(mut self, url: impl Into<String>) -> Self {
        self.stream_url = Some(url.into());
        self
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// Whether the declared type tag matches the payload type.
    pub fn has_consistent_type(&self) -> bool {
        self.media_type == T::MEDIA_TYPE
    }

    /// Overwrite descriptive fields and payload from a fresher copy.
    ///
    /// Identity (ID, UUID, created_at) and the client map stay untouched.
    /// External IDs already known on `self` fill gaps in the incoming payload.
    pub fn overwrite_from(&mut self, fresh: &MediaItem<T>) {
        let known_ids = self.data.details().external_ids.clone();

        self.data = fresh.data.clone();
        self.data.details_mut().external_ids.fill_from(&known_ids);
        self.title = fresh.title.clone();
        self.release_year = fresh.release_year;
        self.release_date = fresh.release_date;
        self.stream_url = fresh.stream_url.clone();
        self.download_url = fresh.download_url.clone();
    }
}
