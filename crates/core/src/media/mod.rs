//! Internal media model shared by every client adapter.

mod item;
mod match_key;
mod payload;
mod types;

pub use item::{MediaItem, MAX_CLIENT_ID, SyncChange, SyncClient, SyncClients};
pub use match_key::{normalize_title, MatchKey};
pub use payload::{
    Album, Artist, Collection, Episode, MediaData, Movie, Playlist, Season, Series, Track,
};
pub use types::{
    Artwork, ClientCategory, ClientType, ExternalIds, MediaDetails, MediaType,
};
