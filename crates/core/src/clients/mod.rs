//! External client contract.
//!
//! Vendor adapters implement [`MediaClient`] and expose what they can serve
//! through typed capability queries. Nothing here talks to a vendor API; the
//! adapters plug in through [`ClientRegistry`] factories.

mod registry;
mod types;

pub use registry::{ClientFactory, ClientRegistry, ClientRegistryBuilder, RegistryError};
pub use types::{ClientCapabilities, ClientInfo, QueryOptions};

use async_trait::async_trait;
use thiserror::Error;

use crate::media::{Album, Artist, ClientType, Episode, MediaItem, MediaType, Movie, Season, Series, Track};

/// Errors that can occur when talking to an external client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Credentials rejected by the client.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The client cannot serve this media type.
    #[error("Client {client_id} does not support {media_type}")]
    Unsupported { client_id: u64, media_type: MediaType },

    /// Client not configured (missing URL, API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Movie capability.
#[async_trait]
pub trait MovieProvider: Send + Sync {
    async fn get_movies(&self, options: &QueryOptions)
        -> Result<Vec<MediaItem<Movie>>, ProviderError>;

    async fn get_movie(&self, item_id: &str) -> Result<MediaItem<Movie>, ProviderError>;

    async fn search_movies(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<Movie>>, ProviderError>;
}

/// TV capability.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    async fn get_series(&self, options: &QueryOptions)
        -> Result<Vec<MediaItem<Series>>, ProviderError>;

    async fn get_series_by_id(&self, item_id: &str) -> Result<MediaItem<Series>, ProviderError>;

    async fn get_seasons(&self, series_id: &str) -> Result<Vec<MediaItem<Season>>, ProviderError>;

    async fn get_episodes(
        &self,
        series_id: &str,
        season_number: u32,
    ) -> Result<Vec<MediaItem<Episode>>, ProviderError>;

    async fn search_series(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<Series>>, ProviderError>;
}

/// Music capability.
#[async_trait]
pub trait MusicProvider: Send + Sync {
    async fn get_tracks(&self, options: &QueryOptions)
        -> Result<Vec<MediaItem<Track>>, ProviderError>;

    async fn get_albums(&self, options: &QueryOptions)
        -> Result<Vec<MediaItem<Album>>, ProviderError>;

    async fn get_artists(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<Artist>>, ProviderError>;

    /// Search tracks by text.
    async fn search_music(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<Track>>, ProviderError>;
}

/// A connected external client.
///
/// Capabilities are answered by the `as_*` queries; an adapter advertises a
/// capability by returning itself from the matching query.
#[async_trait]
pub trait MediaClient: Send + Sync {
    fn client_id(&self) -> u64;

    fn client_type(&self) -> ClientType;

    /// Human-readable name, used for logging.
    fn name(&self) -> &str;

    /// Check that the client is reachable and credentials are accepted.
    async fn test_connection(&self) -> Result<(), ProviderError>;

    fn as_movie_provider(&self) -> Option<&dyn MovieProvider> {
        None
    }

    fn as_series_provider(&self) -> Option<&dyn SeriesProvider> {
        None
    }

    fn as_music_provider(&self) -> Option<&dyn MusicProvider> {
        None
    }

    fn capabilities(&self) -> ClientCapabilities {
        ClientCapabilities {
            movies: self.as_movie_provider().is_some(),
            series: self.as_series_provider().is_some(),
            music: self.as_music_provider().is_some(),
        }
    }

    fn info(&self) -> ClientInfo {
        ClientInfo {
            client_id: self.client_id(),
            client_type: self.client_type(),
            name: self.name().to_string(),
            capabilities: self.capabilities(),
        }
    }
}
