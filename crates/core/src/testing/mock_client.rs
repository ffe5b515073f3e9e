//! Mock media client for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::clients::{
    ClientCapabilities, MediaClient, MovieProvider, MusicProvider, ProviderError, QueryOptions,
    SeriesProvider,
};
use crate::media::{
    Album, Artist, ClientType, Episode, MediaData, MediaItem, Movie, Season, Series, Track,
};

/// A recorded provider call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Provider method name, e.g. `"get_movies"`.
    pub operation: String,
    /// Options passed to list and search calls.
    pub options: Option<QueryOptions>,
    /// Item or series ID passed to lookup calls.
    pub target: Option<String>,
    pub timestamp: Instant,
}

/// Mock implementation of the client traits.
///
/// Provides controllable behavior for testing:
/// - Return configurable items per media type
/// - Track provider calls for assertions
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// use suasor_core::testing::{fixtures, MockMediaClient};
///
/// let client = MockMediaClient::new(1, ClientType::Plex);
/// client.set_movies(vec![fixtures::movie_from(1, ClientType::Plex, "p100", "Dune", 2021)]).await;
///
/// let movies = client.as_movie_provider().unwrap().get_movies(&QueryOptions::new()).await?;
/// assert_eq!(movies.len(), 1);
/// assert_eq!(client.recorded_calls().await[0].operation, "get_movies");
/// ```
pub struct MockMediaClient {
    client_id: u64,
    client_type: ClientType,
    name: String,
    capabilities: ClientCapabilities,
    movies: Arc<RwLock<Vec<MediaItem<Movie>>>>,
    series: Arc<RwLock<Vec<MediaItem<Series>>>>,
    /// Seasons keyed by series item ID.
    seasons: Arc<RwLock<HashMap<String, Vec<MediaItem<Season>>>>>,
    /// Episodes keyed by series item ID and season number.
    episodes: Arc<RwLock<HashMap<(String, u32), Vec<MediaItem<Episode>>>>>,
    tracks: Arc<RwLock<Vec<MediaItem<Track>>>>,
    albums: Arc<RwLock<Vec<MediaItem<Album>>>>,
    artists: Arc<RwLock<Vec<MediaItem<Artist>>>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    /// If set, the next provider call will fail with this error.
    next_error: Arc<RwLock<Option<ProviderError>>>,
    /// If false, test_connection fails.
    reachable: Arc<RwLock<bool>>,
}

impl std::fmt::Debug for MockMediaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockMediaClient")
            .field("client_id", &self.client_id)
            .field("client_type", &self.client_type)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl MockMediaClient {
    /// Create a mock client advertising every capability.
    pub fn new(client_id: u64, client_type: ClientType) -> Self {
        Self {
            client_id,
            client_type,
            name: format!("mock-{}-{}", client_type, client_id),
            capabilities: ClientCapabilities {
                movies: true,
                series: true,
                music: true,
            },
            movies: Arc::new(RwLock::new(Vec::new())),
            series: Arc::new(RwLock::new(Vec::new())),
            seasons: Arc::new(RwLock::new(HashMap::new())),
            episodes: Arc::new(RwLock::new(HashMap::new())),
            tracks: Arc::new(RwLock::new(Vec::new())),
            albums: Arc::new(RwLock::new(Vec::new())),
            artists: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            reachable: Arc::new(RwLock::new(true)),
        }
    }

    /// Restrict the advertised capabilities.
    pub fn with_capabilities(mut self, capabilities: ClientCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub async fn set_movies(&self, movies: Vec<MediaItem<Movie>>) {
        *self.movies.write().await = movies;
    }

    pub async fn set_series(&self, series: Vec<MediaItem<Series>>) {
        *self.series.write().await = series;
    }

    pub async fn set_seasons(&self, series_id: &str, seasons: Vec<MediaItem<Season>>) {
        self.seasons
            .write()
            .await
            .insert(series_id.to_string(), seasons);
    }

    pub async fn set_episodes(
        &self,
        series_id: &str,
        season_number: u32,
        episodes: Vec<MediaItem<Episode>>,
    ) {
        self.episodes
            .write()
            .await
            .insert((series_id.to_string(), season_number), episodes);
    }

    pub async fn set_tracks(&self, tracks: Vec<MediaItem<Track>>) {
        *self.tracks.write().await = tracks;
    }

    pub async fn set_albums(&self, albums: Vec<MediaItem<Album>>) {
        *self.albums.write().await = albums;
    }

    pub async fn set_artists(&self, artists: Vec<MediaItem<Artist>>) {
        *self.artists.write().await = artists;
    }

    /// Make the next provider call fail.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_reachable(&self, reachable: bool) {
        *self.reachable.write().await = reachable;
    }

    /// Get recorded provider calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    async fn record(
        &self,
        operation: &str,
        options: Option<&QueryOptions>,
        target: Option<&str>,
    ) -> Result<(), ProviderError> {
        self.calls.write().await.push(RecordedCall {
            operation: operation.to_string(),
            options: options.cloned(),
            target: target.map(str::to_string),
            timestamp: Instant::now(),
        });

        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn list<T: MediaData>(
        &self,
        operation: &str,
        source: &RwLock<Vec<MediaItem<T>>>,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<T>>, ProviderError> {
        self.record(operation, Some(options), None).await?;
        Ok(page(source.read().await.iter(), options))
    }

    async fn search<T: MediaData>(
        &self,
        operation: &str,
        source: &RwLock<Vec<MediaItem<T>>>,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<T>>, ProviderError> {
        self.record(operation, Some(options), None).await?;
        let query = options.query.as_deref().unwrap_or_default().to_lowercase();
        let items = source.read().await;
        let matching = items
            .iter()
            .filter(|item| item.title.to_lowercase().contains(&query))
            .filter(|item| options.year.is_none() || item.release_year == options.year);
        Ok(page(matching, options))
    }

    async fn find<T: MediaData>(
        &self,
        operation: &str,
        source: &RwLock<Vec<MediaItem<T>>>,
        item_id: &str,
    ) -> Result<MediaItem<T>, ProviderError> {
        self.record(operation, None, Some(item_id)).await?;
        source
            .read()
            .await
            .iter()
            .find(|item| item.sync_clients.contains(self.client_id, item_id))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("{} {}", T::MEDIA_TYPE, item_id)))
    }
}

fn page<'a, T: MediaData>(
    items: impl Iterator<Item = &'a MediaItem<T>>,
    options: &QueryOptions,
) -> Vec<MediaItem<T>> {
    let limit = options.limit.map(|l| l as usize).unwrap_or(usize::MAX);
    items
        .skip(options.offset as usize)
        .take(limit)
        .cloned()
        .collect()
}

#[async_trait]
impl MediaClient for MockMediaClient {
    fn client_id(&self) -> u64 {
        self.client_id
    }

    fn client_type(&self) -> ClientType {
        self.client_type
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        if *self.reachable.read().await {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(format!(
                "{} is unreachable",
                self.name
            )))
        }
    }

    fn as_movie_provider(&self) -> Option<&dyn MovieProvider> {
        self.capabilities.movies.then_some(self as &dyn MovieProvider)
    }

    fn as_series_provider(&self) -> Option<&dyn SeriesProvider> {
        self.capabilities.series.then_some(self as &dyn SeriesProvider)
    }

    fn as_music_provider(&self) -> Option<&dyn MusicProvider> {
        self.capabilities.music.then_some(self as &dyn MusicProvider)
    }
}

#[async_trait]
impl MovieProvider for MockMediaClient {
    async fn get_movies(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<Movie>>, ProviderError> {
        self.list("get_movies", &self.movies, options).await
    }

    async fn get_movie(&self, item_id: &str) -> Result<MediaItem<Movie>, ProviderError> {
        self.find("get_movie", &self.movies, item_id).await
    }

    async fn search_movies(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<Movie>>, ProviderError> {
        self.search("search_movies", &self.movies, options).await
    }
}

#[async_trait]
impl SeriesProvider for MockMediaClient {
    async fn get_series(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<Series>>, ProviderError> {
        self.list("get_series", &self.series, options).await
    }

    async fn get_series_by_id(&self, item_id: &str) -> Result<MediaItem<Series>, ProviderError> {
        self.find("get_series_by_id", &self.series, item_id).await
    }

    async fn get_seasons(&self, series_id: &str) -> Result<Vec<MediaItem<Season>>, ProviderError> {
        self.record("get_seasons", None, Some(series_id)).await?;
        Ok(self
            .seasons
            .read()
            .await
            .get(series_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_episodes(
        &self,
        series_id: &str,
        season_number: u32,
    ) -> Result<Vec<MediaItem<Episode>>, ProviderError> {
        self.record("get_episodes", None, Some(series_id)).await?;
        Ok(self
            .episodes
            .read()
            .await
            .get(&(series_id.to_string(), season_number))
            .cloned()
            .unwrap_or_default())
    }

    async fn search_series(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<Series>>, ProviderError> {
        self.search("search_series", &self.series, options).await
    }
}

#[async_trait]
impl MusicProvider for MockMediaClient {
    async fn get_tracks(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<Track>>, ProviderError> {
        self.list("get_tracks", &self.tracks, options).await
    }

    async fn get_albums(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<Album>>, ProviderError> {
        self.list("get_albums", &self.albums, options).await
    }

    async fn get_artists(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<Artist>>, ProviderError> {
        self.list("get_artists", &self.artists, options).await
    }

    async fn search_music(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<MediaItem<Track>>, ProviderError> {
        self.search("search_music", &self.tracks, options).await
    }
}
