use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::{SyncError, SyncReport};
use crate::clients::{
    ClientRegistry, MediaClient, MovieProvider, MusicProvider, ProviderError, QueryOptions,
    RegistryError, SeriesProvider,
};
use crate::config::ClientConfig;
use crate::media::{
    Album, Artist, ClientType, Collection, Episode, MediaData, MediaItem, MediaType, Movie,
    Playlist, Season, Series, Track,
};
use crate::metrics;
use crate::reconcile::{ClientRef, MatchPolicy, ReconcileReport, Reconciler};
use crate::store::{MediaItemRepository, MediaStore};

/// Pulls items from registered clients and reconciles them into the store.
pub struct MediaSyncService<S> {
    store: Arc<S>,
    registry: Arc<ClientRegistry>,
    /// Configured clients, including those without an adapter. Pushed
    /// batches only need the client to be known here.
    known_clients: BTreeMap<u64, ClientType>,
    policy: MatchPolicy,
}

impl<S: MediaStore> MediaSyncService<S> {
    pub fn new(store: Arc<S>, registry: Arc<ClientRegistry>, policy: MatchPolicy) -> Self {
        let known_clients = registry
            .list()
            .into_iter()
            .map(|c| (c.client_id, c.client_type))
            .collect();
        Self {
            store,
            registry,
            known_clients,
            policy,
        }
    }

    /// Accept pushed batches for these clients too.
    pub fn with_configured_clients(mut self, clients: &[ClientConfig]) -> Self {
        for client in clients.iter().filter(|c| c.enabled) {
            self.known_clients
                .entry(client.id)
                .or_insert(client.client_type);
        }
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Fetch one media type from a client and reconcile it.
    pub async fn sync(
        &self,
        client_id: u64,
        media_type: MediaType,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let report = match media_type {
            MediaType::Movie => self.sync_movies(client_id, options, cancel).await?.into(),
            MediaType::Series => self.sync_series(client_id, options, cancel).await?.into(),
            MediaType::Season => self.sync_seasons(client_id, options, cancel).await?.into(),
            MediaType::Episode => self.sync_episodes(client_id, options, cancel).await?.into(),
            MediaType::Track => self.sync_tracks(client_id, options, cancel).await?.into(),
            MediaType::Album => self.sync_albums(client_id, options, cancel).await?.into(),
            MediaType::Artist => self.sync_artists(client_id, options, cancel).await?.into(),
            MediaType::Playlist | MediaType::Collection => {
                return Err(SyncError::Unsupported {
                    client_id,
                    media_type,
                })
            }
        };
        Ok(report)
    }

    pub async fn sync_movies(
        &self,
        client_id: u64,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport<Movie>, SyncError> {
        let client = self.registry.get(client_id)?;
        let provider = movie_provider(client.as_ref())?;
        let items = self.fetch(client.as_ref(), cancel, provider.get_movies(options)).await?;
        self.reconcile_fetched(client.as_ref(), items, cancel)
    }

    pub async fn sync_series(
        &self,
        client_id: u64,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport<Series>, SyncError> {
        let client = self.registry.get(client_id)?;
        let provider = series_provider(client.as_ref())?;
        let items = self.fetch(client.as_ref(), cancel, provider.get_series(options)).await?;
        self.reconcile_fetched(client.as_ref(), items, cancel)
    }

    /// Seasons of every series matching `options`.
    pub async fn sync_seasons(
        &self,
        client_id: u64,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport<Season>, SyncError> {
        let client = self.registry.get(client_id)?;
        let seasons = self.fetch_seasons(client.as_ref(), options, cancel).await?;
        let items = seasons.into_iter().map(|(_, season)| season).collect();
        self.reconcile_fetched(client.as_ref(), items, cancel)
    }

    /// Episodes of every season of every series matching `options`.
    pub async fn sync_episodes(
        &self,
        client_id: u64,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport<Episode>, SyncError> {
        let client = self.registry.get(client_id)?;
        let provider = series_provider(client.as_ref())?;

        let mut items = Vec::new();
        for (series_id, season) in self.fetch_seasons(client.as_ref(), options, cancel).await? {
            let episodes = provider.get_episodes(&series_id, season.data.season_number);
            items.extend(self.fetch(client.as_ref(), cancel, episodes).await?);
        }
        self.reconcile_fetched(client.as_ref(), items, cancel)
    }

    pub async fn sync_tracks(
        &self,
        client_id: u64,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport<Track>, SyncError> {
        let client = self.registry.get(client_id)?;
        let provider = music_provider(client.as_ref(), MediaType::Track)?;
        let items = self.fetch(client.as_ref(), cancel, provider.get_tracks(options)).await?;
        self.reconcile_fetched(client.as_ref(), items, cancel)
    }

    pub async fn sync_albums(
        &self,
        client_id: u64,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport<Album>, SyncError> {
        let client = self.registry.get(client_id)?;
        let provider = music_provider(client.as_ref(), MediaType::Album)?;
        let items = self.fetch(client.as_ref(), cancel, provider.get_albums(options)).await?;
        self.reconcile_fetched(client.as_ref(), items, cancel)
    }

    pub async fn sync_artists(
        &self,
        client_id: u64,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport<Artist>, SyncError> {
        let client = self.registry.get(client_id)?;
        let provider = music_provider(client.as_ref(), MediaType::Artist)?;
        let items = self.fetch(client.as_ref(), cancel, provider.get_artists(options)).await?;
        self.reconcile_fetched(client.as_ref(), items, cancel)
    }

    /// Reconcile items another component already fetched from `client_id`.
    pub fn reconcile_batch<T>(
        &self,
        client_id: u64,
        items: Vec<MediaItem<T>>,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport<T>, SyncError>
    where
        T: MediaData,
        S: MediaItemRepository<T>,
    {
        let client = self.client_ref(client_id)?;
        let report = Reconciler::<T>::new(&*self.store, self.policy)
            .reconcile(client, items, cancel)?;
        Ok(report)
    }

    /// Reconcile a pushed batch of JSON items of `media_type`.
    pub fn reconcile_json(
        &self,
        client_id: u64,
        media_type: MediaType,
        items: Vec<Value>,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let report = match media_type {
            MediaType::Movie => self.reconcile_values::<Movie>(client_id, items, cancel)?.into(),
            MediaType::Series => self.reconcile_values::<Series>(client_id, items, cancel)?.into(),
            MediaType::Season => self.reconcile_values::<Season>(client_id, items, cancel)?.into(),
            MediaType::Episode => {
                self.reconcile_values::<Episode>(client_id, items, cancel)?.into()
            }
            MediaType::Track => self.reconcile_values::<Track>(client_id, items, cancel)?.into(),
            MediaType::Album => self.reconcile_values::<Album>(client_id, items, cancel)?.into(),
            MediaType::Artist => self.reconcile_values::<Artist>(client_id, items, cancel)?.into(),
            MediaType::Playlist => {
                self.reconcile_values::<Playlist>(client_id, items, cancel)?.into()
            }
            MediaType::Collection => {
                self.reconcile_values::<Collection>(client_id, items, cancel)?.into()
            }
        };
        Ok(report)
    }

    fn reconcile_values<T>(
        &self,
        client_id: u64,
        items: Vec<Value>,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport<T>, SyncError>
    where
        T: MediaData,
        S: MediaItemRepository<T>,
    {
        let items: Vec<MediaItem<T>> = serde_json::from_value(Value::Array(items))
            .map_err(|e| SyncError::InvalidBatch(e.to_string()))?;
        self.reconcile_batch(client_id, items, cancel)
    }

    fn reconcile_fetched<T>(
        &self,
        client: &dyn MediaClient,
        items: Vec<MediaItem<T>>,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport<T>, SyncError>
    where
        T: MediaData,
        S: MediaItemRepository<T>,
    {
        let client = ClientRef::new(client.client_id(), client.client_type());
        let report = Reconciler::<T>::new(&*self.store, self.policy)
            .reconcile(client, items, cancel)?;
        Ok(report)
    }

    /// `(series item ID, season)` pairs for every series matching `options`.
    async fn fetch_seasons(
        &self,
        client: &dyn MediaClient,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<(String, MediaItem<Season>)>, SyncError> {
        let provider = series_provider(client)?;
        let series = self.fetch(client, cancel, provider.get_series(options)).await?;

        let mut seasons = Vec::new();
        for show in &series {
            let Some(series_id) = show.sync_clients.item_id_for(client.client_id()) else {
                continue;
            };
            let fetched = self
                .fetch(client, cancel, provider.get_seasons(series_id))
                .await?;
            seasons.extend(fetched.into_iter().map(|s| (series_id.to_string(), s)));
        }
        Ok(seasons)
    }

    /// Await a provider call, recording metrics and honouring cancellation.
    async fn fetch<T, F>(
        &self,
        client: &dyn MediaClient,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<Vec<MediaItem<T>>, SyncError>
    where
        T: MediaData,
        F: Future<Output = Result<Vec<MediaItem<T>>, ProviderError>>,
    {
        let client_type = client.client_type().as_str();
        let media_type = T::MEDIA_TYPE.as_str();
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            result = call => result,
        };

        metrics::CLIENT_FETCH_DURATION
            .with_label_values(&[client_type, media_type])
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(items) => {
                metrics::CLIENT_FETCHES
                    .with_label_values(&[client_type, media_type, "success"])
                    .inc();
                metrics::CLIENT_FETCH_ITEMS
                    .with_label_values(&[media_type])
                    .observe(items.len() as f64);
                info!(
                    client_id = client.client_id(),
                    client = client.name(),
                    media_type,
                    count = items.len(),
                    "Fetched items from client"
                );
                Ok(items)
            }
            Err(e) => {
                metrics::CLIENT_FETCHES
                    .with_label_values(&[client_type, media_type, "error"])
                    .inc();
                error!(
                    client_id = client.client_id(),
                    client = client.name(),
                    media_type,
                    error = %e,
                    "Fetch from client failed"
                );
                Err(SyncError::Fetch {
                    client_id: client.client_id(),
                    source: e,
                })
            }
        }
    }

    fn client_ref(&self, client_id: u64) -> Result<ClientRef, SyncError> {
        self.known_clients
            .get(&client_id)
            .map(|&client_type| ClientRef::new(client_id, client_type))
            .ok_or(SyncError::Registry(RegistryError::ClientNotFound(client_id)))
    }
}

fn movie_provider(client: &dyn MediaClient) -> Result<&dyn MovieProvider, SyncError> {
    client.as_movie_provider().ok_or(SyncError::Unsupported {
        client_id: client.client_id(),
        media_type: MediaType::Movie,
    })
}

fn series_provider(client: &dyn MediaClient) -> Result<&dyn SeriesProvider, SyncError> {
    client.as_series_provider().ok_or(SyncError::Unsupported {
        client_id: client.client_id(),
        media_type: MediaType::Series,
    })
}

fn music_provider(
    client: &dyn MediaClient,
    media_type: MediaType,
) -> Result<&dyn MusicProvider, SyncError> {
    client.as_music_provider().ok_or(SyncError::Unsupported {
        client_id: client.client_id(),
        media_type,
    })
}
