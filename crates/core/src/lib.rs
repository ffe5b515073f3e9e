pub mod clients;
pub mod config;
pub mod media;
pub mod metrics;
pub mod reconcile;
pub mod store;
pub mod sync;
pub mod testing;

pub use clients::{
    ClientCapabilities, ClientFactory, ClientInfo, ClientRegistry, ClientRegistryBuilder,
    MediaClient, MovieProvider, MusicProvider, ProviderError, QueryOptions, RegistryError,
    SeriesProvider,
};
pub use config::{
    load_config, load_config_from_str, validate_config, ClientConfig, Config, ConfigError,
    DatabaseConfig, ReconcileConfig, SanitizedConfig, ServerConfig,
};
pub use media::{
    normalize_title, Album, Artist, Artwork, ClientCategory, ClientType, Collection, Episode,
    ExternalIds, MatchKey, MediaData, MediaDetails, MediaItem, MediaType, Movie, Playlist, Season,
    Series, SyncChange, SyncClient, SyncClients, Track, MAX_CLIENT_ID,
};
pub use reconcile::{
    ClientRef, FailureReason, ItemFailure, MatchIndex, MatchPolicy, ReconcileAction,
    ReconcileError, ReconcileReport, ReconcileSummary, ReconciledItem, Reconciler,
};
pub use store::{
    MediaItemFilter, MediaItemRepository, MediaStore, MediaStoreError, SqliteMediaStore,
};
pub use sync::{MediaSyncService, SyncError, SyncReport};
