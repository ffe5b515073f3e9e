//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the client traits and of the
//! media repository, allowing reconciliation and sync tests without real
//! media servers.
//!
//! # Example
//!
//! ```rust,ignore
//! use suasor_core::testing::{fixtures, MockMediaClient, MockMediaStore};
//!
//! let client = MockMediaClient::new(1, ClientType::Plex);
//! let store = MockMediaStore::<Movie>::new();
//!
//! // Configure mock responses
//! client.set_movies(vec![fixtures::movie_from(1, ClientType::Plex, "p100", "Dune", 2021)]).await;
//! store.fail_writes_for("Heat");
//! ```

mod mock_client;
mod mock_store;

pub use mock_client::{MockMediaClient, RecordedCall};
pub use mock_store::MockMediaStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::media::{
        Album, Artist, ClientType, Episode, ExternalIds, MediaDetails, MediaItem, Movie, Season,
        Series, Track,
    };

    fn details(title: &str, year: Option<i32>) -> MediaDetails {
        let mut details = MediaDetails::new(title);
        details.release_year = year;
        details
    }

    /// A movie not yet attributed to any client.
    pub fn movie(title: &str, year: i32) -> MediaItem<Movie> {
        MediaItem::new(Movie {
            details: details(title, Some(year)),
            ..Default::default()
        })
    }

    /// A movie as a client adapter would report it.
    pub fn movie_from(
        client_id: u64,
        client_type: ClientType,
        item_id: &str,
        title: &str,
        year: i32,
    ) -> MediaItem<Movie> {
        movie(title, year).with_client(client_id, client_type, item_id)
    }

    /// Same as [`movie_from`] with external IDs attached.
    pub fn movie_with_ids(
        client_id: u64,
        client_type: ClientType,
        item_id: &str,
        title: &str,
        year: i32,
        external_ids: ExternalIds,
    ) -> MediaItem<Movie> {
        let mut item = movie_from(client_id, client_type, item_id, title, year);
        item.data.details.external_ids = external_ids;
        item
    }

    pub fn series_from(
        client_id: u64,
        client_type: ClientType,
        item_id: &str,
        title: &str,
        year: i32,
    ) -> MediaItem<Series> {
        MediaItem::new(Series {
            details: details(title, Some(year)),
            ..Default::default()
        })
        .with_client(client_id, client_type, item_id)
    }

    pub fn season_from(
        client_id: u64,
        client_type: ClientType,
        item_id: &str,
        series_title: &str,
        season_number: u32,
    ) -> MediaItem<Season> {
        MediaItem::new(Season {
            details: details(&format!("Season {}", season_number), None),
            series_title: series_title.to_string(),
            season_number,
            ..Default::default()
        })
        .with_client(client_id, client_type, item_id)
    }

    pub fn episode_from(
        client_id: u64,
        client_type: ClientType,
        item_id: &str,
        series_title: &str,
        season_number: u32,
        episode_number: u32,
        title: &str,
    ) -> MediaItem<Episode> {
        MediaItem::new(Episode {
            details: details(title, None),
            series_title: series_title.to_string(),
            season_number,
            episode_number,
        })
        .with_client(client_id, client_type, item_id)
    }

    pub fn track_from(
        client_id: u64,
        client_type: ClientType,
        item_id: &str,
        artist: &str,
        album: &str,
        title: &str,
    ) -> MediaItem<Track> {
        MediaItem::new(Track {
            details: details(title, None),
            artist_name: artist.to_string(),
            album_title: Some(album.to_string()),
            ..Default::default()
        })
        .with_client(client_id, client_type, item_id)
    }

    pub fn album_from(
        client_id: u64,
        client_type: ClientType,
        item_id: &str,
        artist: &str,
        title: &str,
        year: i32,
    ) -> MediaItem<Album> {
        MediaItem::new(Album {
            details: details(title, Some(year)),
            artist_name: artist.to_string(),
            ..Default::default()
        })
        .with_client(client_id, client_type, item_id)
    }

    pub fn artist_from(
        client_id: u64,
        client_type: ClientType,
        item_id: &str,
        name: &str,
    ) -> MediaItem<Artist> {
        MediaItem::new(Artist {
            details: details(name, None),
            ..Default::default()
        })
        .with_client(client_id, client_type, item_id)
    }
}
