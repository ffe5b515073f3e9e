//! Typed media payloads.
//!
//! Each payload carries a [`MediaDetails`] block plus the fields specific to
//! its kind, and is bound to its [`MediaType`] tag through [`MediaData`].

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::types::{MediaDetails, MediaType};

/// A payload that can be wrapped in a [`MediaItem`](super::MediaItem).
pub trait MediaData:
    Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static
{
    /// Type tag stored alongside every item of this payload.
    const MEDIA_TYPE: MediaType;

    fn details(&self) -> &MediaDetails;

    fn details_mut(&mut self) -> &mut MediaDetails;

    /// Secondary metadata that must also agree for a title match.
    ///
    /// Titles alone are too weak for kinds like tracks and episodes, where
    /// "Intro" or "Pilot" recur across unrelated parents.
    fn match_discriminator(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub details: MediaDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub studio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub details: MediaDetails,
    #[serde(default)]
    pub season_count: u32,
    #[serde(default)]
    pub episode_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub details: MediaDetails,
    pub series_title: String,
    pub season_number: u32,
    #[serde(default)]
    pub episode_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub details: MediaDetails,
    pub series_title: String,
    pub season_number: u32,
    pub episode_number: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub details: MediaDetails,
    pub artist_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc_number: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub details: MediaDetails,
    pub artist_name: String,
    #[serde(default)]
    pub track_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub details: MediaDetails,
    #[serde(default)]
    pub album_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub details: MediaDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub item_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub details: MediaDetails,
    #[serde(default)]
    pub item_count: u32,
}

macro_rules! media_data {
    ($payload:ty, $tag:expr) => {
        media_data!($payload, $tag, |_p: &$payload| None);
    };
    ($payload:ty, $tag:expr, $discriminator:expr) => {
        impl MediaData for $payload {
            const MEDIA_TYPE: MediaType = $tag;

            fn details(&self) -> &MediaDetails {
                &self.details
            }

            fn details_mut(&mut self) -> &mut MediaDetails {
                &mut self.details
            }

            fn match_discriminator(&self) -> Option<String> {
                let discriminator: fn(&$payload) -> Option<String> = $discriminator;
                discriminator(self)
            }
        }
    };
}

media_data!(Movie, MediaType::Movie);
media_data!(Series, MediaType::Series);
media_data!(Season, MediaType::Season, |s: &Season| Some(format!(
    "{}#{}",
    s.series_title.to_lowercase(),
    s.season_number
)));
media_data!(Episode, MediaType::Episode, |e: &Episode| Some(format!(
    "{}#{}x{}",
    e.series_title.to_lowercase(),
    e.season_number,
    e.episode_number
)));
media_data!(Track, MediaType::Track, |t: &Track| Some(format!(
    "{}#{}",
    t.artist_name.to_lowercase(),
    t.album_title.as_deref().unwrap_or_default().to_lowercase()
)));
media_data!(Album, MediaType::Album, |a: &Album| Some(
    a.artist_name.to_lowercase()
));
media_data!(Artist, MediaType::Artist);
media_data!(Playlist, MediaType::Playlist, |p: &Playlist| p
    .owner
    .as_ref()
    .map(|o| o.to_lowercase()));
media_data!(Collection, MediaType::Collection);
