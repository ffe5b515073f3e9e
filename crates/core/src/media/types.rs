//! Shared media vocabulary: type tags, client kinds, external identifiers.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Discriminant tag for a media payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Movie,
    Series,
    Season,
    Episode,
    Track,
    Album,
    Artist,
    Playlist,
    Collection,
}

impl MediaType {
    /// All known media types.
    pub const ALL: [MediaType; 9] = [
        MediaType::Movie,
        MediaType::Series,
        MediaType::Season,
        MediaType::Episode,
        MediaType::Track,
        MediaType::Album,
        MediaType::Artist,
        MediaType::Playlist,
        MediaType::Collection,
    ];

    /// Stable identifier used in the database and in URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
            MediaType::Season => "season",
            MediaType::Episode => "episode",
            MediaType::Track => "track",
            MediaType::Album => "album",
            MediaType::Artist => "artist",
            MediaType::Playlist => "playlist",
            MediaType::Collection => "collection",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.to_ascii_lowercase())
            .ok_or_else(|| format!("unknown media type: {}", s))
    }
}

/// Broad grouping of external clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientCategory {
    /// Media servers that host playable content.
    Media,
    /// *arr-style automation tools.
    Automation,
    /// Metadata catalogs.
    Metadata,
    /// AI / LLM providers.
    Ai,
}

/// Kind of external system a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Plex,
    Jellyfin,
    Emby,
    Subsonic,
    Radarr,
    Sonarr,
    Lidarr,
    Tmdb,
    Claude,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Plex => "plex",
            ClientType::Jellyfin => "jellyfin",
            ClientType::Emby => "emby",
            ClientType::Subsonic => "subsonic",
            ClientType::Radarr => "radarr",
            ClientType::Sonarr => "sonarr",
            ClientType::Lidarr => "lidarr",
            ClientType::Tmdb => "tmdb",
            ClientType::Claude => "claude",
            ClientType::OpenAi => "openai",
        }
    }

    pub fn category(&self) -> ClientCategory {
        match self {
            ClientType::Plex | ClientType::Jellyfin | ClientType::Emby | ClientType::Subsonic => {
                ClientCategory::Media
            }
            ClientType::Radarr | ClientType::Sonarr | ClientType::Lidarr => {
                ClientCategory::Automation
            }
            ClientType::Tmdb => ClientCategory::Metadata,
            ClientType::Claude | ClientType::OpenAi => ClientCategory::Ai,
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifiers assigned by public catalogs.
///
/// Two items agree when they share a value for at least one provider, and
/// conflict when some provider is set on both sides with different values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub musicbrainz: Option<String>,
}

impl ExternalIds {
    pub fn is_empty(&self) -> bool {
        self.imdb.is_none()
            && self.tmdb.is_none()
            && self.tvdb.is_none()
            && self.musicbrainz.is_none()
    }

    /// True if both sides share at least one identifier.
    pub fn agrees_with(&self, other: &ExternalIds) -> bool {
        self.pairs(other).any(|(a, b)| a == b)
    }

    /// True if some provider is known on both sides with different values.
    pub fn conflicts_with(&self, other: &ExternalIds) -> bool {
        self.pairs(other).any(|(a, b)| a != b)
    }

    /// Fill gaps in `self` from `other`. Values already set are kept.
    pub fn fill_from(&mut self, other: &ExternalIds) {
        if self.imdb.is_none() {
            self.imdb = other.imdb.clone();
        }
        if self.tmdb.is_none() {
            self.tmdb = other.tmdb;
        }
        if self.tvdb.is_none() {
            self.tvdb = other.tvdb;
        }
        if self.musicbrainz.is_none() {
            self.musicbrainz = other.musicbrainz.clone();
        }
    }

    /// Providers set on both sides, as normalized string pairs.
    fn pairs<'a>(&'a self, other: &'a ExternalIds) -> impl Iterator<Item = (String, String)> + 'a {
        let imdb = self
            .imdb
            .as_ref()
            .zip(other.imdb.as_ref())
            .map(|(a, b)| (a.to_ascii_lowercase(), b.to_ascii_lowercase()));
        let tmdb = self
            .tmdb
            .zip(other.tmdb)
            .map(|(a, b)| (a.to_string(), b.to_string()));
        let tvdb = self
            .tvdb
            .zip(other.tvdb)
            .map(|(a, b)| (a.to_string(), b.to_string()));
        let musicbrainz = self
            .musicbrainz
            .as_ref()
            .zip(other.musicbrainz.as_ref())
            .map(|(a, b)| (a.to_ascii_lowercase(), b.to_ascii_lowercase()));

        [imdb, tmdb, tvdb, musicbrainz].into_iter().flatten()
    }
}

/// Artwork URLs reported by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Descriptive block shared by every payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaDetails {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Runtime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
    /// Community rating (0-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default)]
    pub artwork: Artwork,
    #[serde(default, skip_serializing_if = "ExternalIds::is_empty")]
    pub external_ids: ExternalIds,
}

impl MediaDetails {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Release year, falling back to the year of the release date.
    pub fn year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.release_year
            .or_else(|| self.release_date.map(|d| d.year()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_round_trips_through_str() {
        for media_type in MediaType::ALL {
            assert_eq!(media_type.as_str().parse::<MediaType>(), Ok(media_type));
        }
        assert!("podcast".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_media_type_parse_is_case_insensitive() {
        assert_eq!("Movie".parse::<MediaType>(), Ok(MediaType::Movie));
    }

    #[test]
    fn test_client_type_serialization() {
        assert_eq!(
            serde_json::to_string(&ClientType::OpenAi).unwrap(),
            "\"openai\""
        );
        assert_eq!(
            serde_json::from_str::<ClientType>("\"jellyfin\"").unwrap(),
            ClientType::Jellyfin
        );
    }

    #[test]
    fn test_client_type_category() {
        assert_eq!(ClientType::Plex.category(), ClientCategory::Media);
        assert_eq!(ClientType::Sonarr.category(), ClientCategory::Automation);
        assert_eq!(ClientType::Tmdb.category(), ClientCategory::Metadata);
        assert_eq!(ClientType::Claude.category(), ClientCategory::Ai);
    }

    #[test]
    fn test_external_ids_agree_and_conflict() {
        let a = ExternalIds {
            imdb: Some("tt1160419".to_string()),
            tmdb: Some(438631),
            ..Default::default()
        };
        let same_imdb = ExternalIds {
            imdb: Some("TT1160419".to_string()),
            ..Default::default()
        };
        let other_tmdb = ExternalIds {
            tmdb: Some(841),
            ..Default::default()
        };

        assert!(a.agrees_with(&same_imdb));
        assert!(!a.conflicts_with(&same_imdb));
        assert!(a.conflicts_with(&other_tmdb));
        assert!(!a.agrees_with(&ExternalIds::default()));
        assert!(!a.conflicts_with(&ExternalIds::default()));
    }

    #[test]
    fn test_external_ids_fill_from_keeps_existing() {
        let mut ids = ExternalIds {
            tmdb: Some(1),
            ..Default::default()
        };
        ids.fill_from(&ExternalIds {
            tmdb: Some(2),
            imdb: Some("tt0000002".to_string()),
            ..Default::default()
        });
        assert_eq!(ids.tmdb, Some(1));
        assert_eq!(ids.imdb.as_deref(), Some("tt0000002"));
    }

    #[test]
    fn test_details_year_falls_back_to_date() {
        let mut details = MediaDetails::new("Dune");
        details.release_date = NaiveDate::from_ymd_opt(2021, 10, 22);
        assert_eq!(details.year(), Some(2021));

        details.release_year = Some(2020);
        assert_eq!(details.year(), Some(2020));
    }

    #[test]
    fn test_empty_external_ids_are_skipped() {
        let details = MediaDetails::new("Dune");
        let json = serde_json::to_string(&details).unwrap();
        assert!(!json.contains("external_ids"));
    }
}
