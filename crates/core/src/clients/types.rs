//! Value types shared by the client traits.

use serde::{Deserialize, Serialize};

use crate::media::{ClientType, MediaType};

/// Paging and filtering options passed to provider calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Free-text query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Restrict to a release year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Maximum items per call (`None` = client default).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: u32,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }
}

/// What a client can serve, fixed when the client is constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCapabilities {
    pub movies: bool,
    pub series: bool,
    pub music: bool,
}

impl ClientCapabilities {
    /// Whether media of this type can be fetched from the client.
    pub fn supports(&self, media_type: MediaType) -> bool {
        match media_type {
            MediaType::Movie => self.movies,
            MediaType::Series | MediaType::Season | MediaType::Episode => self.series,
            MediaType::Track | MediaType::Album | MediaType::Artist => self.music,
            MediaType::Playlist | MediaType::Collection => false,
        }
    }
}

/// Public description of a registered client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: u64,
    pub client_type: ClientType,
    pub name: String,
    pub capabilities: ClientCapabilities,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_supports() {
        let caps = ClientCapabilities {
            movies: true,
            series: false,
            music: true,
        };
        assert!(caps.supports(MediaType::Movie));
        assert!(!caps.supports(MediaType::Episode));
        assert!(caps.supports(MediaType::Album));
        assert!(!caps.supports(MediaType::Playlist));
    }

    #[test]
    fn test_query_options_builder() {
        let options = QueryOptions::new()
            .with_query("dune")
            .with_year(2021)
            .with_limit(50)
            .with_offset(100);
        assert_eq!(options.query.as_deref(), Some("dune"));
        assert_eq!(options.year, Some(2021));
        assert_eq!(options.limit, Some(50));
        assert_eq!(options.offset, 100);
    }

    #[test]
    fn test_query_options_defaults_from_json() {
        let options: QueryOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, QueryOptions::default());
    }
}
