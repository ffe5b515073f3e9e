use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::media::ClientType;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("suasor.db")
}

/// Matching behaviour for reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReconcileConfig {
    /// Only title-match items that carry a release year or a type-specific
    /// discriminator (artist, series, owner).
    #[serde(default = "default_true")]
    pub require_year: bool,
    /// Use external IDs (IMDb, TMDb, ...) to confirm or veto title matches.
    #[serde(default = "default_true")]
    pub trust_external_ids: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            require_year: true,
            trust_external_ids: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One external client instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Stable, user-assigned ID; stored in every item's client map.
    pub id: u64,
    pub name: String,
    pub client_type: ClientType,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub reconcile: ReconcileConfig,
    pub clients: Vec<SanitizedClientConfig>,
}

/// Sanitized client config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedClientConfig {
    pub id: u64,
    pub name: String,
    pub client_type: ClientType,
    pub url: String,
    pub api_key_configured: bool,
    pub enabled: bool,
}

impl From<&ClientConfig> for SanitizedClientConfig {
    fn from(client: &ClientConfig) -> Self {
        Self {
            id: client.id,
            name: client.name.clone(),
            client_type: client.client_type,
            url: client.url.clone(),
            api_key_configured: client.api_key.as_deref().is_some_and(|k| !k.is_empty()),
            enabled: client.enabled,
        }
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            reconcile: config.reconcile,
            clients: config.clients.iter().map(SanitizedClientConfig::from).collect(),
        }
    }
}
