use std::collections::HashSet;

use super::{types::Config, ConfigError};
use crate::media::MAX_CLIENT_ID;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Client IDs are non-zero, fit the catalog's integer range and are unique
/// - Enabled clients have a URL
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for client in &config.clients {
        if client.id == 0 {
            return Err(ConfigError::ValidationError(format!(
                "client '{}' has id 0, ids must be positive",
                client.name
            )));
        }
        if client.id > MAX_CLIENT_ID {
            return Err(ConfigError::ValidationError(format!(
                "client '{}' has id {}, ids must not exceed {}",
                client.name, client.id, MAX_CLIENT_ID
            )));
        }
        if !seen.insert(client.id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate client id {}",
                client.id
            )));
        }
        if client.enabled && client.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "client {} ('{}') is enabled but has no url",
                client.id, client.name
            )));
        }
    }

    Ok(())
}
