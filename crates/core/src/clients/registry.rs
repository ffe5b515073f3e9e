//! Client registry.
//!
//! Maps client IDs to connected [`MediaClient`] instances. Construction goes
//! through per-[`ClientType`] factories registered on the builder, so the
//! registry is an ordinary value owned by whoever builds it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::{ClientInfo, MediaClient, ProviderError};
use crate::config::ClientConfig;
use crate::media::ClientType;

/// Errors raised while building or querying the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Client not found: {0}")]
    ClientNotFound(u64),

    #[error("Client {0} is already registered")]
    DuplicateClient(u64),

    #[error("No adapter registered for client type {0}")]
    NoFactory(ClientType),

    #[error("Failed to create client {client_id}: {source}")]
    Creation {
        client_id: u64,
        #[source]
        source: ProviderError,
    },
}

/// Builds a client from its configuration entry.
pub trait ClientFactory: Send + Sync {
    fn create(&self, config: &ClientConfig) -> Result<Arc<dyn MediaClient>, ProviderError>;
}

impl<F> ClientFactory for F
where
    F: Fn(&ClientConfig) -> Result<Arc<dyn MediaClient>, ProviderError> + Send + Sync,
{
    fn create(&self, config: &ClientConfig) -> Result<Arc<dyn MediaClient>, ProviderError> {
        self(config)
    }
}

/// Builder collecting factories and pre-built clients.
#[derive(Default)]
pub struct ClientRegistryBuilder {
    factories: HashMap<ClientType, Arc<dyn ClientFactory>>,
    clients: BTreeMap<u64, Arc<dyn MediaClient>>,
}

impl ClientRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory used for every configured client of `client_type`.
    pub fn with_factory(
        mut self,
        client_type: ClientType,
        factory: impl ClientFactory + 'static,
    ) -> Self {
        self.factories.insert(client_type, Arc::new(factory));
        self
    }

    /// Register an already constructed client.
    pub fn with_client(mut self, client: Arc<dyn MediaClient>) -> Result<Self, RegistryError> {
        let client_id = client.client_id();
        if self.clients.contains_key(&client_id) {
            return Err(RegistryError::DuplicateClient(client_id));
        }
        self.clients.insert(client_id, client);
        Ok(self)
    }

    /// Instantiate every enabled client entry.
    ///
    /// Entries whose type has no factory are skipped with a warning so that a
    /// deployment can list clients before an adapter for them exists.
    pub fn build(self, configs: &[ClientConfig]) -> Result<ClientRegistry, RegistryError> {
        let mut clients = self.clients;

        for config in configs {
            if !config.enabled {
                debug!(client_id = config.id, name = %config.name, "Client disabled, skipping");
                continue;
            }
            if clients.contains_key(&config.id) {
                return Err(RegistryError::DuplicateClient(config.id));
            }

            let Some(factory) = self.factories.get(&config.client_type) else {
                warn!(
                    client_id = config.id,
                    client_type = %config.client_type,
                    "No adapter available for client type, skipping"
                );
                continue;
            };

            let client = factory
                .create(config)
                .map_err(|source| RegistryError::Creation {
                    client_id: config.id,
                    source,
                })?;
            info!(
                client_id = config.id,
                client_type = %config.client_type,
                name = %config.name,
                "Registered client"
            );
            clients.insert(config.id, client);
        }

        Ok(ClientRegistry { clients })
    }
}

/// Connected clients keyed by client ID.
#[derive(Default, Clone)]
pub struct ClientRegistry {
    clients: BTreeMap<u64, Arc<dyn MediaClient>>,
}

impl ClientRegistry {
    pub fn builder() -> ClientRegistryBuilder {
        ClientRegistryBuilder::new()
    }

    /// Registry with no clients.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, client_id: u64) -> Result<Arc<dyn MediaClient>, RegistryError> {
        self.clients
            .get(&client_id)
            .cloned()
            .ok_or(RegistryError::ClientNotFound(client_id))
    }

    /// Descriptions of all clients, ordered by ID.
    pub fn list(&self) -> Vec<ClientInfo> {
        self.clients.values().map(|c| c.info()).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockMediaClient;

    fn client_config(id: u64, client_type: ClientType) -> ClientConfig {
        ClientConfig {
            id,
            name: format!("client-{}", id),
            client_type,
            url: "http://localhost:8096".to_string(),
            api_key: None,
            enabled: true,
        }
    }

    fn mock_factory(
        config: &ClientConfig,
    ) -> Result<Arc<dyn MediaClient>, ProviderError> {
        Ok(Arc::new(MockMediaClient::new(config.id, config.client_type)))
    }

    #[test]
    fn test_build_uses_factory_per_type() {
        let registry = ClientRegistry::builder()
            .with_factory(ClientType::Jellyfin, mock_factory)
            .build(&[
                client_config(1, ClientType::Jellyfin),
                client_config(2, ClientType::Jellyfin),
            ])
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(2).unwrap().client_id(), 2);
        let ids: Vec<u64> = registry.list().iter().map(|c| c.client_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_build_skips_types_without_factory() {
        let registry = ClientRegistry::builder()
            .with_factory(ClientType::Jellyfin, mock_factory)
            .build(&[
                client_config(1, ClientType::Jellyfin),
                client_config(2, ClientType::Plex),
            ])
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(matches!(
            registry.get(2),
            Err(RegistryError::ClientNotFound(2))
        ));
    }

    #[test]
    fn test_build_skips_disabled_clients() {
        let mut disabled = client_config(1, ClientType::Jellyfin);
        disabled.enabled = false;

        let registry = ClientRegistry::builder()
            .with_factory(ClientType::Jellyfin, mock_factory)
            .build(&[disabled])
            .unwrap();

        assert!(registry.is_empty());
    }

    #[test]
    fn test_prebuilt_client_conflicts_with_config() {
        let result = ClientRegistry::builder()
            .with_factory(ClientType::Jellyfin, mock_factory)
            .with_client(Arc::new(MockMediaClient::new(1, ClientType::Plex)))
            .unwrap()
            .build(&[client_config(1, ClientType::Jellyfin)]);

        assert!(matches!(result, Err(RegistryError::DuplicateClient(1))));
    }

    #[test]
    fn test_factory_error_is_reported() {
        let result = ClientRegistry::builder()
            .with_factory(
                ClientType::Plex,
                |_: &ClientConfig| -> Result<Arc<dyn MediaClient>, ProviderError> {
                    Err(ProviderError::NotConfigured("missing token".to_string()))
                },
            )
            .build(&[client_config(3, ClientType::Plex)]);

        assert!(matches!(
            result,
            Err(RegistryError::Creation { client_id: 3, .. })
        ));
    }
}
