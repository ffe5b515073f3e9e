//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process
//! with mock media clients registered, so sync and catalog endpoints can be
//! exercised without real media servers.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use suasor_core::{
    testing::MockMediaClient, ClientCapabilities, ClientConfig, ClientRegistry, ClientType,
    Config, DatabaseConfig, MatchPolicy, MediaSyncService, ServerConfig, SqliteMediaStore,
};
use suasor_server::state::AppState;

/// Re-export fixtures for test convenience
pub use suasor_core::testing::fixtures;

/// Client ID of the Plex mock (all capabilities)
pub const PLEX_ID: u64 = 1;
/// Client ID of the Jellyfin mock (no music)
pub const JELLYFIN_ID: u64 = 2;
/// Client ID of a configured client with no adapter (push only)
pub const EMBY_ID: u64 = 3;

/// Test fixture for API testing with mock clients.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_sync() {
///     let fixture = TestFixture::new().await;
///     fixture.plex.set_movies(vec![...]).await;
///
///     let response = fixture.post("/api/v1/clients/1/sync/movie", json!({})).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub state: Arc<AppState>,
    pub plex: Arc<MockMediaClient>,
    pub jellyfin: Arc<MockMediaClient>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

fn client_config(id: u64, name: &str, client_type: ClientType) -> ClientConfig {
    ClientConfig {
        id,
        name: name.to_string(),
        client_type,
        url: format!("http://{}.local", name),
        api_key: Some(format!("{}-secret", name)),
        enabled: true,
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let clients = vec![
            client_config(PLEX_ID, "plex", ClientType::Plex),
            client_config(JELLYFIN_ID, "jellyfin", ClientType::Jellyfin),
            client_config(EMBY_ID, "emby", ClientType::Emby),
        ];
        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 8080, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            clients: clients.clone(),
            ..Default::default()
        };

        // Create mocks
        let plex = Arc::new(MockMediaClient::new(PLEX_ID, ClientType::Plex));
        let jellyfin = Arc::new(
            MockMediaClient::new(JELLYFIN_ID, ClientType::Jellyfin).with_capabilities(
                ClientCapabilities {
                    movies: true,
                    series: true,
                    music: false,
                },
            ),
        );
        let registry = ClientRegistry::builder()
            .with_client(plex.clone())
            .and_then(|b| b.with_client(jellyfin.clone()))
            .expect("Failed to register mock clients")
            .build(&[])
            .expect("Failed to build registry");

        let store = Arc::new(SqliteMediaStore::new(&db_path).expect("Failed to create store"));
        let sync_service =
            MediaSyncService::new(store, Arc::new(registry), MatchPolicy::default())
                .with_configured_clients(&clients);

        let state = Arc::new(AppState::new(config, sync_service));
        let router = suasor_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            plex,
            jellyfin,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
