use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use suasor_core::{
    load_config, validate_config, ClientRegistry, MatchPolicy, MediaSyncService, SqliteMediaStore,
};
use suasor_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Suasor {} starting", VERSION);

    // Determine config path
    let config_path = std::env::var("SUASOR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!(
        "Match policy: require_year={}, trust_external_ids={}",
        config.reconcile.require_year, config.reconcile.trust_external_ids
    );

    // Open the catalog store
    let store = Arc::new(
        SqliteMediaStore::new(&config.database.path).context("Failed to open media store")?,
    );
    info!("Media store initialized");

    // Vendor adapters register factories here; clients without one can
    // still push batches through the reconcile endpoint.
    let registry = ClientRegistry::builder()
        .build(&config.clients)
        .context("Failed to build client registry")?;
    if registry.is_empty() && !config.clients.is_empty() {
        warn!(
            "No client adapters available; {} configured client(s) accept pushed batches only",
            config.clients.len()
        );
    }
    info!("Client registry ready with {} client(s)", registry.len());

    let sync_service = MediaSyncService::new(
        store,
        Arc::new(registry),
        MatchPolicy::from(config.reconcile),
    )
    .with_configured_clients(&config.clients);

    // Create app state
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, sync_service));
    let shutdown = state.shutdown_token().clone();

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown; running syncs are cancelled first
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Server shutting down...");
            shutdown.cancel();
        })
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
