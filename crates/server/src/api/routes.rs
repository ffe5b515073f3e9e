use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{clients, handlers, media, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Clients
        .route("/clients", get(clients::list_clients))
        .route(
            "/clients/{client_id}/sync/{media_type}",
            post(clients::sync_client),
        )
        .route(
            "/clients/{client_id}/reconcile/{media_type}",
            post(clients::reconcile_client),
        )
        // Catalog
        .route("/media/{media_type}", get(media::list_media))
        .route(
            "/media/{media_type}/{id}",
            get(media::get_media).delete(media::delete_media),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
