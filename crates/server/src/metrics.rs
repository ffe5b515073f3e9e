//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the Suasor server:
//! - HTTP request metrics (latency, counts, in-flight)
//! - Catalog size per media type (collected dynamically)
//! - Reconciliation and client fetch metrics from the core crate

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "suasor_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("suasor_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "suasor_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Catalog Metrics
// =============================================================================

/// Stored media items by type.
pub static CATALOG_ITEMS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("suasor_catalog_items", "Media items in the catalog by type"),
        &["media_type"],
    )
    .unwrap()
});

/// Configured clients with an adapter in the registry.
pub static CLIENTS_REGISTERED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "suasor_clients_registered",
        "Number of media clients available for sync",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Catalog
    registry
        .register(Box::new(CATALOG_ITEMS.clone()))
        .unwrap();
    registry
        .register(Box::new(CLIENTS_REGISTERED.clone()))
        .unwrap();

    // Core metrics (reconciliation, client fetches)
    for metric in suasor_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the catalog gauges reflect the store.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    CLIENTS_REGISTERED.set(state.sync_service().registry().len() as i64);

    match state.store().count_by_type() {
        Ok(counts) => {
            for media_type in suasor_core::MediaType::ALL {
                let count = counts
                    .iter()
                    .find(|(t, _)| *t == media_type)
                    .map_or(0, |(_, n)| *n);
                CATALOG_ITEMS
                    .with_label_values(&[media_type.as_str()])
                    .set(count);
            }
        }
        Err(e) => warn!(error = %e, "Failed to count catalog items"),
    }
}

static UUID_SEGMENT: Lazy<regex_lite::Regex> = Lazy::new(|| {
    regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap()
});

static NUMERIC_SEGMENT: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_SEGMENT.replace_all(path, "{uuid}");
    // Run twice: adjacent numeric segments share the separating slash
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/media/movie/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/media/movie/{uuid}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/media/movie/12345";
        assert_eq!(normalize_path(path), "/api/v1/media/movie/{id}");
    }

    #[test]
    fn test_normalize_path_numeric_middle() {
        let path = "/api/v1/clients/3/sync/movie";
        assert_eq!(normalize_path(path), "/api/v1/clients/{id}/sync/movie");
    }

    #[test]
    fn test_normalize_path_adjacent_ids_and_repeated_calls() {
        for _ in 0..3 {
            assert_eq!(normalize_path("/api/v1/a/12/34"), "/api/v1/a/{id}/{id}");
        }
        assert_eq!(
            normalize_path("/api/v1/clients/7/sync/movie"),
            "/api/v1/clients/{id}/sync/movie"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("suasor_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Prometheus only outputs vectors that have been touched
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        CATALOG_ITEMS.with_label_values(&["movie"]).set(0);
        CLIENTS_REGISTERED.set(0);
        suasor_core::metrics::RECONCILED_ITEMS
            .with_label_values(&["movie", "created"])
            .inc_by(0);

        let output = encode_metrics();

        assert!(output.contains("suasor_http_request_duration_seconds"));
        assert!(output.contains("suasor_http_requests_in_flight"));
        assert!(output.contains("suasor_catalog_items"));
        assert!(output.contains("suasor_clients_registered"));
        assert!(output.contains("suasor_reconciled_items_total"));
    }
}
