//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Reconciliation (items by action, failures, batch duration)
//! - Client fetches (requests, duration, items returned)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Reconciliation Metrics
// =============================================================================

/// Reconciled items total by outcome.
pub static RECONCILED_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "suasor_reconciled_items_total",
            "Total items reconciled into the catalog",
        ),
        &["media_type", "action"], // action: "created", "updated", "linked"
    )
    .unwrap()
});

/// Items that could not be reconciled, by reason.
pub static RECONCILE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "suasor_reconcile_failures_total",
            "Total items skipped or failed during reconciliation",
        ),
        &["media_type", "reason"], // reason: "missing_client_id", "type_mismatch", "store"
    )
    .unwrap()
});

/// Reconciliation batches total by result.
pub static RECONCILE_BATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "suasor_reconcile_batches_total",
            "Total reconciliation batches",
        ),
        &["media_type", "result"], // result: "completed", "cancelled", "aborted"
    )
    .unwrap()
});

/// Reconciliation batch duration in seconds.
pub static RECONCILE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "suasor_reconcile_duration_seconds",
            "Duration of reconciliation batches",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["media_type"],
    )
    .unwrap()
});

// =============================================================================
// Client Fetch Metrics
// =============================================================================

/// Client fetch requests total.
pub static CLIENT_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "suasor_client_fetches_total",
            "Total fetches from external clients",
        ),
        &["client_type", "media_type", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Client fetch duration.
pub static CLIENT_FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "suasor_client_fetch_duration_seconds",
            "Duration of fetches from external clients",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["client_type", "media_type"],
    )
    .unwrap()
});

/// Items returned per fetch.
pub static CLIENT_FETCH_ITEMS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "suasor_client_fetch_items",
            "Number of items returned per client fetch",
        )
        .buckets(vec![0.0, 1.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]),
        &["media_type"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Reconciliation
        Box::new(RECONCILED_ITEMS.clone()),
        Box::new(RECONCILE_FAILURES.clone()),
        Box::new(RECONCILE_BATCHES.clone()),
        Box::new(RECONCILE_DURATION.clone()),
        // Client fetches
        Box::new(CLIENT_FETCHES.clone()),
        Box::new(CLIENT_FETCH_DURATION.clone()),
        Box::new(CLIENT_FETCH_ITEMS.clone()),
    ]
}
