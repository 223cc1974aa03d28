use crate::catalog_store::CatalogCounts;
use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all catalog server metrics
const PREFIX: &str = "splat";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Catalog Store Metrics
    pub static ref CATALOG_OPERATION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_catalog_operation_duration_seconds"),
            "Catalog store operation duration in seconds"
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["operation"]
    ).expect("Failed to create catalog_operation_duration_seconds metric");

    pub static ref CATALOG_ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_catalog_errors_total"), "Catalog store errors by operation and kind"),
        &["operation", "kind"]
    ).expect("Failed to create catalog_errors_total metric");

    pub static ref PLAYS_RECORDED_TOTAL: IntCounter = IntCounter::new(
        format!("{PREFIX}_plays_recorded_total"),
        "Sum of play counts accumulated since startup"
    ).expect("Failed to create plays_recorded_total metric");

    pub static ref CATALOG_ITEMS_TOTAL: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_catalog_items_total"), "Total items in catalog"),
        &["type"]
    ).expect("Failed to create catalog_items_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_OPERATION_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PLAYS_RECORDED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_ITEMS_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Publish catalog row counts
pub fn set_catalog_items(counts: &CatalogCounts) {
    CATALOG_ITEMS_TOTAL
        .with_label_values(&["artist"])
        .set(counts.artists as f64);
    CATALOG_ITEMS_TOTAL
        .with_label_values(&["album"])
        .set(counts.albums as f64);
    CATALOG_ITEMS_TOTAL
        .with_label_values(&["song"])
        .set(counts.songs as f64);
    CATALOG_ITEMS_TOTAL
        .with_label_values(&["playlist"])
        .set(counts.playlists as f64);
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record how long a catalog store operation took
pub fn record_catalog_operation(operation: &str, duration: Duration) {
    CATALOG_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record a failed catalog store operation
pub fn record_catalog_error(operation: &str, kind: &str) {
    CATALOG_ERRORS_TOTAL
        .with_label_values(&[operation, kind])
        .inc();
}

/// Record plays accumulated by a successful play upsert
pub fn record_plays_accumulated(play_count: i64) {
    if play_count > 0 {
        PLAYS_RECORDED_TOTAL.inc_by(play_count as u64);
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
