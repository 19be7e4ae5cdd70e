/// Metrics and telemetry for the user directory
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Record store operations
/// - Avatar uploads and cleanup

use lazy_static::lazy_static;
use prometheus::{
    register_gauge, register_histogram, register_histogram_vec, register_int_counter,
    register_int_counter_vec, Encoder, Gauge, Histogram, HistogramVec, IntCounter,
    IntCounterVec, TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // ========== Store Metrics ==========

    /// Record store operations by operation type
    pub static ref USER_STORE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "user_store_operations_total",
        "Total number of user store operations",
        &["operation", "status"]
    )
    .unwrap();

    // ========== Avatar Metrics ==========

    /// Avatar uploads by outcome
    pub static ref AVATAR_UPLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "avatar_uploads_total",
        "Total number of avatar uploads",
        &["status"]
    )
    .unwrap();

    /// Size of stored avatars in bytes
    pub static ref AVATAR_UPLOAD_BYTES: Histogram = register_histogram!(
        "avatar_upload_bytes",
        "Size of stored avatars in bytes",
        vec![1_000.0, 10_000.0, 50_000.0, 100_000.0, 250_000.0, 500_000.0, 1_000_000.0, 2_000_000.0]
    )
    .unwrap();

    /// Stale avatar files removed after an upsert
    pub static ref AVATAR_FILES_PRUNED_TOTAL: IntCounter = register_int_counter!(
        "avatar_files_pruned_total",
        "Total number of stale avatar files removed"
    )
    .unwrap();

    // ========== System Metrics ==========

    /// Application uptime in seconds
    pub static ref UPTIME_SECONDS: Gauge = register_gauge!(
        "uptime_seconds",
        "Application uptime in seconds"
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a store operation
pub fn record_store_operation(operation: &str, success: bool) {
    let status = if success { "ok" } else { "error" };
    USER_STORE_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
}

/// Record an avatar upload
pub fn record_avatar_upload(size: Option<usize>) {
    match size {
        Some(size) => {
            AVATAR_UPLOADS_TOTAL.with_label_values(&["ok"]).inc();
            AVATAR_UPLOAD_BYTES.observe(size as f64);
        }
        None => AVATAR_UPLOADS_TOTAL.with_label_values(&["error"]).inc(),
    }
}

/// Record stale avatar files removed by cleanup
pub fn record_avatars_pruned(count: usize) {
    AVATAR_FILES_PRUNED_TOTAL.inc_by(count as u64);
}
