//! Prometheus metrics for probe traffic and readiness.
//!
//! Without an installed recorder every call here is a no-op, so handlers and
//! tests can use these helpers unconditionally.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::error::{ProbeError, Result};

// === Metric Name Constants ===

/// Probe requests counter metric name.
pub const METRIC_PROBE_REQUESTS: &str = "probe_requests_total";
/// Readiness gauge metric name.
pub const METRIC_APP_READY: &str = "app_ready";
/// Readiness transitions counter metric name.
pub const METRIC_READINESS_TRANSITIONS: &str = "readiness_transitions_total";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";

/// Install the global Prometheus recorder and describe all metrics.
///
/// Call once at startup. The returned handle renders the scrape body.
pub fn install_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ProbeError::Metrics(e.to_string()))?;
    init_metrics();
    Ok(handle)
}

/// Register metric descriptions with the installed recorder.
pub fn init_metrics() {
    describe_counter!(
        METRIC_PROBE_REQUESTS,
        "Total number of probe requests by endpoint and status"
    );
    describe_gauge!(METRIC_APP_READY, "1 when the app reports ready, 0 otherwise");
    describe_counter!(
        METRIC_READINESS_TRANSITIONS,
        "Number of not-ready to ready transitions"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );

    debug!("Metrics initialized");
}

/// Increment the probe request counter.
pub fn inc_probe_requests(endpoint: &'static str, status: u16) {
    counter!(METRIC_PROBE_REQUESTS, "endpoint" => endpoint, "status" => status.to_string())
        .increment(1);
}

/// Increment the readiness transitions counter.
pub fn inc_readiness_transitions() {
    counter!(METRIC_READINESS_TRANSITIONS).increment(1);
}

/// Set the readiness gauge.
pub fn set_ready(ready: bool) {
    gauge!(METRIC_APP_READY).set(if ready { 1.0 } else { 0.0 });
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}
