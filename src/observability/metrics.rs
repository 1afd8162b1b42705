//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, route, status
//! - `http_request_duration_seconds` (histogram): latency by method, route
//! - `timer_events_total` (counter): timer lifecycle events by kind
//! - `storage_ops_total` (counter): storage backend operations by op, outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);

    let labels = [("method", method.to_string()), ("route", route.to_string())];
    histogram!("http_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Record a timer lifecycle event (`started`, `stopped`, `updated`, `removed`).
pub fn record_timer_event(event: &'static str) {
    counter!("timer_events_total", "event" => event).increment(1);
}

/// Record one storage backend operation.
pub fn record_backend_op(op: &'static str, outcome: &str) {
    counter!("storage_ops_total", "op" => op, "outcome" => outcome.to_string()).increment(1);
}
