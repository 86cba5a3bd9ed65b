//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): responses by route, status
//! - `gateway_request_duration_seconds` (histogram): time from accept to response
//! - `gateway_rejections_total` (counter): connections refused before dispatch, by reason
//! - `gateway_executions_total` (counter): child processes by outcome
//! - `gateway_active_connections` (gauge): current connection count
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install metrics recorder"),
    }
}

pub fn record_request(route: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "gateway_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("gateway_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    ::metrics::counter!("gateway_rejections_total", "reason" => reason).increment(1);
}

pub fn record_execution(outcome: &'static str) {
    ::metrics::counter!("gateway_executions_total", "outcome" => outcome).increment(1);
}

pub fn set_active_connections(count: u64) {
    ::metrics::gauge!("gateway_active_connections").set(count as f64);
}
