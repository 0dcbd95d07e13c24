//! Metrics collection and exposition.
//!
//! # Metrics
//! - `harness_requests_total` (counter): requests by method, status, route
//! - `harness_request_duration_seconds` (histogram): dispatch latency
//! - `harness_faults_total` (counter): server-side faults by kind
//! - `harness_client_faults_total` (counter): fetcher faults by kind
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::diagnostics::FaultKind;

/// Install the Prometheus recorder and its scrape endpoint.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("route", route.to_string()),
    ];
    counter!("harness_requests_total", &labels).increment(1);
    histogram!("harness_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_fault(kind: FaultKind) {
    counter!("harness_faults_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_client_fault(kind: &'static str) {
    counter!("harness_client_faults_total", "kind" => kind).increment(1);
}
