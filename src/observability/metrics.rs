//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_forward_failures_total` (counter): backend failures by route, kind
//! - `gateway_relay_errors_total` (counter): truncated response bodies by route
//!
//! Unmatched requests use the route label `none` (or `static` when a static
//! site answered them). Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_forward_failure(route: &str, kind: &'static str) {
    metrics::counter!(
        "gateway_forward_failures_total",
        "route" => route.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_relay_error(route: &str) {
    metrics::counter!("gateway_relay_errors_total", "route" => route.to_string()).increment(1);
}
