//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): requests by method, status
//! - `api_request_duration_seconds` (histogram): latency distribution
//! - `api_cache_lookups_total` (counter): cache hits and misses
//! - `api_seeded_rows_total` (counter): rows written by seeding
//! - `api_health_status` (gauge): 1=healthy, 0=unhealthy, per check
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; the Prometheus exporter is
//!   only installed when enabled, otherwise every call is a no-op

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, started: Instant) {
    let status = status.to_string();
    metrics::counter!(
        "api_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "api_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(started.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(key: &str, hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    metrics::counter!("api_cache_lookups_total", "key" => key.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn record_seeded(table: &'static str, rows: usize) {
    metrics::counter!("api_seeded_rows_total", "table" => table).increment(rows as u64);
}

pub fn record_health(check: &str, healthy: bool) {
    metrics::gauge!("api_health_status", "check" => check.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
