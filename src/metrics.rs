//! Run metrics for the harvester
//!
//! Emission goes through the `metrics` facade and costs nothing until a
//! recorder is installed. [`init_metrics`] installs the Prometheus exporter
//! with a scrape endpoint; the CLI only calls it when `--metrics-addr` is set.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Metrics setup errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Exporter could not be installed
    #[error("failed to install Prometheus exporter: {0}")]
    Install(String),
}

/// Install the Prometheus exporter on `addr`.
///
/// Idempotent: later calls are no-ops. Must run inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics system on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| {
            METRICS_INITIALIZED.store(false, Ordering::SeqCst);
            MetricsError::Install(e.to_string())
        })?;

    describe_counter!(
        "http_requests_total",
        Unit::Count,
        "Total number of HTTP requests made to the REST API"
    );
    describe_counter!(
        "http_failures_total",
        Unit::Count,
        "Total number of HTTP requests that failed"
    );
    describe_counter!(
        "pages_omitted_total",
        Unit::Count,
        "Pages whose items are missing from the result"
    );
    describe_counter!(
        "records_fetched_total",
        Unit::Count,
        "Records fetched, by type"
    );
    describe_gauge!(
        "queue_in_flight",
        Unit::Count,
        "Page requests currently in flight"
    );
    describe_histogram!(
        "target_duration_seconds",
        Unit::Seconds,
        "Time to fetch every page of one target"
    );

    Ok(())
}

/// Whether [`init_metrics`] has installed an exporter
pub fn is_initialized() -> bool {
    METRICS_INITIALIZED.load(Ordering::SeqCst)
}

/// Count an outgoing request
pub fn record_request(method: &'static str) {
    counter!("http_requests_total", "method" => method).increment(1);
}

/// Count a failed request
pub fn record_http_failure(method: &'static str) {
    counter!("http_failures_total", "method" => method).increment(1);
}

/// Count a page dropped from a merged result
pub fn record_page_omitted() {
    counter!("pages_omitted_total").increment(1);
}

/// Count records fetched for a type
pub fn record_records_fetched(type_name: &str, count: usize) {
    counter!("records_fetched_total", "type" => type_name.to_string()).increment(count as u64);
}

/// Report the number of in-flight page requests
pub fn set_queue_in_flight(in_flight: usize) {
    gauge!("queue_in_flight").set(in_flight as f64);
}

/// Record how long one target took
pub fn record_target_duration(type_name: &str, elapsed: Duration) {
    histogram!("target_duration_seconds", "type" => type_name.to_string())
        .record(elapsed.as_secs_f64());
}
