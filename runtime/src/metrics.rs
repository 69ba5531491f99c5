//! Prometheus metrics for the movies services.
//!
//! Recorders are zero-sized types with associated functions, one per concern:
//! - [`UpstreamMetrics`]: aggregator calls to the catalog and reviews services
//! - [`RetryMetrics`]: the retry engine
//! - [`ChangeStreamMetrics`]: change-stream publishes, drops and subscribers
//! - [`StoreMetrics`]: document-store operations
//!
//! Recording is a no-op until a recorder is installed, so library code calls
//! these unconditionally.
//!
//! # Example
//!
//! ```rust,no_run
//! use movies_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! let body = server.render().unwrap_or_default();
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
    /// Failed to bind HTTP server
    #[error("Failed to bind metrics server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Prometheus recorder plus the address its scrape endpoint is served on.
///
/// The binary serves [`render`](Self::render) at `GET /metrics` on
/// [`addr`](Self::addr).
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a metrics server for `addr` (e.g. `0.0.0.0:9090`).
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Describe all metrics and install the global Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or installed.
    /// A recorder that is already installed (several tests in one process)
    /// is tolerated and leaves [`handle`](Self::handle) empty.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(
                    addr = %self.addr,
                    "Metrics available at http://{}/metrics",
                    self.addr
                );
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!(
                        "Metrics recorder already initialized, skipping re-initialization"
                    );
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Address the scrape endpoint should bind.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Handle for rendering, if this instance installed the recorder.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    // Upstream calls
    describe_counter!(
        "upstream_requests_total",
        "Total number of HTTP requests sent to upstream services"
    );
    describe_histogram!(
        "upstream_request_duration_seconds",
        "Time taken by a single upstream request attempt"
    );

    // Retry
    describe_counter!("retry_attempts_total", "Total number of retry attempts");
    describe_counter!(
        "retry_successes_total",
        "Total number of operations that succeeded after a retry"
    );
    describe_counter!(
        "retry_exhausted_total",
        "Total number of operations that exhausted max retries"
    );

    // Change streams
    describe_counter!(
        "change_stream_published_total",
        "Total number of items published to change streams"
    );
    describe_counter!(
        "change_stream_delivered_total",
        "Total number of item deliveries to change stream subscribers"
    );
    describe_counter!(
        "change_stream_dropped_total",
        "Total number of deliveries dropped because a subscriber buffer was full"
    );
    describe_gauge!(
        "change_stream_subscribers",
        "Current number of change stream subscribers"
    );

    // Stores
    describe_counter!("store_operations_total", "Total number of document store operations");
    describe_counter!("store_errors_total", "Total number of failed document store operations");
    describe_histogram!(
        "store_operation_duration_seconds",
        "Time taken by document store operations"
    );
}

/// Upstream call metrics recorder.
pub struct UpstreamMetrics;

impl UpstreamMetrics {
    /// Record one request attempt against `upstream` with its outcome label
    /// (`"200"`, `"404"`, `"timeout"`, `"transport"`...).
    pub fn record_request(upstream: &'static str, outcome: &str, duration: Duration) {
        counter!(
            "upstream_requests_total",
            "upstream" => upstream,
            "outcome" => outcome.to_string()
        )
        .increment(1);
        histogram!("upstream_request_duration_seconds", "upstream" => upstream)
            .record(duration.as_secs_f64());
    }
}

/// Retry metrics recorder.
pub struct RetryMetrics;

impl RetryMetrics {
    /// Record a retry attempt.
    pub fn record_attempt() {
        counter!("retry_attempts_total").increment(1);
    }

    /// Record a success after at least one retry.
    pub fn record_success() {
        counter!("retry_successes_total").increment(1);
    }

    /// Record exhausted retries.
    pub fn record_exhausted() {
        counter!("retry_exhausted_total").increment(1);
    }
}

/// Change stream metrics recorder.
pub struct ChangeStreamMetrics;

impl ChangeStreamMetrics {
    /// Record a publish that reached `delivered` subscribers.
    pub fn record_publish(sink: &'static str, delivered: usize) {
        counter!("change_stream_published_total", "sink" => sink).increment(1);
        counter!("change_stream_delivered_total", "sink" => sink).increment(delivered as u64);
    }

    /// Record deliveries dropped on full buffers.
    pub fn record_dropped(sink: &'static str, dropped: usize) {
        counter!("change_stream_dropped_total", "sink" => sink).increment(dropped as u64);
    }

    /// Record the current subscriber count.
    #[allow(clippy::cast_precision_loss)] // subscriber counts are far below 2^52
    pub fn record_subscribers(sink: &'static str, subscribers: usize) {
        gauge!("change_stream_subscribers", "sink" => sink).set(subscribers as f64);
    }
}

/// Document store metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record a completed store operation.
    pub fn record_operation(store: &'static str, operation: &'static str, duration: Duration) {
        counter!("store_operations_total", "store" => store, "operation" => operation).increment(1);
        histogram!(
            "store_operation_duration_seconds",
            "store" => store,
            "operation" => operation
        )
        .record(duration.as_secs_f64());
    }

    /// Record a failed store operation.
    pub fn record_error(store: &'static str, operation: &'static str) {
        counter!("store_errors_total", "store" => store, "operation" => operation).increment(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn server_has_no_handle_before_start() {
        let server = MetricsServer::new("127.0.0.1:9090".parse().unwrap());
        assert!(server.handle().is_none());
        assert!(server.render().is_none());
        assert_eq!(server.addr().port(), 9090);
    }

    #[test]
    fn recorded_metrics_are_rendered() {
        let mut server = MetricsServer::new("127.0.0.1:0".parse().unwrap());
        server.start().unwrap();

        UpstreamMetrics::record_request("movies_info", "200", Duration::from_millis(12));
        RetryMetrics::record_attempt();
        ChangeStreamMetrics::record_publish("movie_info", 2);
        ChangeStreamMetrics::record_subscribers("movie_info", 2);
        StoreMetrics::record_operation("movie_info", "save", Duration::from_millis(3));

        // Another test in this process may have installed the recorder first.
        if let Some(rendered) = server.render() {
            assert!(rendered.contains("upstream_requests_total"));
            assert!(rendered.contains("retry_attempts_total"));
            assert!(rendered.contains("change_stream_published_total"));
            assert!(rendered.contains("store_operations_total"));
        }
    }
}
