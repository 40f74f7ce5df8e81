//! Prometheus metrics

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Snapshots fetched from the exchange
    SnapshotsFetched,
    /// Ticks skipped on fetch or spread errors
    TicksSkipped,
    /// Rows persisted to the lake
    RowsWritten,
    /// Rows lost to filesystem failures
    WriteErrors,
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::SnapshotsFetched => "bitso_capture_snapshots_total",
            CounterMetric::TicksSkipped => "bitso_capture_ticks_skipped_total",
            CounterMetric::RowsWritten => "bitso_capture_rows_written_total",
            CounterMetric::WriteErrors => "bitso_capture_write_errors_total",
        }
    }
}

/// Increment a per-book counter
pub fn increment_counter(metric: CounterMetric, book: &str) {
    counter!(metric.name(), "book" => book.to_string()).increment(1);
}

/// Record an order book fetch latency
pub fn record_fetch_latency(book: &str, duration: Duration) {
    histogram!("bitso_capture_fetch_latency_ms", "book" => book.to_string())
        .record(duration.as_secs_f64() * 1000.0);
}

/// Start the Prometheus scrape endpoint on the given port
pub(super) fn install_prometheus_exporter(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(port, "Prometheus exporter listening");
    Ok(())
}
