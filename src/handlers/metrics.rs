//! Metrics endpoint handler for Prometheus scraping.
//!
//! Every `/metrics` request runs one nfsstat collection cycle on a blocking
//! task and returns its measurements in Prometheus text format, followed by
//! the exporter's own metrics.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use nfsstat_exporter::Collector;
use prometheus::{Encoder, TextEncoder};
use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::metrics::PrometheusAccumulator;
use crate::state::SharedState;

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 64 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    GatherAborted,
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        let message = match self {
            MetricsError::GatherAborted => "Collection cycle aborted",
            MetricsError::EncodingFailed => "Failed to encode metrics",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    let start = Instant::now();
    debug!("Processing /metrics request");
    state.health_stats.record_http_request();

    // nfsstat is a blocking child process
    let collector = state.collector.clone();
    let (acc, report, gather_seconds) = tokio::task::spawn_blocking(move || {
        let gather_start = Instant::now();
        let mut acc = PrometheusAccumulator::new();
        let report = collector.gather(&mut acc);
        (acc, report, gather_start.elapsed().as_secs_f64())
    })
    .await
    .map_err(|e| {
        error!("Collection task failed: {}", e);
        MetricsError::GatherAborted
    })?;

    state.health_stats.record_gather(&report, gather_seconds);

    let mut families = acc.registry().gather();

    if state.config.enable_telemetry.unwrap_or(true) {
        state.metrics.observe(&report);
        state
            .metrics
            .scrape_duration
            .set(start.elapsed().as_secs_f64());
        families.extend(state.registry.gather());
    }

    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    if TextEncoder::new().encode(&families, &mut buffer).is_err() {
        error!("Failed to encode Prometheus metrics");
        return Err(MetricsError::EncodingFailed);
    }

    debug!(
        "Metrics request completed: {} measurements, {} skipped lines, {} bytes, {:.3}ms",
        report.emitted,
        report.skipped,
        buffer.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    String::from_utf8(buffer).map_err(|_| MetricsError::EncodingFailed)
}
