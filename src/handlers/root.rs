//! Root endpoint handler.
//!
//! Lists the available endpoints and basic runtime information.

use axum::{extract::State, response::IntoResponse};
use nfsstat_exporter::Collector;
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.health_stats.record_http_request();

    let version = env!("CARGO_PKG_VERSION");

    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;

    let mut endpoints = vec!["  /metrics   Prometheus metrics (runs nfsstat on every scrape)"];
    if state.config.enable_health.unwrap_or(true) {
        endpoints.push("  /health    Collection statistics");
    }

    format!(
        "nfsstat-exporter {version}\n\
         {description}\n\n\
         Uptime: {hours}h {minutes}m {seconds}s\n\
         nfsstat binary: {bin}\n\n\
         Endpoints:\n{endpoints}\n",
        description = state.collector.description(),
        bin = state.collector.stat_binary_path().display(),
        endpoints = endpoints.join("\n"),
    )
}
