//! Gather command implementation.
//!
//! Runs a single collection cycle and prints the measurements.

use chrono::{DateTime, Utc};
use nfsstat_exporter::{Collector, Measurement, MemoryAccumulator, NfsStatCollector};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

use crate::cli::OutputFormat;

/// Serialized result of one collection cycle.
#[derive(Debug, Serialize)]
pub struct GatherOutput {
    pub collected_at: DateTime<Utc>,
    pub nfsstat_bin: PathBuf,
    pub duration_ms: f64,
    pub emitted: usize,
    pub skipped_lines: usize,
    pub diagnostics: Vec<String>,
    pub measurements: Vec<Measurement>,
}

/// Runs the collector once and captures everything it reported.
pub fn run_gather(collector: &NfsStatCollector) -> GatherOutput {
    let start = Instant::now();
    let mut acc = MemoryAccumulator::new();
    let report = collector.gather(&mut acc);
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    debug!("Gather finished in {:.2}ms", duration_ms);

    GatherOutput {
        collected_at: Utc::now(),
        nfsstat_bin: collector.stat_binary_path().to_path_buf(),
        duration_ms,
        emitted: report.emitted,
        skipped_lines: report.skipped,
        diagnostics: report.diagnostics.iter().map(|e| e.to_string()).collect(),
        measurements: acc.into_measurements(),
    }
}

/// Renders a gather result in the requested format.
pub fn render_gather(output: &GatherOutput, format: OutputFormat) -> anyhow::Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(output)?,
        OutputFormat::Toml => toml::to_string_pretty(output)?,
        OutputFormat::Yaml => serde_yaml::to_string(output)?,
    };
    Ok(rendered)
}

/// Runs one collection cycle and prints the result.
pub fn command_gather(collector: &NfsStatCollector, format: OutputFormat) -> anyhow::Result<()> {
    let output = run_gather(collector);
    println!("{}", render_gather(&output, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_missing_binary_renders_diagnostic() {
        let collector = NfsStatCollector::new("/nonexistent/nfsstat");
        let output = run_gather(&collector);

        assert_eq!(output.emitted, 0);
        assert!(output.measurements.is_empty());
        assert_eq!(output.diagnostics.len(), 1);

        for format in [OutputFormat::Yaml, OutputFormat::Json, OutputFormat::Toml] {
            let rendered = render_gather(&output, format).unwrap();
            assert!(rendered.contains("/nonexistent/nfsstat"));
        }
    }
}
