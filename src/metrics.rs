//! Prometheus metrics for nfsstat-exporter.
//!
//! `ExporterMetrics` holds the long-lived self-metrics registered once at
//! startup. `PrometheusAccumulator` turns the measurements of a single
//! collection cycle into a fresh registry that is encoded and discarded.

use ahash::AHashMap as HashMap;
use nfsstat_exporter::nfsstat::{TAG_NFS_TYPE, TAG_NFS_VERSION};
use nfsstat_exporter::{Accumulator, GatherReport, MetricValue, Tags};
use prometheus::core::Collector as _;
use prometheus::{Gauge, IntCounter, IntGauge, IntGaugeVec, Opts, Registry};
use tracing::warn;

/// Prefix for every metric derived from nfsstat output.
pub const NFS_METRIC_PREFIX: &str = "nfs_";

const INTEGER_LABELS: &[&str] = &[TAG_NFS_VERSION, TAG_NFS_TYPE];
const STRING_LABELS: &[&str] = &[TAG_NFS_VERSION, TAG_NFS_TYPE, "value"];

/// Internal exporter_* metrics.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub scrape_duration: Gauge,
    pub measurements_emitted: IntGauge,
    pub lines_skipped: IntGauge,
    pub last_gather_clean: IntGauge,
    pub gathers_total: IntCounter,
}

impl ExporterMetrics {
    /// Creates and registers all exporter metrics with the registry.
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let scrape_duration = Gauge::new(
            "nfsstat_exporter_scrape_duration_seconds",
            "Time spent running nfsstat and encoding the last /metrics response",
        )?;
        let measurements_emitted = IntGauge::new(
            "nfsstat_exporter_measurements_emitted",
            "Measurements produced by the last collection cycle",
        )?;
        let lines_skipped = IntGauge::new(
            "nfsstat_exporter_lines_skipped",
            "nfsstat output lines that did not match the counter pattern in the last cycle",
        )?;
        let last_gather_clean = IntGauge::new(
            "nfsstat_exporter_last_gather_clean",
            "Whether the last collection cycle finished without diagnostics (1) or not (0)",
        )?;
        let gathers_total = IntCounter::new(
            "nfsstat_exporter_gathers_total",
            "Collection cycles run since startup",
        )?;

        registry.register(Box::new(scrape_duration.clone()))?;
        registry.register(Box::new(measurements_emitted.clone()))?;
        registry.register(Box::new(lines_skipped.clone()))?;
        registry.register(Box::new(last_gather_clean.clone()))?;
        registry.register(Box::new(gathers_total.clone()))?;

        Ok(Self {
            scrape_duration,
            measurements_emitted,
            lines_skipped,
            last_gather_clean,
            gathers_total,
        })
    }

    /// Records the outcome of one collection cycle.
    pub fn observe(&self, report: &GatherReport) {
        self.gathers_total.inc();
        self.measurements_emitted.set(report.emitted as i64);
        self.lines_skipped.set(report.skipped as i64);
        self.last_gather_clean.set(i64::from(report.is_clean()));
    }
}

/// Accumulator that exposes one collection cycle as Prometheus gauges.
///
/// Integer values become `nfs_<name>{nfs_version, nfs_type}`. String values
/// become `nfs_<name>_info{nfs_version, nfs_type, value} 1`.
pub struct PrometheusAccumulator {
    registry: Registry,
    families: HashMap<String, IntGaugeVec>,
}

impl Default for PrometheusAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl PrometheusAccumulator {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            families: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the family for `name`, registering it on first use.
    fn family(&mut self, name: &str, help: &str, labels: &[&str]) -> Option<&IntGaugeVec> {
        if !self.families.contains_key(name) {
            let vec = match IntGaugeVec::new(Opts::new(name, help), labels) {
                Ok(vec) => vec,
                Err(e) => {
                    warn!("Cannot create metric {}: {}", name, e);
                    return None;
                }
            };
            if let Err(e) = self.registry.register(Box::new(vec.clone())) {
                warn!("Cannot register metric {}: {}", name, e);
                return None;
            }
            self.families.insert(name.to_string(), vec);
        }

        let family = self.families.get(name)?;
        // A name first seen with another label set cannot take these labels
        if family.desc().first().map(|d| d.variable_labels.len()) != Some(labels.len()) {
            warn!("Metric {} already registered with different labels, skipping", name);
            return None;
        }
        Some(family)
    }
}

impl Accumulator for PrometheusAccumulator {
    fn add(&mut self, name: &str, value: MetricValue, tags: &Tags) {
        let version = tags.get(TAG_NFS_VERSION).map(String::as_str).unwrap_or("");
        let nfs_type = tags.get(TAG_NFS_TYPE).map(String::as_str).unwrap_or("");

        match value {
            MetricValue::Integer(v) => {
                let metric_name = format!("{NFS_METRIC_PREFIX}{name}");
                if let Some(family) = self.family(&metric_name, "nfsstat counter", INTEGER_LABELS)
                {
                    family.with_label_values(&[version, nfs_type]).set(v);
                }
            }
            MetricValue::String(s) => {
                let metric_name = format!("{NFS_METRIC_PREFIX}{name}_info");
                if let Some(family) =
                    self.family(&metric_name, "nfsstat non-numeric value", STRING_LABELS)
                {
                    family.with_label_values(&[version, nfs_type, s.as_str()]).set(1);
                }
            }
        }
    }
}
