//! Health statistics and monitoring for the exporter.
//!
//! This module tracks collection cycle outcomes and HTTP request counts
//! for the `/health` endpoint.

use chrono::{DateTime, Utc};
use nfsstat_exporter::GatherReport;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::Instant;

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// (last, avg, max, min, count)
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Summary of the most recent collection cycle.
#[derive(Debug, Clone)]
pub struct LastGather {
    pub finished_at: DateTime<Utc>,
    pub emitted: usize,
    pub skipped: usize,
    pub diagnostic: Option<String>,
}

/// Exporter health statistics.
pub struct HealthStats {
    pub gathers_total: AtomicU64,
    pub unclean_gathers: AtomicU64,
    pub http_requests: AtomicU64,
    pub gather_duration_seconds: Stat,
    pub emitted_per_gather: Stat,
    pub start_time: Instant,
    pub last_gather: StdRwLock<Option<LastGather>>,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            gathers_total: AtomicU64::new(0),
            unclean_gathers: AtomicU64::new(0),
            http_requests: AtomicU64::new(0),
            gather_duration_seconds: Stat::default(),
            emitted_per_gather: Stat::default(),
            start_time: Instant::now(),
            last_gather: StdRwLock::new(None),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_http_request(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the outcome of one collection cycle.
    pub fn record_gather(&self, report: &GatherReport, duration_seconds: f64) {
        self.gathers_total.fetch_add(1, Ordering::Relaxed);
        if !report.is_clean() {
            self.unclean_gathers.fetch_add(1, Ordering::Relaxed);
        }
        self.gather_duration_seconds.add_sample(duration_seconds);
        self.emitted_per_gather.add_sample(report.emitted as f64);

        if let Ok(mut guard) = self.last_gather.write() {
            *guard = Some(LastGather {
                finished_at: Utc::now(),
                emitted: report.emitted,
                skipped: report.skipped,
                diagnostic: report.last_diagnostic().map(|e| e.to_string()),
            });
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// True until a cycle has run, or when the last cycle logged nothing.
    pub fn last_gather_clean(&self) -> bool {
        self.last_gather
            .read()
            .ok()
            .and_then(|g| g.as_ref().map(|l| l.diagnostic.is_none()))
            .unwrap_or(true)
    }

    /// Renders the statistics as a plain-text table.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        writeln!(out, "COLLECTION").ok();
        writeln!(out, "==========").ok();
        writeln!(
            out,
            "gathers_total:      {}",
            self.gathers_total.load(Ordering::Relaxed)
        )
        .ok();
        writeln!(
            out,
            "unclean_gathers:    {}",
            self.unclean_gathers.load(Ordering::Relaxed)
        )
        .ok();
        writeln!(
            out,
            "http_requests:      {}",
            self.http_requests.load(Ordering::Relaxed)
        )
        .ok();

        writeln!(out).ok();
        writeln!(out, "{:<26} {:>10} {:>10} {:>10} {:>10}", "", "last", "avg", "max", "min").ok();
        for (name, stat) in [
            ("gather_duration_seconds", &self.gather_duration_seconds),
            ("emitted_per_gather", &self.emitted_per_gather),
        ] {
            let (last, avg, max, min, _) = stat.snapshot();
            writeln!(
                out,
                "{:<26} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
                name, last, avg, max, min
            )
            .ok();
        }

        writeln!(out).ok();
        writeln!(out, "LAST GATHER").ok();
        writeln!(out, "===========").ok();
        match self.last_gather.read().ok().and_then(|g| g.clone()) {
            Some(last) => {
                writeln!(out, "finished_at:        {}", last.finished_at.to_rfc3339()).ok();
                writeln!(out, "emitted:            {}", last.emitted).ok();
                writeln!(out, "skipped_lines:      {}", last.skipped).ok();
                writeln!(
                    out,
                    "diagnostic:         {}",
                    last.diagnostic.as_deref().unwrap_or("none")
                )
                .ok();
            }
            None => {
                writeln!(out, "no collection cycle has run yet").ok();
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nfsstat_exporter::CollectError;

    #[test]
    fn test_running_stat() {
        let mut stat = RunningStat::default();
        stat.add(2.0);
        stat.add(4.0);
        stat.add(3.0);
        assert_eq!(stat.avg(), 3.0);
        assert_eq!(stat.min, 2.0);
        assert_eq!(stat.max, 4.0);
        assert_eq!(stat.last, 3.0);
    }

    #[test]
    fn test_record_gather_tracks_unclean_cycles() {
        let stats = HealthStats::new();
        assert!(stats.last_gather_clean());

        let clean = GatherReport {
            emitted: 4,
            skipped: 1,
            diagnostics: Vec::new(),
        };
        stats.record_gather(&clean, 0.01);
        assert!(stats.last_gather_clean());

        let unclean = GatherReport {
            emitted: 0,
            skipped: 0,
            diagnostics: vec![CollectError::MissingBinaryPath],
        };
        stats.record_gather(&unclean, 0.0);

        assert_eq!(stats.gathers_total.load(Ordering::Relaxed), 2);
        assert_eq!(stats.unclean_gathers.load(Ordering::Relaxed), 1);
        assert!(!stats.last_gather_clean());
        assert!(stats.render_table().contains("path to nfsstat binary required"));
    }
}
