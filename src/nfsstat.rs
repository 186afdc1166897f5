//! `nfsstat` output collector.
//!
//! Runs the configured `nfsstat` binary once per collection cycle, scans its
//! standard output line by line and forwards one measurement per line shaped
//! like `v3 proc tcp calls: 1024`. Every failure is logged and recorded in the
//! returned [`GatherReport`]; a cycle never fails as a whole.

use regex::Regex;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, error, warn};

use crate::accumulator::{Accumulator, MetricValue, Tags};
use crate::error::CollectError;

/// Conventional location of the `nfsstat` binary.
pub const DEFAULT_NFSSTAT_BIN: &str = "/usr/sbin/nfsstat";

/// Tag carrying the first token of a line (protocol version).
pub const TAG_NFS_VERSION: &str = "nfs_version";
/// Tag carrying the second token of a line (statistic type).
pub const TAG_NFS_TYPE: &str = "nfs_type";

/// Four word tokens, a colon, optional whitespace and a trailing word token.
const LINE_PATTERN: &str = r"(?-u)(\w+)\s+(\w+)\s+(\w+)\s+(\w+):\s*(\w+)";

const SAMPLE_CONFIG: &str = r#"
  # The path to nfsstat binary defaults to /usr/sbin/nfsstat
  nfsstat_bin: "/usr/sbin/nfsstat"
"#;

/// Seam between the host and a metrics source.
pub trait Collector: Send + Sync {
    /// Short name used for logging.
    fn name(&self) -> &str;

    /// One-line human description.
    fn description(&self) -> &str;

    /// Commented configuration snippet for generated config files.
    fn sample_config(&self) -> &str;

    /// Runs one collection cycle, reporting measurements to `acc`.
    fn gather(&self, acc: &mut dyn Accumulator) -> GatherReport;
}

/// The five tokens captured from one matching output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub version: &'a str,
    pub nfs_type: &'a str,
    pub category: &'a str,
    pub counter_name: &'a str,
    pub raw_value: &'a str,
}

impl ParsedLine<'_> {
    /// `{version}_{type}_{category}_{counter}`
    pub fn measurement_name(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.version, self.nfs_type, self.category, self.counter_name
        )
    }

    pub fn tags(&self) -> Tags {
        let mut tags = Tags::new();
        tags.insert(TAG_NFS_VERSION.to_string(), self.version.to_string());
        tags.insert(TAG_NFS_TYPE.to_string(), self.nfs_type.to_string());
        tags
    }

    pub fn value(&self) -> MetricValue {
        MetricValue::parse(self.raw_value)
    }
}

/// Outcome of one collection cycle.
#[derive(Debug, Default)]
pub struct GatherReport {
    /// Measurements handed to the accumulator.
    pub emitted: usize,
    /// Output lines that did not match the line pattern.
    pub skipped: usize,
    /// Logged problems, in the order they happened.
    pub diagnostics: Vec<CollectError>,
}

impl GatherReport {
    /// True when nothing had to be logged.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn last_diagnostic(&self) -> Option<&CollectError> {
        self.diagnostics.last()
    }

    fn record(&mut self, err: CollectError) {
        if err.is_skip() {
            warn!("{}", err);
        } else {
            error!("{}", err);
        }
        self.diagnostics.push(err);
    }
}

/// Collector backed by the `nfsstat` command line utility.
#[derive(Debug, Clone)]
pub struct NfsStatCollector {
    stat_binary_path: PathBuf,
    pattern: Regex,
}

impl Default for NfsStatCollector {
    fn default() -> Self {
        Self::new(DEFAULT_NFSSTAT_BIN)
    }
}

impl NfsStatCollector {
    /// Creates a collector for the binary at `stat_binary_path`.
    ///
    /// An empty path is accepted; every cycle is then skipped with a warning.
    pub fn new(stat_binary_path: impl Into<PathBuf>) -> Self {
        Self {
            stat_binary_path: stat_binary_path.into(),
            pattern: Regex::new(LINE_PATTERN).expect("nfsstat line pattern is valid"),
        }
    }

    pub fn stat_binary_path(&self) -> &Path {
        &self.stat_binary_path
    }

    /// Matches one output line against the counter pattern.
    pub fn parse_line<'a>(&self, line: &'a str) -> Option<ParsedLine<'a>> {
        let caps = self.pattern.captures(line)?;
        let group = |i: usize| caps.get(i).map(|m| m.as_str());

        Some(ParsedLine {
            version: group(1)?,
            nfs_type: group(2)?,
            category: group(3)?,
            counter_name: group(4)?,
            raw_value: group(5)?,
        })
    }

    /// Feeds every line of `reader` through the pattern and into `acc`.
    ///
    /// Lines that are not valid UTF-8 are decoded lossily and usually end up
    /// skipped. An I/O error stops the scan; measurements already emitted stand.
    pub fn scan<R: BufRead>(
        &self,
        mut reader: R,
        acc: &mut dyn Accumulator,
        report: &mut GatherReport,
    ) {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    report.record(CollectError::Read(e));
                    break;
                }
            }

            let raw = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = String::from_utf8_lossy(raw);

            let Some(parsed) = self.parse_line(&line) else {
                report.skipped += 1;
                continue;
            };

            acc.add(&parsed.measurement_name(), parsed.value(), &parsed.tags());
            report.emitted += 1;
        }
    }

    /// Checks the configured path before anything is spawned.
    fn precheck(&self) -> Result<(), CollectError> {
        if self.stat_binary_path.as_os_str().is_empty() {
            return Err(CollectError::MissingBinaryPath);
        }

        match std::fs::metadata(&self.stat_binary_path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CollectError::BinaryNotFound(self.stat_binary_path.clone()))
            }
            // Other metadata failures surface when spawning
            _ => Ok(()),
        }
    }

    fn run(&self, acc: &mut dyn Accumulator, report: &mut GatherReport) {
        let path = &self.stat_binary_path;

        let mut child = match Command::new(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(source) => {
                report.record(CollectError::Spawn {
                    path: path.clone(),
                    source,
                });
                return;
            }
        };
        debug!("Started {} (pid {})", path.display(), child.id());

        // Drained separately so a chatty stderr cannot stall the child
        let stderr_drain = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                if let Err(e) = stderr.read_to_end(&mut buf) {
                    debug!("Failed to read nfsstat stderr: {}", e);
                }
                buf
            })
        });

        match child.stdout.take() {
            Some(stdout) => self.scan(BufReader::new(stdout), acc, report),
            None => {
                report.record(CollectError::StdoutUnavailable(path.clone()));
                if let Err(e) = child.kill() {
                    debug!("Failed to kill {}: {}", path.display(), e);
                }
            }
        }

        let status = child.wait();
        let stderr = stderr_drain
            .and_then(|handle| handle.join().ok())
            .map(|buf| String::from_utf8_lossy(&buf).trim_end().to_string())
            .unwrap_or_default();

        match status {
            Ok(status) if status.success() => {
                debug!("{} exited successfully", path.display());
            }
            Ok(status) => report.record(CollectError::ExitStatus { status, stderr }),
            Err(e) => {
                report.record(CollectError::Wait(e));
                if !stderr.is_empty() {
                    error!("{}", stderr);
                }
            }
        }
    }
}

impl Collector for NfsStatCollector {
    fn name(&self) -> &str {
        "nfs"
    }

    fn description(&self) -> &str {
        "Reads 'nfsstat' stats"
    }

    fn sample_config(&self) -> &str {
        SAMPLE_CONFIG
    }

    fn gather(&self, acc: &mut dyn Accumulator) -> GatherReport {
        let mut report = GatherReport::default();

        match self.precheck() {
            Ok(()) => self.run(acc, &mut report),
            Err(e) => report.record(e),
        }

        debug!(
            emitted = report.emitted,
            skipped = report.skipped,
            diagnostics = report.diagnostics.len(),
            "nfsstat gather finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::MemoryAccumulator;
    use std::io::Cursor;

    const SAMPLE_OUTPUT: &str = "\
Server rpc stats:
calls      badcalls   badfmt     badauth    badclnt
v3 proc tcp calls: 1024
v3 proc tcp status: ok
garbage line here
v4 ops udp getattr:   77
";

    #[test]
    fn test_parse_integer_line() {
        let collector = NfsStatCollector::default();
        let parsed = collector
            .parse_line("v3 proc tcp calls: 1024")
            .expect("line should match");

        assert_eq!(parsed.measurement_name(), "v3_proc_tcp_calls");
        assert_eq!(parsed.tags().get(TAG_NFS_VERSION).map(String::as_str), Some("v3"));
        assert_eq!(parsed.tags().get(TAG_NFS_TYPE).map(String::as_str), Some("proc"));
        assert_eq!(parsed.tags().len(), 2);
        assert_eq!(parsed.value(), MetricValue::Integer(1024));
    }

    #[test]
    fn test_parse_string_line() {
        let collector = NfsStatCollector::default();
        let parsed = collector.parse_line("v3 proc tcp status: ok").unwrap();

        assert_eq!(parsed.measurement_name(), "v3_proc_tcp_status");
        assert_eq!(parsed.value(), MetricValue::String("ok".into()));
    }

    #[test]
    fn test_parse_without_space_after_colon() {
        let collector = NfsStatCollector::default();
        let parsed = collector.parse_line("v4 ops udp read:5").unwrap();
        assert_eq!(parsed.raw_value, "5");
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        let collector = NfsStatCollector::default();
        assert!(collector.parse_line("garbage line here").is_none());
        assert!(collector.parse_line("v3 proc tcp calls 1024").is_none());
        assert!(collector.parse_line("proc tcp calls: 1024").is_none());
        assert!(collector.parse_line("").is_none());
    }

    #[test]
    fn test_scan_counts_emitted_and_skipped() {
        let collector = NfsStatCollector::default();
        let mut acc = MemoryAccumulator::new();
        let mut report = GatherReport::default();

        collector.scan(Cursor::new(SAMPLE_OUTPUT), &mut acc, &mut report);

        assert_eq!(report.emitted, 3);
        assert_eq!(report.skipped, 3);
        assert!(report.is_clean());

        let names: Vec<&str> = acc.measurements().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["v3_proc_tcp_calls", "v3_proc_tcp_status", "v4_ops_udp_getattr"]
        );
        assert_eq!(acc.measurements()[2].value, MetricValue::Integer(77));
    }

    #[test]
    fn test_scan_is_repeatable() {
        let collector = NfsStatCollector::default();

        let mut first = MemoryAccumulator::new();
        collector.scan(Cursor::new(SAMPLE_OUTPUT), &mut first, &mut GatherReport::default());
        let mut second = MemoryAccumulator::new();
        collector.scan(Cursor::new(SAMPLE_OUTPUT), &mut second, &mut GatherReport::default());

        assert_eq!(first.measurements(), second.measurements());
    }

    #[test]
    fn test_scan_skips_invalid_utf8_line_and_continues() {
        let collector = NfsStatCollector::default();
        let mut acc = MemoryAccumulator::new();
        let mut report = GatherReport::default();
        let input: &[u8] =
            b"v3 proc tcp calls: 1\n\xff header\nv3 proc tcp getattr: 2\r\nv3 proc tcp read: 3";

        collector.scan(Cursor::new(input), &mut acc, &mut report);

        assert_eq!(acc.len(), 3);
        assert_eq!(report.emitted, 3);
        assert_eq!(report.skipped, 1);
        assert!(report.is_clean());
        assert_eq!(acc.measurements()[1].value, MetricValue::Integer(2));
        assert_eq!(acc.measurements()[2].name, "v3_proc_tcp_read");
    }

    #[test]
    fn test_scan_records_io_error() {
        struct FailingReader;

        impl Read for FailingReader {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"))
            }
        }

        let collector = NfsStatCollector::default();
        let mut acc = MemoryAccumulator::new();
        let mut report = GatherReport::default();

        collector.scan(BufReader::new(FailingReader), &mut acc, &mut report);

        assert!(acc.is_empty());
        assert!(matches!(report.last_diagnostic(), Some(CollectError::Read(_))));
    }

    #[test]
    fn test_gather_with_empty_path_is_skipped() {
        let collector = NfsStatCollector::new("");
        let mut acc = MemoryAccumulator::new();

        let report = collector.gather(&mut acc);

        assert!(acc.is_empty());
        assert_eq!(report.emitted, 0);
        assert!(matches!(
            report.last_diagnostic(),
            Some(CollectError::MissingBinaryPath)
        ));
    }

    #[test]
    fn test_gather_with_missing_binary_is_skipped() {
        let collector = NfsStatCollector::new("/nonexistent/path/to/nfsstat");
        let mut acc = MemoryAccumulator::new();

        let report = collector.gather(&mut acc);

        assert!(acc.is_empty());
        assert!(matches!(
            report.last_diagnostic(),
            Some(CollectError::BinaryNotFound(_))
        ));
    }

    #[test]
    fn test_collector_metadata() {
        let collector = NfsStatCollector::default();
        assert_eq!(collector.name(), "nfs");
        assert_eq!(collector.description(), "Reads 'nfsstat' stats");
        assert!(collector.sample_config().contains(DEFAULT_NFSSTAT_BIN));
        assert_eq!(collector.stat_binary_path(), Path::new(DEFAULT_NFSSTAT_BIN));
    }
}
