//! Integration tests for the nfsstat collector.
//!
//! These tests stand in for `nfsstat` with small shell scripts and verify
//! what reaches the accumulator for various process behaviours.

#![cfg(unix)]

use nfsstat_exporter::{
    CollectError, Collector, GatherReport, MemoryAccumulator, MetricValue, NfsStatCollector,
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes script creation and execution so no forked child inherits a
/// script that is still open for writing (ETXTBSY).
static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

/// Writes an executable shell script with the given body.
fn write_script(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("nfsstat");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    let mut perms = fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod script");
    path
}

/// Runs one gather against a script printing `body`.
fn gather_script(body: &str) -> (MemoryAccumulator, GatherReport) {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = write_script(&dir, body);

    let collector = NfsStatCollector::new(path);
    let mut acc = MemoryAccumulator::new();
    let report = collector.gather(&mut acc);
    (acc, report)
}

#[test]
fn test_well_formed_output() {
    let (acc, report) = gather_script(
        r#"echo "Server rpc stats:"
echo "v3 proc tcp calls: 1024"
echo "v3 proc tcp status: ok"
echo "garbage line here""#,
    );

    assert!(report.is_clean(), "unexpected diagnostics: {:?}", report.diagnostics);
    assert_eq!(report.emitted, 2);
    assert_eq!(report.skipped, 2);

    let measurements = acc.measurements();
    assert_eq!(measurements[0].name, "v3_proc_tcp_calls");
    assert_eq!(measurements[0].value, MetricValue::Integer(1024));
    assert_eq!(measurements[0].tags["nfs_version"], "v3");
    assert_eq!(measurements[0].tags["nfs_type"], "proc");

    assert_eq!(measurements[1].name, "v3_proc_tcp_status");
    assert_eq!(measurements[1].value, MetricValue::String("ok".into()));
}

#[test]
fn test_empty_output() {
    let (acc, report) = gather_script("true");

    assert!(acc.is_empty());
    assert!(report.is_clean());
}

#[test]
fn test_nonzero_exit_keeps_measurements() {
    let (acc, report) = gather_script(
        r#"echo "v4 client ops read: 12"
echo "v4 client ops write: 34"
echo "permission denied" >&2
exit 3"#,
    );

    assert_eq!(acc.len(), 2);
    assert_eq!(acc.measurements()[1].value, MetricValue::Integer(34));

    match report.last_diagnostic() {
        Some(CollectError::ExitStatus { status, stderr }) => {
            assert_eq!(status.code(), Some(3));
            assert_eq!(stderr, "permission denied");
        }
        other => panic!("expected exit status diagnostic, got {:?}", other),
    }
}

#[test]
fn test_large_stderr_does_not_block() {
    // Far beyond a pipe buffer on stderr while stdout is still being read
    let (acc, report) = gather_script(
        r#"i=0
while [ $i -lt 2000 ]; do
  echo "noise noise noise noise noise noise noise noise noise noise" >&2
  i=$((i + 1))
done
echo "v3 server rpc calls: 1""#,
    );

    assert_eq!(acc.len(), 1);
    assert!(report.is_clean());
}

#[test]
fn test_repeated_gathers_are_identical() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = write_script(
        &dir,
        r#"echo "v3 proc tcp calls: 1"
echo "v3 proc tcp getattr: 2"
echo "v2 proc udp null: none""#,
    );
    let collector = NfsStatCollector::new(path);

    let mut first = MemoryAccumulator::new();
    collector.gather(&mut first);
    let mut second = MemoryAccumulator::new();
    collector.gather(&mut second);

    assert_eq!(first.len(), 3);
    assert_eq!(first.measurements(), second.measurements());
}

#[test]
fn test_non_executable_file_logs_spawn_error() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("nfsstat");
    fs::write(&path, "not a program").expect("write file");
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o644);
    fs::set_permissions(&path, perms).unwrap();

    let collector = NfsStatCollector::new(path);
    let mut acc = MemoryAccumulator::new();
    let report = collector.gather(&mut acc);

    assert!(acc.is_empty());
    assert!(matches!(
        report.last_diagnostic(),
        Some(CollectError::Spawn { .. })
    ));
}

#[test]
fn test_missing_and_empty_paths_are_not_errors() {
    for path in ["", "/definitely/not/here/nfsstat"] {
        let collector = NfsStatCollector::new(path);
        let mut acc = MemoryAccumulator::new();

        let report = collector.gather(&mut acc);

        assert!(acc.is_empty());
        assert_eq!(report.emitted, 0);
        assert!(report.last_diagnostic().is_some_and(CollectError::is_skip));
    }
}

#[test]
fn test_non_utf8_line_does_not_end_cycle() {
    let (acc, report) = gather_script(
        r#"echo "v3 proc tcp calls: 1"
printf '\377 header\n'
echo "v3 proc tcp getattr: 2"
echo "v3 proc tcp read: 3""#,
    );

    assert!(report.is_clean(), "unexpected diagnostics: {:?}", report.diagnostics);
    assert_eq!(report.emitted, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(acc.measurements()[2].name, "v3_proc_tcp_read");
}
