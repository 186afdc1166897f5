//! Check command implementation.
//!
//! Validates configuration and the configured nfsstat binary.

use nix::unistd::{access, AccessFlags};
use nfsstat_exporter::{Collector, MemoryAccumulator, NfsStatCollector};
use std::fs;

use crate::config::{validate_effective_config, Config};

/// Validates configuration and the nfsstat binary.
pub fn command_check(config: &Config, collector: &NfsStatCollector) -> anyhow::Result<()> {
    println!("🔍 nfsstat-exporter - System Check");
    println!("==================================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(()) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📁 Checking nfsstat binary...");
    let path = collector.stat_binary_path();
    if path.as_os_str().is_empty() {
        println!("   ❌ No nfsstat binary configured (collection cycles will be skipped)");
        all_ok = false;
    } else {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => {
                println!("   ✅ {} exists", path.display());
                match access(path, AccessFlags::X_OK) {
                    Ok(()) => println!("   ✅ {} is executable", path.display()),
                    Err(e) => {
                        println!("   ❌ {} is not executable: {}", path.display(), e);
                        all_ok = false;
                    }
                }
            }
            Ok(_) => {
                println!("   ❌ {} is not a regular file", path.display());
                all_ok = false;
            }
            Err(e) => {
                println!("   ❌ {} is not accessible: {}", path.display(), e);
                all_ok = false;
            }
        }
    }

    if all_ok {
        println!("\n🧪 Running one collection cycle...");
        let mut acc = MemoryAccumulator::new();
        let report = collector.gather(&mut acc);
        println!(
            "   📊 {} measurements, {} skipped lines",
            report.emitted, report.skipped
        );
        for diagnostic in &report.diagnostics {
            println!("   ⚠️  {}", diagnostic);
        }
        if report.emitted == 0 {
            println!("   ⚠️  nfsstat produced no counter lines");
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - exporter is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
