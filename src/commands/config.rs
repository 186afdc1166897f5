//! Config command implementation.
//!
//! Generates configuration files in various formats.

use anyhow::Context;
use nfsstat_exporter::{Collector, NfsStatCollector};
use std::fs;
use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: OutputFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("nfsstat-exporter.yaml"));

    let mut content = render_config(&config, format)?;
    if commented && matches!(format, OutputFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)
            .with_context(|| format!("failed to write {}", output.display()))?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let collector = NfsStatCollector::default();
    let comments = format!(
        r#"# nfsstat-exporter Configuration
# ==============================
#
# Collector: {description}
#{sample}#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9216                   # HTTP port
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# Feature Flags
# -------------
# enable_health: true          # Enable /health endpoint
# enable_telemetry: true       # Enable internal nfsstat_exporter_* metrics
"#,
        description = collector.description(),
        sample = collector
            .sample_config()
            .lines()
            .map(|l| format!("#{l}\n"))
            .collect::<String>(),
    );

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commented_yaml_still_parses() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let commented = add_config_comments(yaml);

        assert!(commented.contains("Reads 'nfsstat' stats"));
        let parsed: Config = serde_yaml::from_str(&commented).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_config_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        command_config(Some(path.clone()), OutputFormat::Json, false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Config = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
