//! Configuration management for nfsstat-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use anyhow::Context;
use clap::ValueEnum;
use nfsstat_exporter::DEFAULT_NFSSTAT_BIN;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::{Args, LogLevel, OutputFormat};

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9216;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Locations searched when no config file is given on the command line.
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "/etc/nfsstat-exporter/config.yaml",
    "/etc/nfsstat-exporter/config.yml",
    "/etc/nfsstat-exporter/config.json",
    "/etc/nfsstat-exporter/config.toml",
    "./nfsstat-exporter.yaml",
    "./nfsstat-exporter.yml",
    "./nfsstat-exporter.json",
    "./nfsstat-exporter.toml",
];

/// Effective exporter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    /// Path to the nfsstat binary; empty skips every collection cycle
    #[serde(alias = "NFSStatBin", alias = "nfsstat-bin")]
    pub nfsstat_bin: Option<PathBuf>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,
    #[serde(alias = "enable-telemetry")]
    pub enable_telemetry: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            nfsstat_bin: Some(PathBuf::from(DEFAULT_NFSSTAT_BIN)),
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
            enable_health: Some(true),
            enable_telemetry: Some(true),
        }
    }
}

impl Config {
    /// Binary path the collector is built with. A missing key means "not configured".
    pub fn nfsstat_bin(&self) -> PathBuf {
        self.nfsstat_bin.clone().unwrap_or_default()
    }

    pub fn bind_addr(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Parsed log level; unknown names fall back to info.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(|s| LogLevel::from_str(s, true).ok())
            .unwrap_or(LogLevel::Info)
    }
}

/// Reasons an effective configuration is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("port must not be 0")]
    InvalidPort,

    #[error("invalid bind address '{0}'")]
    InvalidBind(String),

    #[error("invalid log_level '{0}', expected off, error, warn, info, debug or trace")]
    InvalidLogLevel(String),
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.port == Some(0) {
        return Err(ConfigError::InvalidPort);
    }

    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<IpAddr>().is_err() {
            return Err(ConfigError::InvalidBind(bind.to_string()));
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::from_str(level, true).is_err() {
            return Err(ConfigError::InvalidLogLevel(level.to_string()));
        }
    }

    // An empty nfsstat_bin is tolerated: collection cycles are skipped with a warning.
    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }

    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if let Some(bin) = &args.nfsstat_bin {
        config.nfsstat_bin = Some(bin.clone());
    }

    if let Some(level) = args.log_level {
        if let Some(value) = level.to_possible_value() {
            config.log_level = Some(value.get_name().to_string());
        }
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }

    Ok(config)
}

/// Loads a config file, searching the default locations when `path` is None.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("invalid TOML in {}", path.display()))?,
        // Default to YAML
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display()))?,
    };

    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Serializes the configuration in the requested format
pub fn render_config(config: &Config, format: OutputFormat) -> anyhow::Result<String> {
    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(config)?,
        OutputFormat::Toml => toml::to_string_pretty(config)?,
        OutputFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}
