//! Command line surface of nfsstat-exporter.
//!
//! Without a subcommand the exporter serves HTTP; `gather`, `check` and
//! `config` are one-shot operations that exit when done.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Verbosity accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Rendering used for measurements and configuration dumps.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
    Toml,
}

#[derive(Parser, Debug, Default)]
#[command(
    name = "nfsstat-exporter",
    about = "Exports NFS protocol statistics collected from nfsstat",
    long_about = "Exports NFS protocol statistics collected from nfsstat.\n\n\
                  Runs the nfsstat utility on every scrape, parses its counter lines \
                  and serves them as Prometheus metrics tagged with the NFS version and \
                  statistic type.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Port serving /metrics and /health [default: 9216]
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Address the HTTP listener binds to [default: 0.0.0.0]
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Verbosity of diagnostics written to stderr
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Read settings from this file instead of the default locations
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Ignore every config file and use flags plus built-in defaults
    #[arg(long)]
    pub no_config: bool,

    /// nfsstat executable run on each collection cycle [default: /usr/sbin/nfsstat]
    #[arg(long, value_name = "PATH")]
    pub nfsstat_bin: Option<PathBuf>,

    /// Dump the settings the exporter would run with, then exit
    #[arg(long)]
    pub show_config: bool,

    /// Rendering of the --show-config dump
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: OutputFormat,

    /// Exit non-zero if the merged settings are invalid
    #[arg(long)]
    pub check_config: bool,

    /// Do not mount the /health route
    #[arg(long)]
    pub disable_health: bool,

    /// Leave nfsstat_exporter_* self-metrics out of /metrics
    #[arg(long)]
    pub disable_telemetry: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run nfsstat once and print the parsed measurements
    Gather {
        /// Rendering of the measurement list
        #[arg(long, value_enum, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Verify the settings and that nfsstat can be executed
    Check,

    /// Write a starter config file
    Config {
        /// Destination file, stdout when omitted or "-"
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// File format to write
        #[arg(long, value_enum, default_value = "yaml")]
        format: OutputFormat,

        /// Annotate each key with the nfsstat plugin's sample config
        #[arg(long)]
        commented: bool,
    },
}
