//! CLI command implementations for nfsstat-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `gather`: Run one collection cycle and print the measurements
//! - `check`: Configuration and binary validation
//! - `config`: Configuration file generation

pub mod check;
pub mod config;
pub mod gather;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use gather::command_gather;
