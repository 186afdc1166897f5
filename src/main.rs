//! nfsstat-exporter - version 0.1.0
//!
//! Exports NFS statistics collected from nfsstat, with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod health_stats;
mod metrics;
mod state;

use anyhow::Context;
use axum::{routing::get, Router};
use clap::Parser;
use nfsstat_exporter::NfsStatCollector;
use prometheus::Registry;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal};
use tracing::{debug, info, warn, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_gather};
use config::{resolve_config, show_config, validate_effective_config, Config};
use handlers::{health_handler, metrics_handler, root_handler};
use health_stats::HealthStats;
use metrics::ExporterMetrics;
use state::AppState;

/// Initializes tracing logging subsystem with configured log level.
///
/// Diagnostics are written to stderr so stdout stays clean for command output.
fn setup_logging(config: &Config) {
    let log_level = match config.log_level() {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };

    let Some(log_level) = log_level else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    debug!("Logging initialized with level: {:?}", log_level);
}

/// Loads and validates configuration, exiting with code 1 if it is invalid.
fn load_validated_config(args: &Args) -> anyhow::Result<Config> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return command_config(output.clone(), *format, *commented);
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config);

    let collector = NfsStatCollector::new(config.nfsstat_bin());

    match &args.command {
        Some(Commands::Gather { format }) => return command_gather(&collector, *format),
        Some(Commands::Check) => return command_check(&config, &collector),
        Some(Commands::Config { .. }) => unreachable!("Config handled above"),
        None => {}
    }

    info!("Starting nfsstat-exporter");

    if config.nfsstat_bin().as_os_str().is_empty() {
        warn!("No nfsstat binary configured - every scrape will be empty");
    } else if !config.nfsstat_bin().exists() {
        warn!(
            "{} does not exist - scrapes will be empty until it appears",
            config.nfsstat_bin().display()
        );
    }

    let registry = Registry::new();
    let metrics = ExporterMetrics::new(&registry).context("failed to register exporter metrics")?;
    debug!("Exporter metrics registered");

    let state = Arc::new(AppState {
        registry,
        metrics,
        collector: Arc::new(collector),
        config: Arc::new(config.clone()),
        health_stats: Arc::new(HealthStats::new()),
        start_time: Instant::now(),
    });

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler));

    if config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state);

    let bind_ip: IpAddr = config
        .bind_addr()
        .parse()
        .context("invalid bind address")?;
    let addr = SocketAddr::new(bind_ip, config.port());
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("nfsstat-exporter listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("nfsstat-exporter stopped gracefully");
    Ok(())
}
