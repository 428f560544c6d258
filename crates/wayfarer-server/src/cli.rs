//! CLI module for wayfarer-server.
//!
//! This module provides the command-line interface that can be used either
//! as a standalone binary or as a subcommand of the main wayfarer-rs CLI.

use std::io;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wayfarer_config::{CliOverrides, LoggingConfig, apply_overrides, load_config, validate_config};

use crate::{CancellationToken, run_with_shutdown};

/// Wayfarer server CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wayfarer-server",
    version,
    about = "Storage quota and ownership guard for the wayfarer dashboard"
)]
pub struct ServerArgs {
    /// Config file path (json/jsonc/yaml/toml)
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// Run the wayfarer server with the given arguments.
///
/// This is the main entry point for the server CLI, used by both the
/// standalone binary and the unified wayfarer-rs CLI.
pub async fn run(args: ServerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;
    apply_overrides(&mut config, &args.overrides);
    validate_config(&config)?;

    init_tracing(&config.logging);

    if let Some(listen) = &config.metrics.listen {
        match wayfarer_metrics::init_prometheus(listen) {
            Ok(()) => info!("metrics exporter listening on {}", listen),
            Err(e) => warn!("failed to start metrics exporter: {}", e),
        }
    }

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal_handler().await;
        shutdown_signal.cancel();
    });

    run_with_shutdown(config, shutdown).await?;
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Build the filter directive string from base level and per-module filters.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.as_deref().unwrap_or("info").to_string();
    let mut modules: Vec<_> = config.filters.iter().collect();
    modules.sort();
    for (module, level) in modules {
        filter_str.push(',');
        filter_str.push_str(module);
        filter_str.push('=');
        filter_str.push_str(level);
    }
    filter_str
}

/// Initialize tracing subscriber with the given logging configuration.
///
/// Supports:
/// - `level`: Base log level (trace, debug, info, warn, error)
/// - `format`: Output format (json, pretty, compact). Default: pretty
/// - `output`: Output target (stdout, stderr). Default: stderr
/// - `filters`: Per-module log level overrides
fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_new(filter_directives(config)).unwrap_or_else(|_| EnvFilter::new("info"));
    let writer = match config.output.as_deref() {
        Some("stdout") => BoxMakeWriter::new(io::stdout),
        _ => BoxMakeWriter::new(io::stderr),
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.format.as_deref().unwrap_or("pretty") {
        "json" => registry.with(fmt::layer().json().with_writer(writer)).init(),
        "compact" => registry.with(fmt::layer().compact().with_writer(writer)).init(),
        _ => registry.with(fmt::layer().with_writer(writer)).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        let mut cfg = LoggingConfig {
            level: Some("debug".into()),
            ..Default::default()
        };
        assert_eq!(filter_directives(&cfg), "debug");

        cfg.filters.insert("sqlx".into(), "warn".into());
        cfg.filters.insert("hyper".into(), "error".into());
        assert_eq!(filter_directives(&cfg), "debug,hyper=error,sqlx=warn");
    }

    #[test]
    fn test_parse_args() {
        let args = ServerArgs::try_parse_from([
            "wayfarer-server",
            "-c",
            "wayfarer.yaml",
            "--listen",
            "127.0.0.1:0",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("wayfarer.yaml"));
        assert_eq!(args.overrides.listen.as_deref(), Some("127.0.0.1:0"));
    }
}
