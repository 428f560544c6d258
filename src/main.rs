//! Unified wayfarer-rs CLI.
//!
//! This binary provides a unified interface to all wayfarer components:
//! - `wayfarer-rs server` - Run the HTTP server
//! - `wayfarer-rs guard` - Manage profiles, tiers and storage usage (SQL backend)
//!
//! Each subcommand can also be run as a standalone binary.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// Wayfarer-rs unified CLI.
#[derive(Parser)]
#[command(
    name = "wayfarer-rs",
    version,
    about = "Storage quota and ownership guard for the wayfarer dashboard",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    #[command(name = "server", alias = "serve")]
    Server(Box<wayfarer_server::ServerArgs>),

    /// Manage profiles, tiers and storage usage (SQL backend).
    #[command(name = "guard")]
    Guard(wayfarer_guard::GuardArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Server(args) => wayfarer_server::cli::run(*args).await,
        Commands::Guard(args) => wayfarer_guard::cli::run(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
