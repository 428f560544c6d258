//! Wayfarer server standalone binary.

use std::process::ExitCode;

use clap::Parser;
use wayfarer_server::{ServerArgs, cli};

#[tokio::main]
async fn main() -> ExitCode {
    let args = ServerArgs::parse();
    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
