//! Wayfarer guard admin binary.

use std::process::ExitCode;

use clap::Parser;
use wayfarer_guard::{GuardArgs, cli};

#[tokio::main]
async fn main() -> ExitCode {
    let args = GuardArgs::parse();

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
