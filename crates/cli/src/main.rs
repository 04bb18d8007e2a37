//! org-governance CLI entry point.
//!
//! This binary is the composition root. It parses the command line, wires
//! observability, builds the GitHub adapter from the CI environment and
//! hands it to the workflows as port trait objects.
//!
//! Every run is wrapped in a `run` span carrying a fresh `run_id` and the
//! command name, so every event a run emits can be correlated.

mod cli;
mod commands;
mod context;
mod discovery;
mod observability;
mod output;

use std::process::ExitCode;

use clap::Parser;
use governance::RunId;
use tracing::Instrument;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _telemetry = match observability::init(cli.log_format) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialise logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let run_id = RunId::new_random();
    let span = tracing::info_span!("run", %run_id, command = cli.command.name());

    match commands::run(cli).instrument(span).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(%run_id, error = %format!("{e:#}"), "Command failed");
            ExitCode::FAILURE
        }
    }
}
