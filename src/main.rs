mod app;
mod cli;
mod config;
mod engine;
mod error;
mod logging;
mod marker;
mod model;
mod providers;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use cli::Cli;
use engine::LinkageEngine;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_format);
    let annotate = std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true");

    match run(cli, annotate).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            // Setup failed before a workflow could start.
            let message = format!("{e:#}");
            error!(error = %message, "run failed");
            if annotate {
                println!("::error::{}", app::escape_command(&message));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, annotate: bool) -> Result<bool> {
    let config = config::load_config(cli.config.as_deref())?;
    let event = cli::load_event(&cli, config.fallback_repo()?.as_ref())?;

    let (board, tracker) = providers::create_clients(&config)?;
    let engine = LinkageEngine::new(board, tracker, config.engine_config());

    let outcome = app::dispatch(&engine, cli.action, &event).await;
    let success = app::report_outcome(&outcome, annotate, &mut std::io::stdout())?;
    Ok(success)
}
