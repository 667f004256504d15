use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::app::Action;
use crate::logging::LogFormat;
use crate::model::event::TriggerEvent;
use crate::model::issue::RepoRef;

/// Keep Trello cards in step with GitHub issues and pull requests.
///
/// Meant to run as a CI step: every option falls back to the variable GitHub
/// Actions sets for it.
#[derive(Debug, Parser)]
#[command(name = "trello-sync", version)]
pub struct Cli {
    /// Workflow to run
    #[arg(long, env = "INPUT_TRELLO-ACTION", value_enum)]
    pub action: Action,

    /// Webhook event name, e.g. `issues` or `pull_request`
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    pub event_name: String,

    /// Path to the webhook payload JSON
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: PathBuf,

    /// Optional TOML config; environment variables take precedence
    #[arg(long, env = "TRELLO_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "TRELLO_SYNC_LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Read and parse the event payload named on the command line.
pub fn load_event(cli: &Cli, fallback_repo: Option<&RepoRef>) -> Result<TriggerEvent> {
    let payload = std::fs::read_to_string(&cli.event_path).with_context(|| {
        format!("Failed to read event payload from {}", cli.event_path.display())
    })?;
    let event = TriggerEvent::from_payload(&cli.event_name, &payload, fallback_repo)?;
    Ok(event)
}
