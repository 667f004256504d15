use std::fmt;
use std::io::Write;

use clap::ValueEnum;
use tracing::{error, info, warn};

use crate::engine::{self, LinkageEngine, WorkflowReport};
use crate::error::{SyncError, SyncResult};
use crate::model::event::TriggerEvent;
use crate::providers::{BoardApi, TrackerApi};

/// Which workflow this run performs, chosen by the CI workflow file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    #[value(name = "create_card_when_issue_opened")]
    CreateCardWhenIssueOpened,
    #[value(name = "move_card_when_pull_request_opened")]
    MoveCardWhenPullRequestOpened,
    #[value(name = "move_card_when_issue_closed")]
    MoveCardWhenIssueClosed,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateCardWhenIssueOpened => engine::ISSUE_OPENED,
            Action::MoveCardWhenPullRequestOpened => engine::PULL_REQUEST_OPENED,
            Action::MoveCardWhenIssueClosed => engine::ISSUE_CLOSED,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run the workflow for `action`. A mismatched event is rejected before any
/// remote call.
pub async fn dispatch<B: BoardApi, T: TrackerApi>(
    engine: &LinkageEngine<B, T>,
    action: Action,
    event: &TriggerEvent,
) -> SyncResult<WorkflowReport> {
    info!(%action, event = %event.describe(), "dispatching");
    match (action, event) {
        (Action::CreateCardWhenIssueOpened, TriggerEvent::IssueOpened(issue)) => {
            engine.issue_opened(issue).await
        }
        (Action::MoveCardWhenPullRequestOpened, TriggerEvent::PullRequestOpened(pr)) => {
            engine.pull_request_opened(pr).await
        }
        (Action::MoveCardWhenIssueClosed, TriggerEvent::IssueClosed(issue)) => {
            engine.issue_closed(issue).await
        }
        (Action::MoveCardWhenPullRequestOpened, _) => Err(SyncError::configuration(format!(
            "Action {action} may only be called on pull requests."
        ))),
        (Action::CreateCardWhenIssueOpened, _) => Err(SyncError::configuration(format!(
            "Action {action} may only be called on issues."
        ))),
        (Action::MoveCardWhenIssueClosed, _) => Err(SyncError::configuration(format!(
            "Action {action} may only be called on issues."
        ))),
    }
}

/// Write the outcome as GitHub Actions workflow commands (`::warning::`,
/// `::error::`) when `annotate` is set, and log it either way. Returns whether
/// the run should exit successfully.
pub fn report_outcome(
    outcome: &SyncResult<WorkflowReport>,
    annotate: bool,
    out: &mut impl Write,
) -> std::io::Result<bool> {
    match outcome {
        Ok(report) => {
            for warning in &report.warnings {
                warn!(workflow = report.workflow, %warning, "completed with warning");
                if annotate {
                    writeln!(out, "::warning::{}", escape_command(&warning.to_string()))?;
                }
            }
            for failure in &report.failures {
                if annotate {
                    writeln!(out, "::error::{}", escape_command(failure))?;
                }
            }
            if report.is_success() {
                info!(workflow = report.workflow, card = ?report.card, "done");
                Ok(true)
            } else {
                let summary = SyncError::ReferencesFailed {
                    failed: report.failures.len(),
                    total: report.references,
                };
                error!(workflow = report.workflow, "{summary}");
                if annotate {
                    writeln!(out, "::error::{}", escape_command(&summary.to_string()))?;
                }
                Ok(false)
            }
        }
        Err(e) => {
            error!(error = %e, "run failed");
            if annotate {
                writeln!(out, "::error::{}", escape_command(&e.to_string()))?;
            }
            Ok(false)
        }
    }
}

/// Workflow command data must not contain raw `%`, CR or LF.
pub(crate) fn escape_command(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
