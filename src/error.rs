use thiserror::Error;

use crate::marker::MarkerNotFound;
use crate::model::issue::RepoRef;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The invocation itself is wrong (bad action/event pairing, missing setting).
    /// Always raised before any remote call.
    #[error("{0}")]
    Configuration(String),

    #[error("Issue #{number} has no linked Trello card")]
    MarkerNotFound { number: u64 },

    #[error("Issue {repo}#{number} not found")]
    IssueNotFound { repo: RepoRef, number: u64 },

    #[error("Trello API returned {status}: {body}")]
    BoardApi { status: u16, body: String },

    #[error("GitHub API returned {status}: {body}")]
    TrackerApi { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{step} failed: {source}")]
    StepFailed {
        step: &'static str,
        #[source]
        source: Box<SyncError>,
    },

    #[error("{failed} of {total} referenced issues could not be processed")]
    ReferencesFailed { failed: usize, total: usize },
}

impl SyncError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn marker_not_found(number: u64) -> impl FnOnce(MarkerNotFound) -> Self {
        move |_| Self::MarkerNotFound { number }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
