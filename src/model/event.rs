use serde::Deserialize;

use super::issue::{IssueRef, PullRequestRef, RepoRef};
use crate::error::{SyncError, SyncResult};
use crate::providers::github::{GhIssue, GhPullRequest};

/// The CI event that started this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    IssueOpened(IssueRef),
    PullRequestOpened(PullRequestRef),
    IssueClosed(IssueRef),
}

#[derive(Deserialize)]
struct Payload {
    action: Option<String>,
    issue: Option<GhIssue>,
    pull_request: Option<GhPullRequest>,
    repository: Option<GhRepository>,
}

#[derive(Deserialize)]
struct GhRepository {
    name: String,
    owner: GhOwner,
}

#[derive(Deserialize)]
struct GhOwner {
    login: String,
}

impl TriggerEvent {
    /// Build from a webhook payload. `event_name` is `issues` or
    /// `pull_request`. The repository comes from the payload, or
    /// `fallback_repo` when the payload has none.
    pub fn from_payload(
        event_name: &str,
        payload: &str,
        fallback_repo: Option<&RepoRef>,
    ) -> SyncResult<Self> {
        let payload: Payload = serde_json::from_str(payload)
            .map_err(|e| SyncError::configuration(format!("invalid event payload: {e}")))?;

        let repo = match (payload.repository, fallback_repo) {
            (Some(r), _) => RepoRef::new(r.owner.login, r.name),
            (None, Some(r)) => r.clone(),
            (None, None) => {
                return Err(SyncError::configuration(
                    "event payload has no repository and GITHUB_REPOSITORY is not set",
                ))
            }
        };
        let action = payload.action.as_deref().unwrap_or_default();

        match (event_name, action) {
            ("issues", "opened" | "closed") => {
                let issue = payload
                    .issue
                    .ok_or_else(|| SyncError::configuration("issues event without an issue"))?
                    .into_issue_ref(repo);
                Ok(if action == "opened" {
                    Self::IssueOpened(issue)
                } else {
                    Self::IssueClosed(issue)
                })
            }
            ("pull_request" | "pull_request_target", "opened") => {
                let pr = payload
                    .pull_request
                    .ok_or_else(|| {
                        SyncError::configuration("pull_request event without a pull request")
                    })?
                    .into_pull_request_ref(repo);
                Ok(Self::PullRequestOpened(pr))
            }
            _ => Err(SyncError::configuration(format!(
                "unsupported event '{event_name}' with action '{action}'"
            ))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::IssueOpened(i) => format!("issue {}#{} opened", i.repo, i.number),
            Self::PullRequestOpened(p) => {
                format!("pull request {}#{} opened", p.repo, p.number)
            }
            Self::IssueClosed(i) => format!("issue {}#{} closed", i.repo, i.number),
        }
    }
}
