use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::params::segment;
use super::TrackerApi;
use crate::error::{SyncError, SyncResult};
use crate::model::issue::{IssuePatch, IssueRef, PullRequestRef, RepoRef};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

pub struct GitHubClient {
    api_base: String,
    client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(api_base: String, token: &str) -> SyncResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("trello-sync"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| SyncError::configuration("GITHUB_TOKEN contains invalid characters"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn issue_url(&self, repo: &RepoRef, number: u64) -> String {
        format!(
            "{}/repos/{}/{}/issues/{number}",
            self.api_base,
            segment(&repo.owner),
            segment(&repo.name)
        )
    }
}

async fn check(resp: Response) -> SyncResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SyncError::TrackerApi {
        status: status.as_u16(),
        body,
    })
}

/// Issue as it appears in both the REST API and webhook payloads.
#[derive(Debug, Deserialize)]
pub(crate) struct GhIssue {
    number: u64,
    title: String,
    body: Option<String>,
    html_url: String,
    #[serde(default)]
    labels: Vec<GhLabel>,
}

#[derive(Debug, Deserialize)]
struct GhLabel {
    name: String,
}

impl GhIssue {
    pub(crate) fn into_issue_ref(self, repo: RepoRef) -> IssueRef {
        IssueRef {
            repo,
            number: self.number,
            title: self.title,
            body: self.body,
            html_url: self.html_url,
            labels: self.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhPullRequest {
    number: u64,
    body: Option<String>,
    html_url: String,
}

impl GhPullRequest {
    pub(crate) fn into_pull_request_ref(self, repo: RepoRef) -> PullRequestRef {
        PullRequestRef {
            repo,
            number: self.number,
            body: self.body,
            html_url: self.html_url,
        }
    }
}

#[async_trait]
impl TrackerApi for GitHubClient {
    async fn get_issue(&self, repo: &RepoRef, number: u64) -> SyncResult<IssueRef> {
        let url = self.issue_url(repo, number);
        debug!(%url, "github get issue");
        let resp = self.client.get(url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(SyncError::IssueNotFound {
                repo: repo.clone(),
                number,
            });
        }
        let issue: GhIssue = check(resp).await?.json().await?;
        Ok(issue.into_issue_ref(repo.clone()))
    }

    async fn patch_issue(
        &self,
        repo: &RepoRef,
        number: u64,
        patch: &IssuePatch,
    ) -> SyncResult<()> {
        let url = self.issue_url(repo, number);
        debug!(%url, "github patch issue");
        let resp = self.client.patch(url).json(patch).send().await?;
        check(resp).await?;
        Ok(())
    }
}
