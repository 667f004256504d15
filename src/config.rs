use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::engine::{EngineConfig, ListIds};
use crate::model::issue::RepoRef;
use crate::providers::{github, trello};

/// Everything a run needs. Read from an optional TOML file, then overridden by
/// the environment variables a CI workflow sets.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    pub trello: TrelloConfig,
    pub github: GitHubConfig,
    /// Labels attached to every card created from an issue.
    pub repository_labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TrelloConfig {
    pub api_key: String,
    pub token: String,
    pub board_id: Option<String>,
    pub todo_list_id: Option<String>,
    pub review_list_id: Option<String>,
    pub done_list_id: Option<String>,
    pub api_base: String,
}

impl Default for TrelloConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            token: String::new(),
            board_id: None,
            todo_list_id: None,
            review_list_id: None,
            done_list_id: None,
            api_base: trello::DEFAULT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub token: String,
    pub api_base: String,
    /// `owner/repo`, used when the event payload has no repository.
    pub repository: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: github::DEFAULT_API_BASE.to_string(),
            repository: None,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Like `load_config`, with environment lookups going through `lookup`.
pub fn load_config_with(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SyncConfig> {
    let mut config = match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => SyncConfig::default(),
    };
    config.apply_env(lookup);
    config.validate()?;
    Ok(config)
}

/// Split a comma-separated label input, dropping blanks.
pub fn parse_label_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl SyncConfig {
    /// Overlay values from `lookup`. Empty variables count as unset.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("TRELLO_API_KEY") {
            self.trello.api_key = v;
        }
        if let Some(v) = var("TRELLO_API_TOKEN") {
            self.trello.token = v;
        }
        if let Some(v) = var("TRELLO_API_URL") {
            self.trello.api_base = v;
        }
        for (key, slot) in [
            ("TRELLO_BOARD_ID", &mut self.trello.board_id),
            ("TRELLO_TO_DO_LIST_ID", &mut self.trello.todo_list_id),
            ("TRELLO_REVIEW_LIST_ID", &mut self.trello.review_list_id),
            ("TRELLO_DONE_LIST_ID", &mut self.trello.done_list_id),
            ("GITHUB_REPOSITORY", &mut self.github.repository),
        ] {
            if let Some(v) = var(key) {
                *slot = Some(v);
            }
        }
        if let Some(v) = var("GITHUB_TOKEN") {
            self.github.token = v;
        }
        if let Some(v) = var("GITHUB_API_URL") {
            self.github.api_base = v;
        }
        if let Some(v) = var("INPUT_REPOSITORY-LABELS") {
            self.repository_labels = parse_label_list(&v);
        }
    }

    /// Credentials are needed by every workflow. List ids are checked by the
    /// workflow that uses them.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("TRELLO_API_KEY", &self.trello.api_key),
            ("TRELLO_API_TOKEN", &self.trello.token),
            ("GITHUB_TOKEN", &self.github.token),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect();

        if !missing.is_empty() {
            bail!("Missing required configuration: {}", missing.join(", "));
        }
        Ok(())
    }

    pub fn fallback_repo(&self) -> Result<Option<RepoRef>> {
        self.github
            .repository
            .as_deref()
            .map(|r| r.parse::<RepoRef>().context("Invalid GITHUB_REPOSITORY"))
            .transpose()
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            board_id: self.trello.board_id.clone(),
            lists: ListIds {
                todo: self.trello.todo_list_id.clone(),
                review: self.trello.review_list_id.clone(),
                done: self.trello.done_list_id.clone(),
            },
            repository_labels: self.repository_labels.clone(),
        }
    }
}
