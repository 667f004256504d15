pub mod github;
pub mod params;
pub mod trello;

use async_trait::async_trait;

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::model::card::{BoardLabel, CardId, CardRef, NewCard};
use crate::model::issue::{IssuePatch, IssueRef, RepoRef};

/// Trello side of the link.
#[async_trait]
pub trait BoardApi: Send + Sync {
    async fn list_board_labels(&self, board_id: &str) -> SyncResult<Vec<BoardLabel>>;
    async fn get_card(&self, card_id: &CardId) -> SyncResult<CardRef>;
    async fn create_card(&self, card: &NewCard) -> SyncResult<CardRef>;
    /// Only `idList` changes. Moving a card to the list it is already in succeeds.
    async fn move_card(&self, card_id: &CardId, list_id: &str) -> SyncResult<()>;
    async fn rename_card(&self, card_id: &CardId, name: &str) -> SyncResult<()>;
    async fn attach_url(&self, card_id: &CardId, url: &str) -> SyncResult<()>;
}

/// GitHub side of the link.
#[async_trait]
pub trait TrackerApi: Send + Sync {
    async fn get_issue(&self, repo: &RepoRef, number: u64) -> SyncResult<IssueRef>;
    async fn patch_issue(&self, repo: &RepoRef, number: u64, patch: &IssuePatch)
        -> SyncResult<()>;
}

#[cfg(test)]
pub mod mock;

pub fn create_clients(
    config: &SyncConfig,
) -> SyncResult<(trello::TrelloClient, github::GitHubClient)> {
    let board = trello::TrelloClient::new(
        config.trello.api_base.clone(),
        config.trello.api_key.clone(),
        config.trello.token.clone(),
    );
    let tracker = github::GitHubClient::new(config.github.api_base.clone(), &config.github.token)?;
    Ok((board, tracker))
}
