//! Recording fakes for the board and tracker, sharing one call log so tests
//! can check ordering across both services.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{BoardApi, TrackerApi};
use crate::error::{SyncError, SyncResult};
use crate::model::card::{BoardLabel, CardId, CardRef, NewCard};
use crate::model::issue::{IssuePatch, IssueRef, RepoRef};

pub const NEW_CARD_ID: &str = "0123456789abcdef01234567";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListBoardLabels(String),
    GetCard(String),
    CreateCard(NewCard),
    MoveCard { card: String, list: String },
    RenameCard { card: String, name: String },
    AttachUrl { card: String, url: String },
    GetIssue { repo: RepoRef, number: u64 },
    PatchIssue { repo: RepoRef, number: u64, patch: IssuePatch },
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub struct MockBoard {
    calls: CallLog,
    labels: Vec<BoardLabel>,
    cards: HashMap<String, CardRef>,
    failing: HashSet<&'static str>,
}

impl MockBoard {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            labels: Vec::new(),
            cards: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    pub fn with_labels(mut self, labels: &[(&str, &str)]) -> Self {
        self.labels = labels
            .iter()
            .map(|(name, id)| BoardLabel {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        self
    }

    pub fn with_card(mut self, card: CardRef) -> Self {
        self.cards.insert(card.id.to_string(), card);
        self
    }

    /// Make `operation` (a trait method name) fail with a 500.
    pub fn with_failure(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    fn record(&self, call: Call, operation: &'static str) -> SyncResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(operation) {
            return Err(SyncError::BoardApi {
                status: 500,
                body: format!("mock {operation} failure"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BoardApi for MockBoard {
    async fn list_board_labels(&self, board_id: &str) -> SyncResult<Vec<BoardLabel>> {
        self.record(Call::ListBoardLabels(board_id.into()), "list_board_labels")?;
        Ok(self.labels.clone())
    }

    async fn get_card(&self, card_id: &CardId) -> SyncResult<CardRef> {
        self.record(Call::GetCard(card_id.to_string()), "get_card")?;
        self.cards
            .get(card_id.as_str())
            .cloned()
            .ok_or_else(|| SyncError::BoardApi {
                status: 404,
                body: "The requested resource was not found.".into(),
            })
    }

    async fn create_card(&self, card: &NewCard) -> SyncResult<CardRef> {
        self.record(Call::CreateCard(card.clone()), "create_card")?;
        Ok(CardRef {
            id: NEW_CARD_ID.parse().unwrap(),
            name: card.name.clone(),
            short_url: "https://trello.com/c/NeWcArD1".into(),
            description: card.description.clone(),
            list_id: Some(card.list_id.clone()),
            label_ids: card.label_ids.clone(),
            label_names: Vec::new(),
        })
    }

    async fn move_card(&self, card_id: &CardId, list_id: &str) -> SyncResult<()> {
        self.record(
            Call::MoveCard {
                card: card_id.to_string(),
                list: list_id.into(),
            },
            "move_card",
        )
    }

    async fn rename_card(&self, card_id: &CardId, name: &str) -> SyncResult<()> {
        self.record(
            Call::RenameCard {
                card: card_id.to_string(),
                name: name.into(),
            },
            "rename_card",
        )
    }

    async fn attach_url(&self, card_id: &CardId, url: &str) -> SyncResult<()> {
        self.record(
            Call::AttachUrl {
                card: card_id.to_string(),
                url: url.into(),
            },
            "attach_url",
        )
    }
}

pub struct MockTracker {
    calls: CallLog,
    issues: HashMap<(RepoRef, u64), IssueRef>,
    failing: HashSet<&'static str>,
}

impl MockTracker {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            issues: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    pub fn with_issue(mut self, issue: IssueRef) -> Self {
        self.issues
            .insert((issue.repo.clone(), issue.number), issue);
        self
    }

    pub fn with_failure(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    fn record(&self, call: Call, operation: &'static str) -> SyncResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(operation) {
            return Err(SyncError::TrackerApi {
                status: 500,
                body: format!("mock {operation} failure"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TrackerApi for MockTracker {
    async fn get_issue(&self, repo: &RepoRef, number: u64) -> SyncResult<IssueRef> {
        self.record(
            Call::GetIssue {
                repo: repo.clone(),
                number,
            },
            "get_issue",
        )?;
        self.issues
            .get(&(repo.clone(), number))
            .cloned()
            .ok_or_else(|| SyncError::IssueNotFound {
                repo: repo.clone(),
                number,
            })
    }

    async fn patch_issue(
        &self,
        repo: &RepoRef,
        number: u64,
        patch: &IssuePatch,
    ) -> SyncResult<()> {
        self.record(
            Call::PatchIssue {
                repo: repo.clone(),
                number,
                patch: patch.clone(),
            },
            "patch_issue",
        )
    }
}
