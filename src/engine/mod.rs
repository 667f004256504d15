//! The three workflows that keep an issue and its Trello card in step.
//!
//! Each workflow is a short saga over the board and tracker clients. The only
//! shared state between runs is the marker in the issue body.

pub mod labels;
pub mod references;
pub mod saga;

use std::sync::LazyLock;

use futures::future::join_all;
use regex::Regex;
use tracing::{error, info, instrument};

use crate::error::{SyncError, SyncResult};
use crate::marker;
use crate::model::card::{card_name, CardId, NewCard};
use crate::model::issue::{IssuePatch, IssueRef, PullRequestRef};
use crate::providers::{BoardApi, TrackerApi};
use labels::resolve_labels;
use references::{closing_references, IssueReference};
use saga::{BestEffort, Required, Saga, Step, StepWarning};

const LIST_BOARD_LABELS: Step<BestEffort> = Step::best_effort("list board labels");
const CREATE_CARD: Step<Required> = Step::required("create card");
const LINK_ISSUE: Step<Required> = Step::required("link issue to card");

const FETCH_CARD: Step<Required> = Step::required("fetch card");
const ADOPT_CARD: Step<Required> = Step::required("copy card onto issue");
const RENAME_CARD: Step<BestEffort> = Step::best_effort("rename card");
const ATTACH_ISSUE: Step<BestEffort> = Step::best_effort("attach issue to card");

const FETCH_REFERENCED_ISSUE: Step<Required> = Step::required("fetch referenced issue");
const MOVE_TO_REVIEW: Step<BestEffort> = Step::best_effort("move card to review");
const ATTACH_PULL_REQUEST: Step<BestEffort> = Step::best_effort("attach pull request to card");

const MOVE_TO_DONE: Step<Required> = Step::required("move card to done");
const UNLINK_ISSUE: Step<BestEffort> = Step::best_effort("remove card marker from issue");

/// An issue titled `fetch <card id>` links to an existing card instead of
/// creating one.
static FETCH_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*fetch\s+([0-9a-f]{24})\s*$").expect("fetch directive pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListIds {
    pub todo: Option<String>,
    pub review: Option<String>,
    pub done: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub board_id: Option<String>,
    pub lists: ListIds,
    pub repository_labels: Vec<String>,
}

fn require<'a>(value: &'a Option<String>, variable: &str) -> SyncResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SyncError::configuration(format!("{variable} is not set")))
}

/// What a workflow did, including what it had to let slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowReport {
    pub workflow: &'static str,
    pub card: Option<CardId>,
    pub warnings: Vec<StepWarning>,
    /// Issues a pull request says it closes, and those that could not be
    /// processed. Only the pull request workflow fills these in.
    pub references: usize,
    pub failures: Vec<String>,
}

impl WorkflowReport {
    fn new(workflow: &'static str, card: Option<CardId>, warnings: Vec<StepWarning>) -> Self {
        Self {
            workflow,
            card,
            warnings,
            references: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub const ISSUE_OPENED: &str = "create_card_when_issue_opened";
pub const PULL_REQUEST_OPENED: &str = "move_card_when_pull_request_opened";
pub const ISSUE_CLOSED: &str = "move_card_when_issue_closed";

pub struct LinkageEngine<B, T> {
    board: B,
    tracker: T,
    config: EngineConfig,
}

impl<B: BoardApi, T: TrackerApi> LinkageEngine<B, T> {
    pub fn new(board: B, tracker: T, config: EngineConfig) -> Self {
        Self {
            board,
            tracker,
            config,
        }
    }

    /// Create a card for a new issue, or adopt an existing card when the
    /// title is a `fetch <card id>` directive.
    #[instrument(skip_all, fields(issue = issue.number))]
    pub async fn issue_opened(&self, issue: &IssueRef) -> SyncResult<WorkflowReport> {
        match fetch_directive(&issue.title) {
            Some(card_id) => self.link_existing_card(issue, card_id).await,
            None => self.create_linked_card(issue).await,
        }
    }

    async fn create_linked_card(&self, issue: &IssueRef) -> SyncResult<WorkflowReport> {
        let list_id = require(&self.config.lists.todo, "TRELLO_TO_DO_LIST_ID")?;
        let board_id = require(&self.config.board_id, "TRELLO_BOARD_ID")?;
        let mut saga = Saga::new(ISSUE_OPENED);

        let catalog = saga
            .run(LIST_BOARD_LABELS, self.board.list_board_labels(board_id))
            .await?
            .unwrap_or_default();
        let names = issue
            .labels
            .iter()
            .chain(&self.config.repository_labels)
            .map(String::as_str);
        let label_ids = resolve_labels(names, &catalog);

        let new_card = NewCard {
            list_id: list_id.to_string(),
            name: card_name(issue.number, &issue.title),
            description: issue.body.clone().unwrap_or_default(),
            source_url: issue.html_url.clone(),
            label_ids,
        };
        let card = saga.run(CREATE_CARD, self.board.create_card(&new_card)).await?;
        info!(card = %card.id, url = %card.short_url, "created card");

        // From here on the card exists even if linking fails.
        let body = marker::compose(issue.body.as_deref(), &card);
        saga.run(
            LINK_ISSUE,
            self.tracker
                .patch_issue(&issue.repo, issue.number, &IssuePatch::body(body)),
        )
        .await?;

        Ok(WorkflowReport::new(
            ISSUE_OPENED,
            Some(card.id),
            saga.into_warnings(),
        ))
    }

    async fn link_existing_card(
        &self,
        issue: &IssueRef,
        card_id: CardId,
    ) -> SyncResult<WorkflowReport> {
        let mut saga = Saga::new(ISSUE_OPENED);
        let card = saga.run(FETCH_CARD, self.board.get_card(&card_id)).await?;
        info!(
            card = %card.id,
            name = %card.name,
            list = ?card.list_id,
            labels = card.label_ids.len(),
            "adopting existing card"
        );

        let patch = IssuePatch {
            title: Some(card.name.clone()),
            body: Some(marker::compose(Some(&card.description), &card)),
            labels: Some(card.label_names.clone()),
        };
        saga.run(
            ADOPT_CARD,
            self.tracker.patch_issue(&issue.repo, issue.number, &patch),
        )
        .await?;

        // The issue now carries the marker, so the link stands whatever
        // happens to the card below.
        if !card.name.starts_with(&format!("[#{}] ", issue.number)) {
            let numbered = card_name(issue.number, &card.name);
            saga.run(RENAME_CARD, self.board.rename_card(&card.id, &numbered))
                .await?;
        }
        saga.run(ATTACH_ISSUE, self.board.attach_url(&card.id, &issue.html_url))
            .await?;

        Ok(WorkflowReport::new(
            ISSUE_OPENED,
            Some(card.id),
            saga.into_warnings(),
        ))
    }

    /// Move the card of every issue the pull request closes to the review
    /// list. References are handled independently: one failing does not stop
    /// the others.
    #[instrument(skip_all, fields(pull_request = pr.number))]
    pub async fn pull_request_opened(&self, pr: &PullRequestRef) -> SyncResult<WorkflowReport> {
        let review_list = require(&self.config.lists.review, "TRELLO_REVIEW_LIST_ID")?;
        let mut saga = Saga::new(PULL_REQUEST_OPENED);

        let references = match pr.body.as_deref() {
            Some(body) => closing_references(body, &pr.repo),
            None => Vec::new(),
        };
        if references.is_empty() {
            saga.warn(
                "scan pull request body",
                "no closing references to linked issues found",
            );
            return Ok(WorkflowReport::new(
                PULL_REQUEST_OPENED,
                None,
                saga.into_warnings(),
            ));
        }
        info!(count = references.len(), "found closing references");

        let outcomes = join_all(
            references
                .iter()
                .map(|reference| self.move_referenced_card(reference, pr, review_list)),
        )
        .await;

        let mut report = WorkflowReport::new(PULL_REQUEST_OPENED, None, saga.into_warnings());
        report.references = references.len();
        for (reference, outcome) in references.iter().zip(outcomes) {
            match outcome {
                Ok(warnings) => report.warnings.extend(warnings),
                Err(e) => {
                    error!(%reference, error = %e, "referenced issue failed");
                    report.failures.push(format!("{reference}: {e}"));
                }
            }
        }
        Ok(report)
    }

    async fn move_referenced_card(
        &self,
        reference: &IssueReference,
        pr: &PullRequestRef,
        review_list: &str,
    ) -> SyncResult<Vec<StepWarning>> {
        let mut saga = Saga::new(PULL_REQUEST_OPENED);
        let issue = saga
            .run(
                FETCH_REFERENCED_ISSUE,
                self.tracker.get_issue(&reference.repo, reference.number),
            )
            .await?;

        let Ok(card_id) = marker::extract_card_id(issue.body.as_deref()) else {
            saga.warn(
                "find linked card",
                format!("{reference} has no linked Trello card, skipping"),
            );
            return Ok(saga.into_warnings());
        };

        if saga
            .run(MOVE_TO_REVIEW, self.board.move_card(&card_id, review_list))
            .await?
            .is_some()
        {
            info!(%reference, card = %card_id, "moved card to review");
        }
        saga.run(
            ATTACH_PULL_REQUEST,
            self.board.attach_url(&card_id, &pr.html_url),
        )
        .await?;
        Ok(saga.into_warnings())
    }

    /// Move the linked card to the done list, then drop the marker from the
    /// issue. The marker stays if the move fails.
    #[instrument(skip_all, fields(issue = issue.number))]
    pub async fn issue_closed(&self, issue: &IssueRef) -> SyncResult<WorkflowReport> {
        let done_list = require(&self.config.lists.done, "TRELLO_DONE_LIST_ID")?;
        let body = issue
            .body
            .as_deref()
            .ok_or(SyncError::MarkerNotFound {
                number: issue.number,
            })?;
        let card_id = marker::extract_card_id(Some(body))
            .map_err(SyncError::marker_not_found(issue.number))?;

        let mut saga = Saga::new(ISSUE_CLOSED);
        saga.run(MOVE_TO_DONE, self.board.move_card(&card_id, done_list))
            .await?;
        info!(card = %card_id, "moved card to done");

        let stripped = marker::strip(body);
        saga.run(
            UNLINK_ISSUE,
            self.tracker
                .patch_issue(&issue.repo, issue.number, &IssuePatch::body(stripped)),
        )
        .await?;

        Ok(WorkflowReport::new(
            ISSUE_CLOSED,
            Some(card_id),
            saga.into_warnings(),
        ))
    }
}

/// Card id named by a `fetch <card id>` issue title.
pub fn fetch_directive(title: &str) -> Option<CardId> {
    FETCH_DIRECTIVE
        .captures(title)
        .and_then(|caps| caps[1].to_ascii_lowercase().parse().ok())
}
