use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Trello card identifier: 24 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardId(String);

pub const CARD_ID_LEN: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a Trello card id")]
pub struct InvalidCardId(pub String);

impl CardId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CardId {
    type Err = InvalidCardId;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let valid = raw.len() == CARD_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidCardId(raw.to_string()))
        }
    }
}

impl TryFrom<String> for CardId {
    type Error = InvalidCardId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<CardId> for String {
    fn from(id: CardId) -> Self {
        id.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRef {
    pub id: CardId,
    pub name: String,
    pub short_url: String,
    pub description: String,
    pub list_id: Option<String>,
    pub label_ids: Vec<String>,
    pub label_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoardLabel {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Fields for a card created from an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub list_id: String,
    pub name: String,
    pub description: String,
    pub source_url: String,
    pub label_ids: Vec<String>,
}

/// Card title for an issue: `[#42] Title`.
pub fn card_name(issue_number: u64, title: &str) -> String {
    format!("[#{issue_number}] {title}")
}
