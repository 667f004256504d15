use async_trait::async_trait;
use reqwest::{Method, Response};
use serde::Deserialize;
use tracing::debug;

use super::params::{segment, Params};
use super::BoardApi;
use crate::error::{SyncError, SyncResult};
use crate::model::card::{BoardLabel, CardId, CardRef, NewCard};

pub const DEFAULT_API_BASE: &str = "https://api.trello.com/1";

const CARD_FIELDS: &str = "id,name,desc,shortUrl,idList,labels";

pub struct TrelloClient {
    base_url: String,
    api_key: String,
    token: String,
    client: reqwest::Client,
}

impl TrelloClient {
    pub fn new(base_url: String, api_key: String, token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn auth_params(&self) -> Params {
        Params::new()
            .with("key", &self.api_key)
            .with("token", &self.token)
    }

    /// Credentials and `query` go in the URL, `form` in the body.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Params,
        form: Option<Params>,
    ) -> SyncResult<Response> {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "trello request");

        let mut request = self
            .client
            .request(method, url)
            .query(&self.auth_params())
            .query(&query);
        if let Some(form) = form {
            request = request.form(&form);
        }
        check(request.send().await?).await
    }
}

async fn check(resp: Response) -> SyncResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SyncError::BoardApi {
        status: status.as_u16(),
        body,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Card {
    id: CardId,
    name: String,
    desc: Option<String>,
    short_url: Option<String>,
    id_list: Option<String>,
    #[serde(default)]
    labels: Vec<BoardLabel>,
}

impl From<Card> for CardRef {
    fn from(card: Card) -> Self {
        let label_ids = card.labels.iter().map(|l| l.id.clone()).collect();
        let label_names = card
            .labels
            .into_iter()
            .filter(|l| !l.name.is_empty())
            .map(|l| l.name)
            .collect();
        CardRef {
            id: card.id,
            name: card.name,
            short_url: card.short_url.unwrap_or_default(),
            description: card.desc.unwrap_or_default(),
            list_id: card.id_list,
            label_ids,
            label_names,
        }
    }
}

#[async_trait]
impl BoardApi for TrelloClient {
    async fn list_board_labels(&self, board_id: &str) -> SyncResult<Vec<BoardLabel>> {
        let path = format!("/boards/{}/labels", segment(board_id));
        let query = Params::new().with("fields", "id,name");
        Ok(self.send(Method::GET, &path, query, None).await?.json().await?)
    }

    async fn get_card(&self, card_id: &CardId) -> SyncResult<CardRef> {
        let path = format!("/cards/{}", segment(card_id.as_str()));
        let query = Params::new().with("fields", CARD_FIELDS);
        let card: Card = self.send(Method::GET, &path, query, None).await?.json().await?;
        Ok(card.into())
    }

    async fn create_card(&self, card: &NewCard) -> SyncResult<CardRef> {
        let form = Params::new()
            .with("idList", &card.list_id)
            .with("keepFromSource", "all")
            .with("name", &card.name)
            .with("desc", &card.description)
            .with("urlSource", &card.source_url)
            .with_list("idLabels", &card.label_ids);
        let created: Card = self
            .send(Method::POST, "/cards", Params::new(), Some(form))
            .await?
            .json()
            .await?;
        Ok(created.into())
    }

    async fn move_card(&self, card_id: &CardId, list_id: &str) -> SyncResult<()> {
        let path = format!("/cards/{}", segment(card_id.as_str()));
        let form = Params::new().with("idList", list_id);
        self.send(Method::PUT, &path, Params::new(), Some(form)).await?;
        Ok(())
    }

    async fn rename_card(&self, card_id: &CardId, name: &str) -> SyncResult<()> {
        let path = format!("/cards/{}", segment(card_id.as_str()));
        let form = Params::new().with("name", name);
        self.send(Method::PUT, &path, Params::new(), Some(form)).await?;
        Ok(())
    }

    async fn attach_url(&self, card_id: &CardId, url: &str) -> SyncResult<()> {
        let path = format!("/cards/{}/attachments", segment(card_id.as_str()));
        let form = Params::new().with("url", url);
        self.send(Method::POST, &path, Params::new(), Some(form)).await?;
        Ok(())
    }
}
