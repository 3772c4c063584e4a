//! Wekan board backend.
//!
//! Talks to the Wekan GraphQL endpoint: cards of one list on one board are the
//! records, the board's custom field definitions provide the id → name mapping.

pub mod auth;
pub mod query;

use async_trait::async_trait;
use auth::{Session, TokenHolder};
use query::{Field, Operation, Value};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use statushook_core::models::{FieldDef, RawField, RawRecord, RecordScan, RecordUpdate};
use statushook_core::traits::RecordBackend;
use statushook_core::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct WekanConfig {
    pub graphql_url: String,
    pub user: String,
    pub password: String,
    pub board: String,
    pub list: String,
    pub timeout: Duration,
}

impl WekanConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("graphql_url", &self.graphql_url),
            ("user", &self.user),
            ("board", &self.board),
            ("list", &self.list),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!("wekan {name} is empty")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct AuthorizeData {
    authorize: Option<Authorize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Authorize {
    user_id: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct BoardData {
    board: Option<Board>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Board {
    #[serde(default)]
    custom_fields: Option<Vec<BoardField>>,
    list: Option<List>,
}

#[derive(Debug, Deserialize)]
struct BoardField {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct List {
    #[serde(default)]
    cards: Option<Vec<Card>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Card {
    id: String,
    #[serde(default)]
    custom_fields: Option<Vec<CardField>>,
}

#[derive(Debug, Deserialize)]
struct CardField {
    id: String,
    #[serde(default)]
    value: serde_json::Value,
}

fn value_text(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Map a GraphQL error message onto the core error taxonomy.
///
/// Only messages that reject the session itself mean it must be renewed.
const SESSION_REJECTED: [&str; 7] = [
    "invalid token",
    "token expired",
    "expired token",
    "token has expired",
    "jwt expired",
    "not authorized",
    "unauthorized",
];

fn classify(message: String) -> Error {
    let lower = message.to_ascii_lowercase();
    let auth_related = SESSION_REJECTED.iter().any(|needle| lower.contains(needle));
    if auth_related {
        Error::Unauthorized(message)
    } else {
        Error::BackendMessage(message)
    }
}

pub struct WekanBackend {
    client: Client,
    cfg: WekanConfig,
    tokens: TokenHolder,
}

impl WekanBackend {
    pub fn new(cfg: WekanConfig) -> Result<Self> {
        cfg.validate()?;
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| Error::backend("build reqwest client", e))?;
        Ok(Self {
            client,
            cfg,
            tokens: TokenHolder::new(),
        })
    }

    pub fn config(&self) -> &WekanConfig {
        &self.cfg
    }

    /// Establish the session up front so bad credentials fail at startup.
    #[instrument(level = "info", skip(self), fields(url = %self.cfg.graphql_url))]
    pub async fn authorize(&self) -> Result<Session> {
        self.tokens.get_or_authorize(|| self.exchange()).await
    }

    async fn exchange(&self) -> Result<Session> {
        let doc = Operation::query(
            Field::new("authorize")
                .arg("user", Value::str(&self.cfg.user))
                .arg("password", Value::str(&self.cfg.password))
                .select_all(["userId", "token"]),
        )
        .render();

        let data: AuthorizeData = self
            .post(doc)
            .await?
            .ok_or_else(|| Error::BackendMessage("authorize returned no data".to_string()))?;
        let auth = data
            .authorize
            .ok_or_else(|| Error::Unauthorized("authorize returned no session".to_string()))?;
        Ok(Session {
            user_id: auth.user_id,
            token: auth.token,
        })
    }

    /// Run `op` with the current session; on an auth failure, renew once and retry.
    async fn with_session<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(Session) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let session = self.authorize().await?;
        match op(session.clone()).await {
            Err(err) if err.is_unauthorized() => {
                tracing::warn!(error = %err, "wekan session rejected; re-authorizing");
                self.tokens.invalidate(&session).await;
                let renewed = self.authorize().await?;
                op(renewed).await
            }
            other => other,
        }
    }

    fn auth_arg(session: &Session) -> Value {
        Value::object([
            ("userId", Value::str(&session.user_id)),
            ("token", Value::str(&session.token)),
        ])
    }

    fn board_query(&self, session: &Session) -> String {
        Operation::query(
            Field::new("board")
                .arg("auth", Self::auth_arg(session))
                .arg("title", Value::str(&self.cfg.board))
                .select(
                    Field::new("customFields")
                        .select(Field::new("_id").alias("id"))
                        .select(Field::new("name")),
                )
                .select(
                    Field::new("list")
                        .arg("title", Value::str(&self.cfg.list))
                        .select(
                            Field::new("cards")
                                .select(Field::new("_id").alias("id"))
                                .select(
                                    Field::new("customFields")
                                        .select(Field::new("_id").alias("id"))
                                        .select(Field::new("value")),
                                ),
                        ),
                ),
        )
        .render()
    }

    fn update_mutation(&self, session: &Session, update: &RecordUpdate) -> String {
        let fields = update
            .fields
            .iter()
            .map(|f| {
                Value::object([
                    ("_id", Value::str(&f.id)),
                    ("value", Value::str(&f.value)),
                ])
            })
            .collect();

        Operation::mutation(
            Field::new("updateCard")
                .arg("auth", Self::auth_arg(session))
                .arg("boardTitle", Value::str(&self.cfg.board))
                .arg("listTitle", Value::str(&self.cfg.list))
                .arg(
                    "card",
                    Value::object([
                        ("_id", Value::str(&update.record_id)),
                        ("customFields", Value::List(fields)),
                    ]),
                ),
        )
        .render()
    }

    async fn fetch_board(&self, session: Session) -> Result<Board> {
        let data: BoardData = self
            .post(self.board_query(&session))
            .await?
            .ok_or_else(|| Error::BackendMessage("board query returned no data".to_string()))?;
        data.board
            .ok_or_else(|| Error::NotFound(format!("board not found: {}", self.cfg.board)))
    }

    async fn send_update(&self, session: Session, update: &RecordUpdate) -> Result<()> {
        let _: Option<serde_json::Value> =
            self.post(self.update_mutation(&session, update)).await?;
        Ok(())
    }

    async fn post<T: DeserializeOwned>(&self, doc: String) -> Result<Option<T>> {
        let resp = self
            .client
            .post(&self.cfg.graphql_url)
            .header(CONTENT_TYPE, "application/graphql")
            .body(doc)
            .send()
            .await
            .map_err(Error::backend_reqwest)?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(Error::backend_reqwest)?;
        let parsed: GraphqlResponse<T> = serde_json::from_slice(&bytes)
            .map_err(|e| Error::backend(format!("decode wekan response (http {status})"), e))?;

        if let Some(first) = parsed.errors.into_iter().flatten().next() {
            return Err(classify(first.message));
        }
        Ok(parsed.data)
    }
}

#[async_trait]
impl RecordBackend for WekanBackend {
    fn id(&self) -> &'static str {
        "wekan"
    }

    #[instrument(level = "debug", skip(self), fields(board = %self.cfg.board, list = %self.cfg.list))]
    async fn scan(&self, path: &str) -> Result<RecordScan> {
        let board = self.with_session(|s| self.fetch_board(s)).await?;

        let field_defs = board
            .custom_fields
            .unwrap_or_default()
            .into_iter()
            .map(|f| FieldDef {
                id: f.id,
                name: f.name.unwrap_or_default(),
            })
            .collect();

        let list = board
            .list
            .ok_or_else(|| Error::NotFound(format!("list not found: {}", self.cfg.list)))?;
        let records = list
            .cards
            .unwrap_or_default()
            .into_iter()
            .map(|card| RawRecord {
                id: card.id,
                fields: card
                    .custom_fields
                    .unwrap_or_default()
                    .into_iter()
                    .map(|f| RawField {
                        id: f.id,
                        value: value_text(f.value),
                    })
                    .collect(),
            })
            .collect();

        Ok(RecordScan {
            field_defs,
            records,
        })
    }

    #[instrument(level = "debug", skip(self, update), fields(record_id = %update.record_id))]
    async fn write(&self, update: &RecordUpdate) -> Result<()> {
        self.with_session(|s| self.send_update(s, update)).await
    }
}
