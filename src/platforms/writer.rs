//! ESPN write client.
//!
//! Sends add/drop and lineup-swap transactions to
//! `{base}/apis/v3/games/fba/seasons/{year}/segments/0/leagues/{league_id}/transactions`.
//! ESPN reports failures in several shapes (HTTP status, an `error` field,
//! `messages`/`message` entries), so the response is classified by
//! [`classify_response`] rather than trusted on status alone.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use super::transaction::{TransactionKind, TransactionRequest, TransactionRequestBuilder};
use super::{Credentials, TransactionReceipt, TransactionWriter};
use crate::config::{EndpointConfig, EspnConfig, TransactionsConfig};
use crate::types::FantasyError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const TRANSACTIONS_PATH: &str =
    "/apis/v3/games/fba/seasons/{year}/segments/0/leagues/{league_id}/transactions";

/// Error bodies are cut to this many characters.
pub const MAX_ERROR_BODY_CHARS: usize = 500;

/// Markers that turn a platform message into a rejection.
const REJECTION_MARKERS: &[&str] = &["error", "invalid"];

/// A resolved write endpoint: where to POST and how to build the body.
#[derive(Debug, Clone)]
pub struct WriteEndpoint {
    url_override: Option<String>,
    base: String,
    trailing_slash: bool,
    body: TransactionRequestBuilder,
}

impl WriteEndpoint {
    pub fn new(base: impl Into<String>, trailing_slash: bool) -> Self {
        Self {
            url_override: None,
            base: base.into(),
            trailing_slash,
            body: TransactionRequestBuilder::default(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url_override = Some(url.into());
        self
    }

    pub fn with_body(mut self, body: TransactionRequestBuilder) -> Self {
        self.body = body;
        self
    }

    /// Resolve from config; `default_base` applies when the endpoint has none.
    pub fn from_config(
        config: &EndpointConfig,
        default_base: &str,
        default_trailing_slash: bool,
    ) -> Result<Self, FantasyError> {
        let base = config
            .base
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(default_base);
        let mut endpoint = Self::new(base, config.trailing_slash.unwrap_or(default_trailing_slash))
            .with_body(TransactionRequestBuilder::from_sources(
                config.body_file.as_deref(),
                config.body.as_deref(),
            )?);
        if let Some(url) = config.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            endpoint = endpoint.with_url(url);
        }
        Ok(endpoint)
    }

    /// Override URL if set, else base + league path.
    pub fn url_for(&self, league_id: i64, season_year: i32) -> String {
        if let Some(url) = &self.url_override {
            return url.clone();
        }
        let path = TRANSACTIONS_PATH
            .replace("{year}", &season_year.to_string())
            .replace("{league_id}", &league_id.to_string());
        let mut url = format!("{}{path}", self.base.trim_end_matches('/'));
        if self.trailing_slash {
            url.push('/');
        }
        url
    }
}

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

/// Cut to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Text of a `messages`/`message` entry: a list (first element used), a
/// single object (`message`, then `text`, then the object itself) or a string.
pub fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(message_text),
        Value::Object(obj) => {
            let field = |key: &str| obj.get(key).filter(|v| is_truthy(v)).map(value_text);
            Some(field("message").or_else(|| field("text")).unwrap_or_else(|| value.to_string()))
        }
        _ => None,
    }
}

/// Whether a platform message signals a rejection.
pub fn is_rejection_message(text: &str) -> bool {
    let lower = text.to_lowercase();
    REJECTION_MARKERS.iter().any(|m| lower.contains(m))
}

/// Rejection message carried by a parsed response, if any.
pub fn rejection_message(body: &Value) -> Option<String> {
    let obj = body.as_object()?;
    if let Some(err) = obj.get("error").filter(|v| is_truthy(v)) {
        return Some(value_text(err));
    }
    ["messages", "message"]
        .iter()
        .filter_map(|key| obj.get(*key))
        .filter_map(message_text)
        .find(|text| is_rejection_message(text))
}

/// Classify a write response. An empty body with a success status is accepted.
pub fn classify_response(status: u16, body: &str) -> Result<Option<Value>, FantasyError> {
    if status >= 400 {
        return Err(FantasyError::HttpStatus {
            status,
            body: truncate_chars(body, MAX_ERROR_BODY_CHARS),
        });
    }
    if body.trim().is_empty() {
        return Ok(None);
    }
    let parsed: Value = serde_json::from_str(body).map_err(|e| {
        FantasyError::PlatformRejection(format!(
            "unparseable response ({e}): {}",
            truncate_chars(body, MAX_ERROR_BODY_CHARS)
        ))
    })?;
    match rejection_message(&parsed) {
        Some(message) => Err(FantasyError::PlatformRejection(message)),
        None => Ok(Some(parsed)),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// ESPN transaction client (add/drop and lineup swaps).
pub struct TransactionClient {
    http: Client,
    add_drop: WriteEndpoint,
    lineup: WriteEndpoint,
}

impl TransactionClient {
    pub fn new(add_drop: WriteEndpoint, lineup: WriteEndpoint, timeout_secs: u64) -> Result<Self, FantasyError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("waiverwire/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            add_drop,
            lineup,
        })
    }

    /// Build from config: add/drop without a trailing slash, lineup with one.
    pub fn from_config(espn: &EspnConfig, transactions: &TransactionsConfig) -> Result<Self, FantasyError> {
        let add_drop = WriteEndpoint::from_config(&transactions.add_drop, &espn.write_base, false)?;
        let lineup = WriteEndpoint::from_config(&transactions.lineup, &espn.write_base, true)?;
        Self::new(add_drop, lineup, espn.timeout_secs)
    }

    fn endpoint(&self, kind: TransactionKind) -> &WriteEndpoint {
        match kind {
            TransactionKind::AddDrop => &self.add_drop,
            TransactionKind::LineupSwap => &self.lineup,
        }
    }

    fn headers(credentials: &Credentials) -> Result<HeaderMap, FantasyError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-fantasy-platform", HeaderValue::from_static("espn-fantasy-web"));
        headers.insert("x-fantasy-source", HeaderValue::from_static("kona"));
        let cookie = HeaderValue::from_str(&credentials.cookie_header()).map_err(|_| {
            FantasyError::Configuration("credentials contain characters not allowed in a cookie".into())
        })?;
        headers.insert(COOKIE, cookie);
        Ok(headers)
    }
}

#[async_trait]
impl TransactionWriter for TransactionClient {
    async fn submit(
        &self,
        request: &TransactionRequest,
        credentials: &Credentials,
    ) -> Result<TransactionReceipt, FantasyError> {
        let kind = request.kind();
        let endpoint = self.endpoint(kind);
        let url = endpoint.url_for(request.league_id, request.season_year);
        let body = endpoint.body.build(request)?;

        info!(
            kind = %kind,
            url = %url,
            body = %body,
            "Submitting ESPN transaction"
        );

        let resp = self
            .http
            .post(&url)
            .headers(Self::headers(credentials)?)
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let text = resp.text().await?;
        info!(kind = %kind, status, response = %text, "ESPN transaction response");

        match classify_response(status, &text) {
            Ok(response) => Ok(TransactionReceipt {
                kind,
                url,
                status,
                response,
                timestamp: Utc::now(),
            }),
            Err(e) => {
                warn!(kind = %kind, error = %e, "ESPN transaction rejected");
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
