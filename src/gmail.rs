//! Gmail REST mailbox source.

use crate::capability::MailboxSource;
use crate::constants::{default_headers, DEFAULT_SENDER, DEFAULT_USER_ID, GMAIL_BASE_URL, GOOGLE_TOKEN_URL};
use crate::error::{Error, Result};
use crate::oauth::{OAuthCredentials, RefreshingToken};
use async_trait::async_trait;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Gmail emits URL-safe base64, with or without padding.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone)]
pub struct GmailConfig {
    pub base_url: String,
    pub token_url: String,
    pub user_id: String,
    pub sender: String,
    pub credentials: OAuthCredentials,
    pub timeout: Duration,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            base_url: GMAIL_BASE_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            sender: DEFAULT_SENDER.to_string(),
            credentials: OAuthCredentials::default(),
            timeout: crate::constants::default_timeout(),
        }
    }
}

impl GmailConfig {
    /// Search query restricting the listing to unread mails of the sender.
    pub fn query(&self) -> String {
        format!("from:{} is:unread", self.sender)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FullMessage {
    payload: MessagePart,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Default, Deserialize)]
struct PartBody {
    #[serde(default)]
    data: Option<String>,
}

impl MessagePart {
    /// Encoded HTML of a message: the first `text/html` part of a multipart
    /// payload, or the body itself when there are no parts.
    fn html_data(&self) -> Option<&str> {
        if self.parts.is_empty() {
            return self.body.as_ref()?.data.as_deref();
        }
        self.parts.iter().find_map(|part| {
            if part.mime_type == "text/html" {
                part.body.as_ref()?.data.as_deref()
            } else if !part.parts.is_empty() {
                part.html_data()
            } else {
                None
            }
        })
    }
}

/// Decodes the HTML body out of a `format=full` message resource.
pub fn decode_message_body(message_json: &str) -> Result<String> {
    let message: FullMessage = serde_json::from_str(message_json)?;
    let data = message
        .payload
        .html_data()
        .ok_or_else(|| Error::Parse("message has no html body".into()))?;
    let bytes = BODY_ENGINE
        .decode(data.trim())
        .map_err(|e| Error::Parse(format!("body is not base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| Error::Parse(format!("body is not utf-8: {e}")))
}

pub struct GmailClient {
    config: GmailConfig,
    client: Client,
    token: RefreshingToken,
}

impl GmailClient {
    pub fn new(config: GmailConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .default_headers(default_headers())
            .build()
            .map_err(Error::Http)?;
        let token = RefreshingToken::new(
            client.clone(),
            config.token_url.clone(),
            config.credentials.clone(),
        );
        Ok(Self {
            config,
            client,
            token,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/gmail/v1/users/{}/messages",
            self.config.base_url.trim_end_matches('/'),
            self.config.user_id
        )
    }

    async fn get(&mut self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let mut retried = false;
        loop {
            let access = self.token.access_token().await?;
            let resp = self
                .client
                .get(url)
                .bearer_auth(&access)
                .query(query)
                .send()
                .await?;
            let status = resp.status();
            let body = resp.text().await?;
            if status == StatusCode::UNAUTHORIZED && !retried {
                self.token.invalidate();
                retried = true;
                continue;
            }
            if !status.is_success() {
                return Err(Error::Status { status, body });
            }
            return Ok(body);
        }
    }
}

#[async_trait]
impl MailboxSource for GmailClient {
    async fn list_unseen(&mut self) -> Result<Vec<String>> {
        let url = self.messages_url();
        let q = self.config.query();
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![("q", q.as_str())];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let body = self.get(&url, &query).await?;
            let page: ListResponse = serde_json::from_str(&body)?;
            ids.extend(page.messages.into_iter().map(|m| m.id));
            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }
        Ok(ids)
    }

    async fn fetch_body(&mut self, id: &str) -> Result<String> {
        let url = format!("{}/{}", self.messages_url(), id);
        let body = self.get(&url, &[("format", "full")]).await?;
        decode_message_body(&body)
    }
}
