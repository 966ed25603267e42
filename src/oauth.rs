//! OAuth2 refresh-token grant shared by the Gmail and Spotify clients.
//!
//! The interactive authorization step happens outside the relay; it is
//! started with a long-lived refresh token and exchanges it for access
//! tokens as they expire.

use crate::error::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Access tokens are renewed this long before they actually expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct OAuthCredentials {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub refresh_token: String,
}

impl OAuthCredentials {
    pub fn is_complete(&self) -> bool {
        !self.client_id.trim().is_empty()
            && !self.client_secret.trim().is_empty()
            && !self.refresh_token.trim().is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

pub struct RefreshingToken {
    client: Client,
    token_url: String,
    credentials: OAuthCredentials,
    current: Option<(String, Instant)>,
}

impl RefreshingToken {
    pub fn new(client: Client, token_url: impl Into<String>, credentials: OAuthCredentials) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            credentials,
            current: None,
        }
    }

    /// Returns a valid access token, refreshing it first if needed.
    pub async fn access_token(&mut self) -> Result<String> {
        if let Some((token, expires)) = &self.current {
            if Instant::now() < *expires {
                return Ok(token.clone());
            }
        }
        self.refresh().await
    }

    /// Forgets the cached token, e.g. after the API answered 401.
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    async fn refresh(&mut self) -> Result<String> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.credentials.refresh_token.as_str()),
        ];
        let resp = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&form)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Auth(format!("token refresh failed ({status}): {body}")));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        if let Some(rotated) = token.refresh_token {
            self.credentials.refresh_token = rotated;
        }
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        let expires = Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN);
        tracing::debug!(url = %self.token_url, "refreshed access token");
        self.current = Some((token.access_token.clone(), expires));
        Ok(token.access_token)
    }
}
