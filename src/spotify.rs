//! Spotify track links and the Web API playback controller.

use crate::capability::MusicController;
use crate::constants::{default_headers, SPOTIFY_API_BASE_URL, SPOTIFY_TOKEN_URL};
use crate::error::{Error, Result};
use crate::models::{TrackInfo, TrackRef};
use crate::oauth::{OAuthCredentials, RefreshingToken};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Track reference from a (whitespace-free) track URL: the last path
/// segment with any query string removed.
pub fn track_ref_from_url(url: &str) -> Option<TrackRef> {
    let last = url.trim().trim_end_matches('/').rsplit('/').next()?;
    let id = last.split('?').next()?.trim();
    if id.is_empty() {
        return None;
    }
    Some(TrackRef { id: id.to_string() })
}

/// "title<sep>artist, artist"
pub fn format_track_title(info: &TrackInfo, separator: &str) -> String {
    format!("{}{}{}", info.title, separator, info.artists.join(", "))
}

/// Looks up the display title of a track. Failures are logged and yield
/// `None`.
pub async fn lookup_title(
    music: &mut dyn MusicController,
    track: &TrackRef,
    separator: &str,
) -> Option<String> {
    match music.lookup_track(track).await {
        Ok(info) => Some(format_track_title(&info, separator)),
        Err(e) => {
            tracing::warn!(track = %track.id, "could not fetch spotify track details: {e}");
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub api_base_url: String,
    pub token_url: String,
    pub credentials: OAuthCredentials,
    pub timeout: Duration,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            api_base_url: SPOTIFY_API_BASE_URL.to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            credentials: OAuthCredentials::default(),
            timeout: crate::constants::default_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
    name: String,
    #[serde(default)]
    artists: Vec<ArtistResponse>,
}

#[derive(Debug, Deserialize)]
struct ArtistResponse {
    name: String,
}

/// Spotify Web API client acting on the user's active playback device.
pub struct SpotifyClient {
    client: Client,
    api_base_url: String,
    token: RefreshingToken,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .default_headers(default_headers())
            .build()
            .map_err(Error::Http)?;
        let token = RefreshingToken::new(client.clone(), config.token_url, config.credentials);
        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Sends an authorized request, retrying once with a fresh token when
    /// the API answers 401.
    async fn send(&mut self, method: Method, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{}", self.api_base_url, path);
        let mut retried = false;
        loop {
            let access = self.token.access_token().await?;
            let resp = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(&access)
                .query(query)
                .header(reqwest::header::CONTENT_LENGTH, "0")
                .send()
                .await?;
            let status = resp.status();
            let body = resp.text().await?;
            if status == StatusCode::UNAUTHORIZED && !retried {
                tracing::debug!("spotify rejected access token, refreshing");
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
impl MusicController for SpotifyClient {
    async fn enqueue(&mut self, track: &TrackRef) -> Result<()> {
        self.send(Method::POST, "/v1/me/player/queue", &[("uri", track.uri())])
            .await?;
        Ok(())
    }

    async fn skip_current(&mut self) -> Result<()> {
        self.send(Method::POST, "/v1/me/player/next", &[]).await?;
        Ok(())
    }

    async fn set_volume(&mut self, level: u8) -> Result<()> {
        let level = level.min(100);
        self.send(
            Method::PUT,
            "/v1/me/player/volume",
            &[("volume_percent", level.to_string())],
        )
        .await?;
        Ok(())
    }

    async fn lookup_track(&mut self, track: &TrackRef) -> Result<TrackInfo> {
        let body = self
            .send(Method::GET, &format!("/v1/tracks/{}", track.id), &[])
            .await?;
        let parsed: TrackResponse = serde_json::from_str(&body)?;
        Ok(TrackInfo {
            title: parsed.name,
            artists: parsed.artists.into_iter().map(|a| a.name).collect(),
        })
    }
}
