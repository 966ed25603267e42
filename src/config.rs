//! Relay configuration, read once at startup from a TOML file.
//!
//! Every key has a default, so an empty file (or no file at all) yields
//! the reference setup. Credentials are usually supplied through the
//! environment by the CLI instead of being written into the file.

use crate::constants::*;
use crate::error::{Error, Result};
use crate::gmail::GmailConfig;
use crate::oauth::OAuthCredentials;
use crate::spotify::SpotifyConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
    pub proxy_url: Option<String>,
    pub bar_words: Vec<String>,
    pub thresholds: Thresholds,
    pub volume: VolumeLevels,
    pub mailbox: MailboxSettings,
    pub spotify: SpotifySettings,
    pub sink: SinkSettings,
}

/// Minimum donation amounts unlocking each action.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    pub min_tts_amount: f64,
    pub min_spotify_amount: f64,
    pub min_spotify_skip_amount: f64,
}

/// Music volume while an announcement plays, and afterwards.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct VolumeLevels {
    pub mute: u8,
    pub restore: u8,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MailboxSettings {
    pub sender: String,
    pub user_id: String,
    pub base_url: String,
    pub token_url: String,
    #[serde(flatten)]
    pub credentials: OAuthCredentials,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpotifySettings {
    pub api_base_url: String,
    pub token_url: String,
    pub title_separator: String,
    #[serde(flatten)]
    pub credentials: OAuthCredentials,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SinkSettings {
    pub url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            proxy_url: None,
            bar_words: DEFAULT_BAR_WORDS.iter().map(|w| w.to_string()).collect(),
            thresholds: Thresholds::default(),
            volume: VolumeLevels::default(),
            mailbox: MailboxSettings::default(),
            spotify: SpotifySettings::default(),
            sink: SinkSettings::default(),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_tts_amount: DEFAULT_MIN_TTS_AMOUNT,
            min_spotify_amount: DEFAULT_MIN_SPOTIFY_AMOUNT,
            min_spotify_skip_amount: DEFAULT_MIN_SPOTIFY_SKIP_AMOUNT,
        }
    }
}

impl Default for VolumeLevels {
    fn default() -> Self {
        Self {
            mute: DEFAULT_MUTE_VOLUME,
            restore: DEFAULT_RESTORE_VOLUME,
        }
    }
}

impl Default for MailboxSettings {
    fn default() -> Self {
        Self {
            sender: DEFAULT_SENDER.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            base_url: GMAIL_BASE_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            credentials: OAuthCredentials::default(),
        }
    }
}

impl Default for SpotifySettings {
    fn default() -> Self {
        Self {
            api_base_url: SPOTIFY_API_BASE_URL.to_string(),
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            title_separator: DEFAULT_TITLE_SEPARATOR.to_string(),
            credentials: OAuthCredentials::default(),
        }
    }
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SINK_URL.to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("config {} not found, using defaults", path.display());
            let config = Config::default();
            config.validate()?;
            return Ok(config);
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(Error::Config("poll_interval_secs must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be at least 1".into()));
        }
        let t = &self.thresholds;
        for (name, value) in [
            ("min_tts_amount", t.min_tts_amount),
            ("min_spotify_amount", t.min_spotify_amount),
            ("min_spotify_skip_amount", t.min_spotify_skip_amount),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!("{name} must be a non-negative number")));
            }
        }
        for (name, level) in [("mute", self.volume.mute), ("restore", self.volume.restore)] {
            if level > 100 {
                return Err(Error::Config(format!("volume.{name} must be between 0 and 100")));
            }
        }
        if self.bar_words.iter().any(|w| w.split_whitespace().count() != 1) {
            return Err(Error::Config("bar_words entries must be single words".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn gmail(&self) -> GmailConfig {
        GmailConfig {
            base_url: self.mailbox.base_url.clone(),
            token_url: self.mailbox.token_url.clone(),
            user_id: self.mailbox.user_id.clone(),
            sender: self.mailbox.sender.clone(),
            credentials: self.mailbox.credentials.clone(),
            timeout: self.timeout(),
        }
    }

    pub fn spotify(&self) -> SpotifyConfig {
        SpotifyConfig {
            api_base_url: self.spotify.api_base_url.clone(),
            token_url: self.spotify.token_url.clone(),
            credentials: self.spotify.credentials.clone(),
            timeout: self.timeout(),
        }
    }
}
