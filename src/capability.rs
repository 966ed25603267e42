//! Interfaces of the external services the relay drives.
//!
//! The pipeline only talks to these traits, so tests can swap in
//! deterministic fakes for Gmail, Spotify and the collector.

use crate::error::Result;
use crate::models::{DonationRecord, TrackInfo, TrackRef};
use async_trait::async_trait;

/// Source of donation notification mails.
#[async_trait]
pub trait MailboxSource: Send {
    /// Identifiers of unread notifications from the configured sender.
    async fn list_unseen(&mut self) -> Result<Vec<String>>;

    /// HTML body of one notification.
    async fn fetch_body(&mut self, id: &str) -> Result<String>;
}

/// Playback control of the connected music player.
#[async_trait]
pub trait MusicController: Send {
    async fn enqueue(&mut self, track: &TrackRef) -> Result<()>;

    async fn skip_current(&mut self) -> Result<()>;

    /// Volume in percent (0-100).
    async fn set_volume(&mut self, level: u8) -> Result<()>;

    async fn lookup_track(&mut self, track: &TrackRef) -> Result<TrackInfo>;
}

/// Downstream collector for donation records.
#[async_trait]
pub trait RecordSink: Send {
    async fn submit(&mut self, record: &DonationRecord) -> Result<()>;
}

/// Text-to-speech output. Only used when attached to the dispatcher.
#[async_trait]
pub trait SpeechOutput: Send {
    async fn speak(&mut self, text: &str) -> Result<()>;
}
