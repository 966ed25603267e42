//! Data models flowing through the relay pipeline.

use serde::Serialize;

/// One donation alert fetched from the mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationNotification {
    /// Mailbox message identifier, used for dedup only.
    pub id: String,
    /// Unparsed HTML body.
    pub raw_body: String,
}

/// Fields pulled from the notification's cart table. `None` means the
/// label was not present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonationFields {
    pub total_amount_raw: Option<String>,
    pub donor_name: Option<String>,
    pub message: Option<String>,
}

/// Intent of the donor's free-text message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageClassification {
    BarTransaction,
    SpotifyTrack(String),
    SkipCommand,
    PlainMessage(String),
    NoMessage,
}

impl MessageClassification {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BarTransaction => "bar transaction",
            Self::SpotifyTrack(_) => "spotify track",
            Self::SkipCommand => "skip command",
            Self::PlainMessage(_) => "plain message",
            Self::NoMessage => "no message",
        }
    }
}

/// A notification that passed extraction and is ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDonation {
    pub donor_name: String,
    pub amount: f64,
    /// Message exactly as the donor wrote it.
    pub message: Option<String>,
    pub classification: MessageClassification,
}

/// Record forwarded to the collector. At most one of `message` and
/// `spotify_link` is set; absent fields are omitted from the JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationRecord {
    pub donor_name: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Human readable track title ("title von artists").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotify_link: Option<String>,
}

impl DonationRecord {
    pub fn bare(donor_name: impl Into<String>, amount: f64) -> Self {
        Self {
            donor_name: donor_name.into(),
            amount,
            message: None,
            spotify_link: None,
        }
    }

    pub fn with_message(donor_name: impl Into<String>, amount: f64, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::bare(donor_name, amount)
        }
    }

    pub fn with_track_title(
        donor_name: impl Into<String>,
        amount: f64,
        title: impl Into<String>,
    ) -> Self {
        Self {
            spotify_link: Some(title.into()),
            ..Self::bare(donor_name, amount)
        }
    }
}

/// Canonical reference to a Spotify track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TrackRef {
    pub id: String,
}

impl TrackRef {
    pub fn uri(&self) -> String {
        format!("{}{}", crate::constants::TRACK_URI_PREFIX, self.id)
    }
}

/// Track metadata returned by the music catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub title: String,
    pub artists: Vec<String>,
}
