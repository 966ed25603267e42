pub mod amount;
pub mod capability;
pub mod classify;
pub mod config;
pub mod constants;
pub mod dedup;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod gmail;
pub mod models;
pub mod oauth;
pub mod poller;
pub mod sink;
pub mod speech;
pub mod spotify;

pub use amount::parse_amount;
pub use capability::{MailboxSource, MusicController, RecordSink, SpeechOutput};
pub use classify::{check_bar_transaction, find_skip, find_spotify_url, Classifier};
pub use config::{Config, Thresholds, VolumeLevels};
pub use dedup::DedupTracker;
pub use dispatch::{decide, Action, Decision, DispatchOutcome, Dispatcher};
pub use error::{Error, Result};
pub use extract::{extract_fields, normalize_body};
pub use gmail::{GmailClient, GmailConfig};
pub use models::{
    DonationFields, DonationNotification, DonationRecord, MessageClassification,
    PreparedDonation, TrackInfo, TrackRef,
};
pub use poller::{prepare, CycleStats, Outcome, Relay};
pub use sink::HttpRecordSink;
pub use spotify::{SpotifyClient, SpotifyConfig};
