//! Maps a classified donation to exactly one action and one record.
//!
//! [`decide`] is pure and holds the whole policy. [`Dispatcher`] carries the
//! decision out against the music controller and the record sink; failures
//! of those calls are logged and never stop the record from being sent.

use crate::capability::{MusicController, RecordSink, SpeechOutput};
use crate::config::{Thresholds, VolumeLevels};
use crate::models::{DonationRecord, MessageClassification, PreparedDonation, TrackRef};
use crate::speech;
use crate::spotify::{lookup_title, track_ref_from_url};
use serde::Serialize;

/// Side effect performed for a donation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "target", rename_all = "snake_case")]
pub enum Action {
    None,
    /// Queue the track; its title is looked up for the record.
    Enqueue(TrackRef),
    Skip,
    /// Read the message aloud (only when a speech output is attached).
    Announce(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub action: Action,
    /// Record to submit. For [`Action::Enqueue`] the track title is added
    /// once the lookup succeeded.
    pub record: DonationRecord,
}

/// Decides what to do with a donation.
///
/// `speech_enabled` tells whether announcements are possible at all.
pub fn decide(
    donation: &PreparedDonation,
    thresholds: &Thresholds,
    speech_enabled: bool,
) -> Decision {
    let PreparedDonation {
        donor_name,
        amount,
        message,
        classification,
    } = donation;
    let (donor_name, amount) = (donor_name.as_str(), *amount);
    let bare = || DonationRecord::bare(donor_name, amount);
    match classification {
        MessageClassification::BarTransaction | MessageClassification::NoMessage => Decision {
            action: Action::None,
            record: bare(),
        },
        MessageClassification::SpotifyTrack(url) => {
            let track = track_ref_from_url(url);
            match track {
                Some(track) if amount >= thresholds.min_spotify_amount => Decision {
                    action: Action::Enqueue(track),
                    record: bare(),
                },
                _ => Decision {
                    action: Action::None,
                    record: bare(),
                },
            }
        }
        MessageClassification::SkipCommand => Decision {
            action: Action::Skip,
            record: DonationRecord::with_message(
                donor_name,
                amount,
                message.as_deref().unwrap_or(crate::constants::SKIP_KEYWORD),
            ),
        },
        MessageClassification::PlainMessage(text) => {
            let action = if speech_enabled && amount >= thresholds.min_tts_amount {
                Action::Announce(text.clone())
            } else {
                Action::None
            };
            Decision {
                action,
                record: DonationRecord::with_message(donor_name, amount, text.as_str()),
            }
        }
    }
}

/// What happened to a dispatched donation.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub action: Action,
    /// `false` when the action was attempted but failed.
    pub action_succeeded: bool,
    pub record: DonationRecord,
    pub submitted: bool,
}

pub struct Dispatcher {
    thresholds: Thresholds,
    volume: VolumeLevels,
    title_separator: String,
    music: Box<dyn MusicController>,
    sink: Box<dyn RecordSink>,
    speech: Option<Box<dyn SpeechOutput>>,
}

impl Dispatcher {
    pub fn new(
        thresholds: Thresholds,
        volume: VolumeLevels,
        title_separator: impl Into<String>,
        music: Box<dyn MusicController>,
        sink: Box<dyn RecordSink>,
    ) -> Self {
        Self {
            thresholds,
            volume,
            title_separator: title_separator.into(),
            music,
            sink,
            speech: None,
        }
    }

    /// Attaches a speech output, enabling announcements.
    pub fn with_speech(mut self, speech: Box<dyn SpeechOutput>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub async fn dispatch(&mut self, donation: &PreparedDonation) -> DispatchOutcome {
        let Decision { action, mut record } =
            decide(donation, &self.thresholds, self.speech.is_some());
        let (classification, amount) = (&donation.classification, donation.amount);

        let action_succeeded = match &action {
            Action::None => {
                log_no_action(classification, amount, &self.thresholds);
                true
            }
            Action::Enqueue(track) => {
                tracing::info!(track = %track.id, "queueing spotify track");
                let queued = match self.music.enqueue(track).await {
                    Ok(()) => {
                        tracing::info!("track added to queue");
                        true
                    }
                    Err(e) => {
                        tracing::warn!(track = %track.id, "failed to queue track: {e}");
                        false
                    }
                };
                match lookup_title(self.music.as_mut(), track, &self.title_separator).await {
                    Some(title) => {
                        tracing::info!("track name: {title}");
                        record.spotify_link = Some(title);
                    }
                    None => tracing::warn!("spotify url found but no track name, sending without"),
                }
                queued
            }
            Action::Skip => {
                tracing::info!("skipping current track");
                match self.music.skip_current().await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!("failed to skip track: {e}");
                        false
                    }
                }
            }
            Action::Announce(text) => match self.speech.as_mut() {
                Some(out) => {
                    tracing::info!("announcing message: {text}");
                    match speech::announce(out.as_mut(), self.music.as_mut(), self.volume, text)
                        .await
                    {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::warn!("announcement failed: {e}");
                            false
                        }
                    }
                }
                None => true,
            },
        };

        let submitted = match self.sink.submit(&record).await {
            Ok(()) => {
                tracing::info!(donor = %record.donor_name, amount = record.amount, "pushed donation");
                true
            }
            Err(e) => {
                tracing::warn!(donor = %record.donor_name, "error pushing donation: {e}");
                false
            }
        };

        DispatchOutcome {
            action,
            action_succeeded,
            record,
            submitted,
        }
    }
}

fn log_no_action(classification: &MessageClassification, amount: f64, thresholds: &Thresholds) {
    match classification {
        MessageClassification::BarTransaction => {
            tracing::info!("pretty sure this is a bar transaction")
        }
        MessageClassification::SpotifyTrack(url) if amount < thresholds.min_spotify_amount => {
            tracing::info!(
                url = %url,
                min = thresholds.min_spotify_amount,
                "donation below minimum amount for spotify"
            )
        }
        MessageClassification::SpotifyTrack(url) => {
            tracing::warn!(url = %url, "spotify link without a track id")
        }
        MessageClassification::PlainMessage(text) => tracing::info!("message: {text}"),
        MessageClassification::NoMessage => tracing::info!("no spotify link or message present"),
        MessageClassification::SkipCommand => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> Thresholds {
        Thresholds {
            min_tts_amount: 2.0,
            min_spotify_amount: 1.0,
            min_spotify_skip_amount: 5.0,
        }
    }

    fn donation(class: MessageClassification, amount: f64) -> PreparedDonation {
        let message = match &class {
            MessageClassification::PlainMessage(text) => Some(text.clone()),
            MessageClassification::SkipCommand => Some("skip".to_string()),
            _ => None,
        };
        PreparedDonation {
            donor_name: "Dana".into(),
            amount,
            message,
            classification: class,
        }
    }

    fn decide_for(class: MessageClassification, amount: f64) -> Decision {
        decide(&donation(class, amount), &thresholds(), false)
    }

    #[test]
    fn bar_transaction_sends_bare_record() {
        let d = decide_for(MessageClassification::BarTransaction, 3.0);
        assert_eq!(d.action, Action::None);
        assert_eq!(d.record, DonationRecord::bare("Dana", 3.0));
    }

    #[test]
    fn track_below_minimum_is_not_queued() {
        let d = decide_for(
            MessageClassification::SpotifyTrack("open.spotify.com/track/abc".into()),
            0.5,
        );
        assert_eq!(d.action, Action::None);
        assert_eq!(d.record, DonationRecord::bare("Dana", 0.5));
    }

    #[test]
    fn track_at_minimum_is_queued() {
        let d = decide_for(
            MessageClassification::SpotifyTrack("open.spotify.com/track/abc?si=x".into()),
            1.0,
        );
        assert_eq!(d.action, Action::Enqueue(TrackRef { id: "abc".into() }));
        assert_eq!(d.record, DonationRecord::bare("Dana", 1.0));
    }

    #[test]
    fn skip_keeps_message() {
        let d = decide_for(MessageClassification::SkipCommand, 5.0);
        assert_eq!(d.action, Action::Skip);
        assert_eq!(d.record, DonationRecord::with_message("Dana", 5.0, "skip"));
    }

    #[test]
    fn skip_record_carries_message_as_written() {
        let mut skip = donation(MessageClassification::SkipCommand, 5.0);
        skip.message = Some(" SKIP ".into());
        let d = decide(&skip, &thresholds(), false);
        assert_eq!(d.action, Action::Skip);
        assert_eq!(d.record, DonationRecord::with_message("Dana", 5.0, " SKIP "));
    }

    #[test]
    fn plain_message_is_forwarded() {
        let d = decide_for(MessageClassification::PlainMessage("Hallo!".into()), 10.0);
        assert_eq!(d.action, Action::None);
        assert_eq!(d.record, DonationRecord::with_message("Dana", 10.0, "Hallo!"));
    }

    #[test]
    fn plain_message_announced_only_with_speech_and_enough_money() {
        let class = MessageClassification::PlainMessage("Hallo!".into());
        let d = decide(&donation(class.clone(), 2.0), &thresholds(), true);
        assert_eq!(d.action, Action::Announce("Hallo!".into()));
        assert_eq!(d.record, DonationRecord::with_message("Dana", 2.0, "Hallo!"));
        let d = decide(&donation(class, 1.5), &thresholds(), true);
        assert_eq!(d.action, Action::None);
    }

    #[test]
    fn no_message_sends_bare_record() {
        let d = decide_for(MessageClassification::NoMessage, 4.2);
        assert_eq!(d.action, Action::None);
        assert_eq!(d.record, DonationRecord::bare("Dana", 4.2));
    }

    #[test]
    fn record_never_has_message_and_title() {
        let classes = [
            MessageClassification::BarTransaction,
            MessageClassification::SpotifyTrack("open.spotify.com/track/abc".into()),
            MessageClassification::SkipCommand,
            MessageClassification::PlainMessage("x".into()),
            MessageClassification::NoMessage,
        ];
        for class in &classes {
            let d = decide(&donation(class.clone(), 10.0), &thresholds(), true);
            assert!(d.record.message.is_none() || d.record.spotify_link.is_none());
        }
    }
}
