//! The polling loop tying mailbox, classifier and dispatcher together.

use crate::amount::parse_amount;
use crate::capability::MailboxSource;
use crate::classify::Classifier;
use crate::constants::{LABEL_DONOR, LABEL_TOTAL};
use crate::dedup::DedupTracker;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::{Error, Result};
use crate::extract::extract_fields;
use crate::models::{DonationNotification, PreparedDonation};
use std::time::Duration;
use tokio::sync::watch;

/// Extracts and classifies a notification body. Errors are hard skips.
pub fn prepare(body: &str, classifier: &Classifier) -> Result<PreparedDonation> {
    let fields = extract_fields(body)?;

    let donor_name = fields
        .donor_name
        .filter(|n| !n.trim().is_empty())
        .ok_or(Error::MissingField(LABEL_DONOR))?;
    tracing::info!("donor name: {donor_name}");

    let amount = fields
        .total_amount_raw
        .as_deref()
        .and_then(parse_amount)
        .filter(|a| *a > 0.0)
        .ok_or(Error::MissingField(LABEL_TOTAL))?;
    tracing::info!("donation amount: {amount}€");

    let message = fields.message.filter(|m| !m.trim().is_empty());
    let classification = classifier.classify(message.as_deref(), amount);
    tracing::info!(class = classification.label(), "classified message");

    Ok(PreparedDonation {
        donor_name,
        amount,
        message,
        classification,
    })
}

/// Result of handling one notification id.
#[derive(Debug)]
pub enum Outcome {
    /// Already handled earlier in this process.
    Duplicate,
    /// Consumed without any record.
    HardSkip(Error),
    Dispatched(DispatchOutcome),
}

/// Counters for one polling cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub listed: usize,
    pub dispatched: usize,
    pub skipped: usize,
    pub duplicates: usize,
}

/// Process-wide state of the relay: service handles and the dedup set.
pub struct Relay {
    mailbox: Box<dyn MailboxSource>,
    classifier: Classifier,
    dispatcher: Dispatcher,
    dedup: DedupTracker,
    poll_interval: Duration,
}

impl Relay {
    pub fn new(
        mailbox: Box<dyn MailboxSource>,
        classifier: Classifier,
        dispatcher: Dispatcher,
        poll_interval: Duration,
    ) -> Self {
        Self {
            mailbox,
            classifier,
            dispatcher,
            dedup: DedupTracker::new(),
            poll_interval,
        }
    }

    pub fn dedup(&self) -> &DedupTracker {
        &self.dedup
    }

    /// Handles one notification id from start to end.
    pub async fn handle(&mut self, id: &str) -> Outcome {
        if !self.dedup.mark_seen(id) {
            return Outcome::Duplicate;
        }
        tracing::info!(id, "-----------");

        let raw_body = match self.mailbox.fetch_body(id).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(id, "could not fetch mail body: {e}");
                return Outcome::HardSkip(e);
            }
        };
        let notification = DonationNotification {
            id: id.to_string(),
            raw_body,
        };
        self.process(&notification).await
    }

    /// Runs an already fetched notification through extraction and dispatch.
    pub async fn process(&mut self, notification: &DonationNotification) -> Outcome {
        let prepared = match prepare(&notification.raw_body, &self.classifier) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(id = %notification.id, "skipping notification: {e}");
                return Outcome::HardSkip(e);
            }
        };
        let outcome = self.dispatcher.dispatch(&prepared).await;
        Outcome::Dispatched(outcome)
    }

    /// Lists unseen notifications and handles each in turn. Stops early,
    /// between two notifications, once `shutdown` is set.
    pub async fn run_cycle(&mut self, shutdown: &watch::Receiver<bool>) -> Result<CycleStats> {
        let ids = self.mailbox.list_unseen().await?;
        let mut stats = CycleStats {
            listed: ids.len(),
            ..CycleStats::default()
        };
        for id in &ids {
            if *shutdown.borrow() {
                break;
            }
            match self.handle(id).await {
                Outcome::Duplicate => stats.duplicates += 1,
                Outcome::HardSkip(_) => stats.skipped += 1,
                Outcome::Dispatched(_) => stats.dispatched += 1,
            }
        }
        Ok(stats)
    }

    /// Polls until `shutdown` turns `true`. Failures of a cycle are logged
    /// and the loop continues after the usual interval.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let t = self.dispatcher.thresholds();
        tracing::info!("minimum amount to trigger tts: {}€", t.min_tts_amount);
        tracing::info!("minimum amount to add spotify tracks: {}€", t.min_spotify_amount);
        tracing::info!("minimum amount to skip spotify tracks: {}€", t.min_spotify_skip_amount);

        while !*shutdown.borrow() {
            match self.run_cycle(&shutdown).await {
                Ok(stats) if stats.dispatched + stats.skipped > 0 => {
                    tracing::debug!(?stats, "poll cycle finished")
                }
                Ok(_) => {}
                Err(e) => tracing::error!("unexpected error while polling: {e}"),
            }
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::warn!(
            handled = self.dedup.len(),
            "stopped by user. MARK MAILS AS READ BEFORE EXECUTING AGAIN!"
        );
    }
}
