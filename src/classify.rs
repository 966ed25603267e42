//! Intent classification of the donor's free-text message.
//!
//! Rules run in a fixed order and the first one that matches wins:
//!
//! 1. no message → [`MessageClassification::NoMessage`]
//! 2. short message naming a drink → [`MessageClassification::BarTransaction`]
//! 3. embedded Spotify track link → [`MessageClassification::SpotifyTrack`]
//! 4. the word "skip" with enough money → [`MessageClassification::SkipCommand`]
//! 5. anything else → [`MessageClassification::PlainMessage`]

use crate::constants::{BAR_MAX_WORDS, SKIP_KEYWORD};
use crate::models::MessageClassification;
use regex::Regex;
use std::collections::HashSet;

const TRACK_URL_STEM: &str = "open.spotify.com/track/";

type Rule = fn(&Classifier, &str, f64) -> Option<MessageClassification>;

/// Rules applied to a present message, in precedence order.
const RULES: &[(&str, Rule)] = &[
    ("bar transaction", bar_rule),
    ("spotify track", track_rule),
    ("skip command", skip_rule),
];

fn bar_rule(c: &Classifier, msg: &str, _amount: f64) -> Option<MessageClassification> {
    check_bar_transaction(msg, &c.bar_words).then_some(MessageClassification::BarTransaction)
}

fn track_rule(_: &Classifier, msg: &str, _amount: f64) -> Option<MessageClassification> {
    find_spotify_url(msg).map(MessageClassification::SpotifyTrack)
}

fn skip_rule(c: &Classifier, msg: &str, amount: f64) -> Option<MessageClassification> {
    find_skip(msg, amount, c.skip_threshold).then_some(MessageClassification::SkipCommand)
}

/// Message classifier holding the bar vocabulary and the skip threshold.
#[derive(Debug, Clone)]
pub struct Classifier {
    bar_words: HashSet<String>,
    skip_threshold: f64,
}

impl Classifier {
    pub fn new<I, S>(bar_words: I, skip_threshold: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            bar_words: bar_words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .collect(),
            skip_threshold,
        }
    }

    pub fn classify(&self, message: Option<&str>, amount: f64) -> MessageClassification {
        let Some(message) = message else {
            return MessageClassification::NoMessage;
        };
        for (name, rule) in RULES {
            if let Some(class) = rule(self, message, amount) {
                tracing::debug!(rule = *name, "message rule matched");
                return class;
            }
        }
        MessageClassification::PlainMessage(message.to_string())
    }
}

/// A message of at most two words containing a bar vocabulary word is a
/// point-of-sale receipt rather than donor commentary.
pub fn check_bar_transaction(message: &str, bar_words: &HashSet<String>) -> bool {
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    if words.len() > BAR_MAX_WORDS {
        return false;
    }
    words.iter().any(|w| bar_words.contains(*w))
}

/// Finds an `open.spotify.com/track/<id>` link, tolerating whitespace
/// inserted anywhere inside the fixed part, and returns it with all
/// whitespace removed.
pub fn find_spotify_url(text: &str) -> Option<String> {
    let stem: Vec<String> = TRACK_URL_STEM
        .chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    let pattern = format!(r"{}\s*\S+", stem.join(r"\s*"));
    let re = Regex::new(&pattern).ok()?;
    let span = re.find(text)?;
    Some(span.as_str().split_whitespace().collect())
}

/// `true` when the message is exactly "skip" (any case, surrounding
/// whitespace ignored) and the amount reaches `threshold`.
pub fn find_skip(message: &str, amount: f64, threshold: f64) -> bool {
    message.trim().to_lowercase() == SKIP_KEYWORD && amount >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_BAR_WORDS;

    fn classifier() -> Classifier {
        Classifier::new(DEFAULT_BAR_WORDS, 5.0)
    }

    fn words() -> HashSet<String> {
        DEFAULT_BAR_WORDS.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn bar_words_in_short_messages() {
        assert!(check_bar_transaction("Bier", &words()));
        assert!(check_bar_transaction("2 Shots", &words()));
        assert!(check_bar_transaction("  Jägermeister  ", &words()));
        assert!(!check_bar_transaction("ein großes bier bitte", &words()));
        assert!(!check_bar_transaction("hallo", &words()));
        assert!(!check_bar_transaction("", &words()));
    }

    #[test]
    fn bar_word_must_be_whole_token() {
        assert!(!check_bar_transaction("bierchen", &words()));
    }

    #[test]
    fn reconstructs_mangled_links() {
        let expected = "open.spotify.com/track/abc123";
        assert_eq!(find_spotify_url("open.spotify.com/track/abc123").as_deref(), Some(expected));
        assert_eq!(
            find_spotify_url("hier: https://open. spo tify . com/track/abc123 danke").as_deref(),
            Some(expected)
        );
        assert_eq!(
            find_spotify_url("open.spotify.\n com/tr ack/ abc123").as_deref(),
            Some(expected)
        );
    }

    #[test]
    fn keeps_query_string() {
        assert_eq!(
            find_spotify_url("open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=1a2b").as_deref(),
            Some("open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=1a2b")
        );
    }

    #[test]
    fn ignores_other_links() {
        assert_eq!(find_spotify_url("open.spotify.com/album/xyz"), None);
        assert_eq!(find_spotify_url("youtube.com/watch?v=1"), None);
    }

    #[test]
    fn skip_needs_threshold() {
        assert!(find_skip("skip", 5.0, 5.0));
        assert!(!find_skip("skip", 4.0, 5.0));
        assert!(find_skip("Skip", 5.0, 5.0));
        assert!(find_skip("  SKIP \n", 7.5, 5.0));
        assert!(!find_skip("skip please", 10.0, 5.0));
    }

    #[test]
    fn classification_precedence() {
        let c = classifier();
        assert_eq!(c.classify(None, 10.0), MessageClassification::NoMessage);
        assert_eq!(c.classify(Some("bier"), 3.0), MessageClassification::BarTransaction);
        assert_eq!(
            c.classify(Some("song open.spotify.com/track/abc"), 2.0),
            MessageClassification::SpotifyTrack("open.spotify.com/track/abc".into())
        );
        assert_eq!(c.classify(Some("skip"), 5.0), MessageClassification::SkipCommand);
        assert_eq!(
            c.classify(Some("skip"), 1.0),
            MessageClassification::PlainMessage("skip".into())
        );
        assert_eq!(
            c.classify(Some("Viel Spaß euch!"), 1.0),
            MessageClassification::PlainMessage("Viel Spaß euch!".into())
        );
    }

    #[test]
    fn bar_check_precedes_link_search() {
        let c = classifier();
        assert_eq!(
            c.classify(Some("bier open.spotify.com/track/abc"), 10.0),
            MessageClassification::BarTransaction
        );
    }

    #[test]
    fn long_message_with_drink_and_link_is_a_track() {
        let c = classifier();
        assert_eq!(
            c.classify(Some("ein bier und open.spotify.com/track/abc"), 10.0),
            MessageClassification::SpotifyTrack("open.spotify.com/track/abc".into())
        );
    }

    #[test]
    fn custom_vocabulary_is_lowercased() {
        let c = Classifier::new(["Mate"], 5.0);
        assert_eq!(c.classify(Some("MATE"), 2.0), MessageClassification::BarTransaction);
        assert_eq!(
            c.classify(Some("bier"), 2.0),
            MessageClassification::PlainMessage("bier".into())
        );
    }
}
