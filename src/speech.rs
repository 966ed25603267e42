//! Spoken announcement of donor messages.
//!
//! No synthesizer ships with the relay; a [`SpeechOutput`] has to be
//! attached to the dispatcher for announcements to happen. While speaking,
//! the music is turned down and restored afterwards.

use crate::capability::{MusicController, SpeechOutput};
use crate::config::VolumeLevels;
use crate::constants::TTS_MAX_CHARS;
use crate::error::Result;

/// Cuts `text` to at most [`TTS_MAX_CHARS`] characters, preferring the last
/// space before the limit.
pub fn cut_text(text: &str) -> &str {
    let Some((limit, _)) = text.char_indices().nth(TTS_MAX_CHARS) else {
        return text;
    };
    let head = &text[..limit];
    match head.rfind(' ') {
        Some(pos) if pos > 0 => &head[..pos],
        _ => head,
    }
}

/// Text actually sent to the synthesizer.
pub fn speech_text(message: &str) -> String {
    cut_text(&message.replace(':', "")).to_string()
}

/// Lowers the music, speaks `message`, and restores the volume. The
/// restore is attempted even when speaking failed.
pub async fn announce(
    speech: &mut dyn SpeechOutput,
    music: &mut dyn MusicController,
    volume: VolumeLevels,
    message: &str,
) -> Result<()> {
    let text = speech_text(message);
    music.set_volume(volume.mute).await?;
    let spoken = speech.speak(&text).await;
    music.set_volume(volume.restore).await?;
    spoken
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(cut_text("hallo welt"), "hallo welt");
    }

    #[test]
    fn cuts_at_last_space() {
        let text = format!("{} {}", "a".repeat(150), "b".repeat(100));
        assert_eq!(cut_text(&text), "a".repeat(150));
    }

    #[test]
    fn hard_cut_without_space() {
        let text = "x".repeat(250);
        assert_eq!(cut_text(&text).len(), 200);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "ä".repeat(201);
        assert_eq!(cut_text(&text).chars().count(), 200);
    }

    #[test]
    fn colons_are_removed() {
        assert_eq!(speech_text("Gruß: an alle"), "Gruß an alle");
    }
}
