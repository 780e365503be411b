//! Spoken replies.
//!
//! When voice is on, each committed assistant reply is handed to a
//! [`SpeechSink`], cut to a short prefix so playback starts quickly. The cut
//! is by character count and may land mid-word.

use std::sync::{Arc, Mutex};

/// Consumes reply text for playback. Must not block the caller.
pub trait SpeechSink: Send {
    fn speak(&mut self, text: &str);
}

/// First `max_chars` characters of `text`.
#[must_use]
pub fn speech_excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Discards everything. Used when no speech command is configured.
#[derive(Debug, Default)]
pub struct NullSpeech;

impl SpeechSink for NullSpeech {
    fn speak(&mut self, _text: &str) {}
}

/// Runs an external text-to-speech program with the excerpt as its last argument.
///
/// Must be used inside a tokio runtime. Failures are logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl SpeechSink for CommandSpeech {
    fn speak(&mut self, text: &str) {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .arg(text)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(false);

        match command.spawn() {
            Ok(mut child) => {
                let program = self.program.clone();
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) if !status.success() => {
                            tracing::warn!(program = %program, %status, "Speech command failed");
                        }
                        Ok(_) => {}
                        Err(e) => tracing::warn!(program = %program, "Speech command wait failed: {e}"),
                    }
                });
            }
            Err(e) => tracing::warn!(program = %self.program, "Failed to start speech command: {e}"),
        }
    }
}

/// Records what it was asked to say. Shared handle so tests can inspect it.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpeech {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeech {
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .map(|spoken| spoken.clone())
            .unwrap_or_default()
    }
}

impl SpeechSink for RecordingSpeech {
    fn speak(&mut self, text: &str) {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(text.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        assert_eq!(speech_excerpt("héllo wörld", 4), "héll");
        assert_eq!(speech_excerpt("short", 150), "short");
        assert_eq!(speech_excerpt("", 10), "");
    }

    #[test]
    fn excerpt_may_cut_mid_word() {
        let text = "a".repeat(149) + "bcdef";
        let excerpt = speech_excerpt(&text, 150);
        assert_eq!(excerpt.chars().count(), 150);
        assert!(excerpt.ends_with("ab"));
    }

    #[test]
    fn recording_speech_shares_state_across_clones() {
        let recorder = RecordingSpeech::default();
        let mut sink = recorder.clone();
        sink.speak("hello");
        assert_eq!(recorder.spoken(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn missing_program_is_logged_not_fatal() {
        let mut sink = CommandSpeech::new("orion-no-such-tts-binary", Vec::new());
        sink.speak("hello");
    }
}
