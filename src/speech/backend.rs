//! Speech engine seam and the built-in engines.

#[cfg(test)]
#[path = "backend_test.rs"]
mod backend_test;

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

/// Voice parameters handed to the engine with every utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub lang: String,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self { rate: 1.0, pitch: 1.0, volume: 1.0, lang: "en-US".to_owned() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("speech output is not available")]
    Unavailable,

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

/// Backend-agnostic speech output engine.
///
/// `utter` resolves when the text has been fully spoken. `silence` must take
/// effect immediately; the controller also drops the pending `utter` future.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Whether this engine can produce speech at all.
    fn is_available(&self) -> bool;

    async fn utter(&self, text: &str, voice: &VoiceSettings) -> Result<(), SpeechError>;

    fn silence(&self);
}

// =============================================================================
// UNAVAILABLE
// =============================================================================

/// Engine for hosts with no speech capability.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unavailable;

#[async_trait]
impl SpeechBackend for Unavailable {
    fn is_available(&self) -> bool {
        false
    }

    async fn utter(&self, _text: &str, _voice: &VoiceSettings) -> Result<(), SpeechError> {
        Err(SpeechError::Unavailable)
    }

    fn silence(&self) {}
}

// =============================================================================
// CONSOLE NARRATOR
// =============================================================================

/// Terminal "speech": prints the text word by word at speaking pace.
#[derive(Debug)]
pub struct ConsoleNarrator {
    words_per_minute: u32,
    mid_line: AtomicBool,
}

impl ConsoleNarrator {
    #[must_use]
    pub fn new(words_per_minute: u32) -> Self {
        Self { words_per_minute: words_per_minute.max(1), mid_line: AtomicBool::new(false) }
    }

    /// Pause after each word for the given pace and voice rate.
    #[must_use]
    pub fn word_delay(&self, voice: &VoiceSettings) -> Duration {
        let rate = f64::from(voice.rate).clamp(0.1, 10.0);
        Duration::from_secs_f64(60.0 / (f64::from(self.words_per_minute) * rate))
    }
}

#[async_trait]
impl SpeechBackend for ConsoleNarrator {
    fn is_available(&self) -> bool {
        true
    }

    async fn utter(&self, text: &str, voice: &VoiceSettings) -> Result<(), SpeechError> {
        let delay = self.word_delay(voice);
        let mut out = std::io::stdout();
        for word in text.split_whitespace() {
            write!(out, "{word} ")
                .and_then(|()| out.flush())
                .map_err(|e| SpeechError::Synthesis(e.to_string()))?;
            self.mid_line.store(true, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
        }
        writeln!(out).map_err(|e| SpeechError::Synthesis(e.to_string()))?;
        self.mid_line.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn silence(&self) {
        if self.mid_line.swap(false, Ordering::SeqCst) {
            println!();
        }
    }
}
