//! Scripted speech engine for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::backend::{SpeechBackend, SpeechError, VoiceSettings};

/// Engine that "speaks" for a fixed time per utterance and records calls.
pub struct MockSpeech {
    available: bool,
    duration: Duration,
    fail_with: Option<String>,
    spoken: Mutex<Vec<String>>,
    silenced: AtomicUsize,
}

impl MockSpeech {
    pub fn new(duration: Duration) -> Arc<Self> {
        Arc::new(Self {
            available: true,
            duration,
            fail_with: None,
            spoken: Mutex::new(Vec::new()),
            silenced: AtomicUsize::new(0),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            available: false,
            duration: Duration::ZERO,
            fail_with: None,
            spoken: Mutex::new(Vec::new()),
            silenced: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            available: true,
            duration: Duration::ZERO,
            fail_with: Some(message.to_owned()),
            spoken: Mutex::new(Vec::new()),
            silenced: AtomicUsize::new(0),
        })
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().expect("mock mutex should lock").clone()
    }

    pub fn silence_count(&self) -> usize {
        self.silenced.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechBackend for MockSpeech {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn utter(&self, text: &str, _voice: &VoiceSettings) -> Result<(), SpeechError> {
        self.spoken.lock().expect("mock mutex should lock").push(text.to_owned());
        tokio::time::sleep(self.duration).await;
        match &self.fail_with {
            Some(message) => Err(SpeechError::Synthesis(message.clone())),
            None => Ok(()),
        }
    }

    fn silence(&self) {
        self.silenced.fetch_add(1, Ordering::SeqCst);
    }
}
