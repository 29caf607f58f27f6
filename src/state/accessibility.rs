//! Accessibility preferences: text size, contrast, read-aloud, panel state.
//!
//! Settings are loaded once from a [`PreferenceStore`] and written back on
//! every change. Any change to how the page looks silences speech, since
//! the text being read may no longer match what is on screen.

#[cfg(test)]
#[path = "accessibility_test.rs"]
mod accessibility_test;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use super::store::Store;
use crate::speech::SpeechController;

pub const TEXT_SIZE_KEY: &str = "accessibility-textSize";
pub const HIGH_CONTRAST_KEY: &str = "accessibility-highContrast";
pub const READ_ALOUD_KEY: &str = "accessibility-textToSpeech";
pub const COLLAPSED_KEY: &str = "accessibility-collapsed";

/// Key/value storage that outlives the process, e.g. browser local storage.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Process-local [`PreferenceStore`].
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
}

impl TextSize {
    pub const ALL: [Self; 4] = [Self::Small, Self::Medium, Self::Large, Self::ExtraLarge];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::ExtraLarge => "xlarge",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.as_str() == value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessibilityState {
    pub text_size: TextSize,
    pub high_contrast: bool,
    pub read_aloud: bool,
    pub panel_collapsed: bool,
}

impl AccessibilityState {
    /// Contrast mode name applied to the document root.
    #[must_use]
    pub fn contrast_mode(&self) -> &'static str {
        if self.high_contrast { "high" } else { "normal" }
    }

    fn load(prefs: &dyn PreferenceStore) -> Self {
        let flag = |key: &str| prefs.get(key).is_some_and(|v| v == "true");
        let text_size = match prefs.get(TEXT_SIZE_KEY) {
            Some(stored) => TextSize::parse(&stored).unwrap_or_else(|| {
                tracing::debug!(stored = %stored, "ignoring unknown stored text size");
                TextSize::default()
            }),
            None => TextSize::default(),
        };
        Self {
            text_size,
            high_contrast: flag(HIGH_CONTRAST_KEY),
            read_aloud: flag(READ_ALOUD_KEY),
            panel_collapsed: flag(COLLAPSED_KEY),
        }
    }
}

#[derive(Clone)]
pub struct AccessibilitySettings {
    prefs: Arc<dyn PreferenceStore>,
    speech: SpeechController,
    state: Store<AccessibilityState>,
}

impl AccessibilitySettings {
    #[must_use]
    pub fn new(prefs: Arc<dyn PreferenceStore>, speech: SpeechController) -> Self {
        let state = AccessibilityState::load(prefs.as_ref());
        Self { prefs, speech, state: Store::new(state) }
    }

    #[must_use]
    pub fn state(&self) -> AccessibilityState {
        self.state.get()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AccessibilityState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn speech(&self) -> &SpeechController {
        &self.speech
    }

    pub fn set_text_size(&self, size: TextSize) {
        self.state.update(|s| s.text_size = size);
        self.prefs.set(TEXT_SIZE_KEY, size.as_str());
        self.speech.stop();
    }

    /// Flip high-contrast mode and return the new value.
    pub fn toggle_high_contrast(&self) -> bool {
        let enabled = self.flip(HIGH_CONTRAST_KEY, |s| &mut s.high_contrast);
        self.speech.stop();
        enabled
    }

    /// Flip the read-aloud preference and return the new value. Turning it
    /// off silences speech.
    pub fn toggle_read_aloud(&self) -> bool {
        let enabled = self.flip(READ_ALOUD_KEY, |s| &mut s.read_aloud);
        if !enabled {
            self.speech.stop();
        }
        enabled
    }

    /// Flip whether the settings panel is collapsed and return the new value.
    pub fn toggle_panel(&self) -> bool {
        self.flip(COLLAPSED_KEY, |s| &mut s.panel_collapsed)
    }

    fn flip(&self, key: &str, field: impl FnOnce(&mut AccessibilityState) -> &mut bool) -> bool {
        let mut value = false;
        self.state.update(|s| {
            let slot = field(s);
            *slot = !*slot;
            value = *slot;
        });
        self.prefs.set(key, if value { "true" } else { "false" });
        tracing::debug!(key, value, "accessibility preference changed");
        value
    }
}
