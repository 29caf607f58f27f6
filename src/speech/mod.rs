//! Read-aloud speech output.
//!
//! DESIGN
//! ======
//! There is one speech channel per process. [`SpeechController`] owns it
//! and arbitrates between the many independent "read aloud" triggers: a
//! new request silences whatever is playing and never queues behind it.
//! Engines plug in behind [`SpeechBackend`].

pub mod backend;
pub mod controller;

#[cfg(test)]
pub mod test_helpers;

pub use backend::{ConsoleNarrator, SpeechBackend, SpeechError, Unavailable, VoiceSettings};
pub use controller::{RequestId, SpeechController, SpeechEvent, SpeechState, Toggle, Utterance, UtteranceOutcome};
