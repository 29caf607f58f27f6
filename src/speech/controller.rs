//! Arbitration of the single shared speech channel.
//!
//! SUPERSESSION
//! ============
//! Every accepted request bumps a generation counter and runs in its own
//! task. Starting a new request (or `stop`) silences the backend and aborts
//! the active task before anything else happens, so at most one utterance
//! is ever live. A task that finishes reports its outcome only if its
//! generation is still the current one; late completions of superseded
//! requests publish nothing and their handles resolve to `Cancelled`.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;

use super::backend::{SpeechBackend, SpeechError, VoiceSettings};
use crate::state::Store;

const EVENT_CAPACITY: usize = 64;

/// Opaque identity of one read-aloud trigger.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Which request, if any, is speaking right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechState {
    pub speaking: Option<RequestId>,
}

impl SpeechState {
    #[must_use]
    pub fn is_speaking(&self, request_id: &RequestId) -> bool {
        self.speaking.as_ref() == Some(request_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started { request_id: RequestId },
    Finished { request_id: RequestId },
    Failed { request_id: RequestId, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceOutcome {
    Finished,
    /// Silenced by `stop` or superseded by another request.
    Cancelled,
    Failed(SpeechError),
    /// The backend cannot speak; nothing was attempted.
    Unavailable,
}

/// Handle to one accepted (or refused) speech request.
#[derive(Debug)]
pub struct Utterance {
    request_id: RequestId,
    rx: oneshot::Receiver<UtteranceOutcome>,
}

impl Utterance {
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Wait for the utterance to end.
    pub async fn finished(self) -> UtteranceOutcome {
        self.rx.await.unwrap_or(UtteranceOutcome::Cancelled)
    }
}

/// Result of [`SpeechController::toggle`].
#[derive(Debug)]
pub enum Toggle {
    Started(Utterance),
    Stopped,
}

struct Active {
    generation: u64,
    request_id: RequestId,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    active: Option<Active>,
}

#[derive(Clone)]
pub struct SpeechController {
    backend: Arc<dyn SpeechBackend>,
    voice: VoiceSettings,
    inner: Arc<Mutex<Inner>>,
    state: Store<SpeechState>,
    events: broadcast::Sender<SpeechEvent>,
}

impl SpeechController {
    #[must_use]
    pub fn new(backend: Arc<dyn SpeechBackend>) -> Self {
        Self::with_voice(backend, VoiceSettings::default())
    }

    #[must_use]
    pub fn with_voice(backend: Arc<dyn SpeechBackend>, voice: VoiceSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            voice,
            inner: Arc::new(Mutex::new(Inner::default())),
            state: Store::new(SpeechState::default()),
            events,
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    #[must_use]
    pub fn state(&self) -> SpeechState {
        self.state.get()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SpeechState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<SpeechEvent> {
        self.events.subscribe()
    }

    /// Silence whatever is playing and start speaking `text`.
    ///
    /// Must be called from within a tokio runtime. When the backend is
    /// unavailable this does nothing and the handle resolves to
    /// [`UtteranceOutcome::Unavailable`].
    pub fn speak(&self, text: impl Into<String>, request_id: impl Into<RequestId>) -> Utterance {
        let request_id = request_id.into();
        if !self.backend.is_available() {
            return unavailable(request_id);
        }
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        self.start(&mut inner, text.into(), request_id)
    }

    /// Stop if `request_id` is the one speaking, otherwise speak `text`.
    ///
    /// The check and the action happen under one lock, so a request that
    /// finished just before the call is started again rather than stopped.
    pub fn toggle(&self, text: impl Into<String>, request_id: impl Into<RequestId>) -> Toggle {
        let request_id = request_id.into();
        if !self.backend.is_available() {
            return Toggle::Started(unavailable(request_id));
        }
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let speaking = inner
            .active
            .as_ref()
            .is_some_and(|active| active.request_id == request_id);
        if speaking {
            self.halt(&mut inner);
            Toggle::Stopped
        } else {
            Toggle::Started(self.start(&mut inner, text.into(), request_id))
        }
    }

    /// Silence any utterance. Idempotent.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        self.halt(&mut inner);
    }

    fn start(&self, inner: &mut Inner, text: String, request_id: RequestId) -> Utterance {
        self.halt(inner);
        let generation = inner.generation;
        let (tx, rx) = oneshot::channel();

        tracing::debug!(request_id = %request_id, generation, chars = text.len(), "speech started");
        self.state.set(SpeechState { speaking: Some(request_id.clone()) });
        let _ = self.events.send(SpeechEvent::Started { request_id: request_id.clone() });

        let task = tokio::spawn({
            let this = self.clone();
            let request_id = request_id.clone();
            async move {
                let outcome = match this.backend.utter(&text, &this.voice).await {
                    Ok(()) => UtteranceOutcome::Finished,
                    Err(e) => UtteranceOutcome::Failed(e),
                };
                let _ = tx.send(this.settle(generation, &request_id, outcome));
            }
        });
        inner.active = Some(Active { generation, request_id: request_id.clone(), task });

        Utterance { request_id, rx }
    }

    /// Interrupt the active utterance and open a new generation.
    fn halt(&self, inner: &mut Inner) {
        if let Some(active) = inner.active.take() {
            tracing::debug!(request_id = %active.request_id, generation = active.generation, "interrupting speech");
            active.task.abort();
        }
        self.backend.silence();
        self.state.set(SpeechState::default());
        inner.generation += 1;
    }

    /// Record the end of the utterance started as `generation` and return
    /// the outcome its handle should see. A superseded generation publishes
    /// nothing and reports `Cancelled`.
    fn settle(&self, generation: u64, request_id: &RequestId, outcome: UtteranceOutcome) -> UtteranceOutcome {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.generation != generation {
            tracing::debug!(request_id = %request_id, generation, "dropping superseded speech completion");
            return UtteranceOutcome::Cancelled;
        }
        inner.active = None;
        self.state.set(SpeechState::default());

        let event = match &outcome {
            UtteranceOutcome::Failed(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "speech failed");
                SpeechEvent::Failed { request_id: request_id.clone(), message: e.to_string() }
            }
            _ => {
                tracing::debug!(request_id = %request_id, "speech finished");
                SpeechEvent::Finished { request_id: request_id.clone() }
            }
        };
        let _ = self.events.send(event);
        outcome
    }
}

fn unavailable(request_id: RequestId) -> Utterance {
    tracing::debug!(request_id = %request_id, "speech unavailable; ignoring request");
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(UtteranceOutcome::Unavailable);
    Utterance { request_id, rx }
}
