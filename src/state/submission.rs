//! Survey submission workflow.
//!
//! STATE MACHINE
//! =============
//! `Idle → Validating → InFlight → Succeeded | Failed`, re-entering
//! `Validating` on the next attempt. At most one submission is in flight:
//! a second `submit` while one is pending returns [`SubmissionError::Busy`]
//! without touching the network.
//!
//! CANCELLATION
//! ============
//! The request future is raced against the deadline and a
//! `CancellationToken`. Losing the race drops the request future, which
//! aborts the HTTP call.

#[cfg(test)]
#[path = "submission_test.rs"]
mod submission_test;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::store::Store;
use crate::net::{ApiError, Entry, SurveyAnswers, SurveyApi, SurveyField};

// =============================================================================
// ERRORS
// =============================================================================

/// Every blank survey field, reported together.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Please fill in the following required fields: {}.", join_labels(.missing))]
pub struct ValidationError {
    pub missing: Vec<SurveyField>,
}

fn join_labels(fields: &[SurveyField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The client-side deadline passed before the server answered.
    #[error(
        "Request timed out. The AI generation is taking longer than expected. Please check if the backend is running and try again. If the problem persists, the API may be experiencing high load."
    )]
    Timeout,

    /// Non-success status with a message from the server.
    #[error("{0}")]
    ServerRejected(String),

    /// Connection-level failure or a failure status without a usable body.
    #[error("{0}")]
    Transport(String),

    #[error("Unexpected response from server: {0}")]
    MalformedResponse(String),

    /// Another submission is still pending.
    #[error("A submission is already in progress.")]
    Busy,

    /// The pending submission was cancelled by the client.
    #[error("Submission was cancelled.")]
    Cancelled,
}

impl From<ApiError> for SubmissionError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::ServerRejected { message, .. } => Self::ServerRejected(message),
            ApiError::Transport(message) => Self::Transport(message),
            ApiError::MalformedResponse(message) => Self::MalformedResponse(message),
        }
    }
}

// =============================================================================
// STATE
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    InFlight,
    Succeeded(Entry),
    Failed(SubmissionError),
}

impl SubmissionState {
    /// Whether the submit trigger should be disabled.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Validating | Self::InFlight)
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

#[derive(Clone)]
pub struct SubmissionController {
    api: SurveyApi,
    state: Store<SubmissionState>,
    timeout: Duration,
    /// Token of the pending submission; `Some` exactly while one runs.
    /// Cleared by [`PendingGuard`], so a dropped `submit` future releases it.
    pending: Arc<Mutex<Option<CancellationToken>>>,
}

impl SubmissionController {
    #[must_use]
    pub fn new(api: SurveyApi, timeout: Duration) -> Self {
        Self {
            api,
            state: Store::new(SubmissionState::Idle),
            timeout,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn state(&self) -> SubmissionState {
        self.state.get()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Check that every survey field has a non-blank answer.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming all blank fields.
    pub fn validate(answers: &SurveyAnswers) -> Result<(), ValidationError> {
        let missing = answers.blank_fields();
        if missing.is_empty() { Ok(()) } else { Err(ValidationError { missing }) }
    }

    /// Validate and submit one survey.
    ///
    /// On success the caller should clear its form; on failure the form is
    /// left for the user to correct and resubmit.
    ///
    /// # Errors
    ///
    /// Returns `Busy` if a submission is already pending, otherwise the
    /// validation, timeout, cancellation, or server failure of this attempt.
    pub async fn submit(&self, answers: &SurveyAnswers) -> Result<Entry, SubmissionError> {
        let token = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if pending.is_some() {
                tracing::debug!("submission rejected: another one is in flight");
                return Err(SubmissionError::Busy);
            }
            let token = CancellationToken::new();
            *pending = Some(token.clone());
            token
        };
        let guard = PendingGuard { controller: self };

        self.state.set(SubmissionState::Validating);
        let result = match Self::validate(answers) {
            Ok(()) => {
                self.state.set(SubmissionState::InFlight);
                self.send(answers, &token).await
            }
            Err(e) => Err(SubmissionError::Validation(e)),
        };

        match &result {
            Ok(entry) => {
                tracing::info!(id = entry.id, "survey submitted");
                self.state.set(SubmissionState::Succeeded(entry.clone()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "survey submission failed");
                self.state.set(SubmissionState::Failed(e.clone()));
            }
        }
        drop(guard);
        result
    }

    async fn send(
        &self,
        answers: &SurveyAnswers,
        token: &CancellationToken,
    ) -> Result<Entry, SubmissionError> {
        tokio::select! {
            biased;
            () = token.cancelled() => Err(SubmissionError::Cancelled),
            () = tokio::time::sleep(self.timeout) => {
                token.cancel();
                Err(SubmissionError::Timeout)
            }
            result = self.api.create_entry(answers) => result.map_err(SubmissionError::from),
        }
    }

    /// Abort the pending submission, if any. No-op otherwise.
    pub fn cancel(&self) {
        if let Some(token) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            tracing::info!("cancelling pending submission");
            token.cancel();
        }
    }

    /// Return to `Idle` unless a submission is pending.
    pub fn reset(&self) {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.is_none() {
            self.state.set(SubmissionState::Idle);
        }
    }
}

/// Releases the pending slot when a `submit` call ends, including when its
/// future is dropped mid-flight. A submission abandoned that way settles as
/// `Failed(Cancelled)`.
struct PendingGuard<'a> {
    controller: &'a SubmissionController,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let token = self
            .controller
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = token {
            token.cancel();
        }
        if self.controller.state.with(SubmissionState::is_busy) {
            tracing::info!("submission abandoned before it finished");
            self.controller
                .state
                .set(SubmissionState::Failed(SubmissionError::Cancelled));
        }
    }
}
