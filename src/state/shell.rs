//! Top-level application state.
//!
//! DESIGN
//! ======
//! `AppShell` owns one of each controller and wires the cross-cutting
//! flows between them: sign-in feeds the session, logout tears down every
//! per-user resource, and a successful submission refreshes the entry
//! cache. Everything past the sign-in screen is gated on the session.

#[cfg(test)]
#[path = "shell_test.rs"]
mod shell_test;

use std::sync::Arc;

use tokio::sync::watch;

use super::accessibility::{AccessibilitySettings, PreferenceStore};
use super::entries::EntryRepository;
use super::session::{Session, SessionStatus, SessionStore};
use super::store::Store;
use super::submission::{SubmissionController, SubmissionError};
use crate::config::ClientConfig;
use crate::net::{ApiError, Credentials, Entry, SurveyAnswers, SurveyApi};
use crate::speech::SpeechController;

const MIN_PASSWORD_LEN: usize = 3;

/// Pages the user can select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Page {
    #[default]
    Home,
    Survey,
    Entries,
    SignIn,
    Register,
}

/// What is actually on screen once the session gate is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The startup session check has not answered yet.
    Checking,
    Page(Page),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShellError {
    #[error("You must be signed in to do that.")]
    NotAuthenticated,

    /// Credentials rejected before any request was made.
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

#[derive(Clone)]
pub struct AppShell {
    api: SurveyApi,
    session: SessionStore,
    entries: EntryRepository,
    submission: SubmissionController,
    speech: SpeechController,
    accessibility: AccessibilitySettings,
    page: Store<Page>,
}

impl AppShell {
    #[must_use]
    pub fn new(
        api: SurveyApi,
        config: &ClientConfig,
        speech: SpeechController,
        prefs: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            session: SessionStore::new(api.clone()),
            entries: EntryRepository::new(api.clone()),
            submission: SubmissionController::new(api.clone(), config.submit_timeout),
            accessibility: AccessibilitySettings::new(prefs, speech.clone()),
            speech,
            api,
            page: Store::new(Page::Home),
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn entries(&self) -> &EntryRepository {
        &self.entries
    }

    #[must_use]
    pub fn submission(&self) -> &SubmissionController {
        &self.submission
    }

    #[must_use]
    pub fn speech(&self) -> &SpeechController {
        &self.speech
    }

    #[must_use]
    pub fn accessibility(&self) -> &AccessibilitySettings {
        &self.accessibility
    }

    #[must_use]
    pub fn subscribe_page(&self) -> watch::Receiver<Page> {
        self.page.subscribe()
    }

    /// Ask the server for an existing session and return the first view.
    pub async fn boot(&self) -> View {
        self.session.check_session().await;
        self.visible()
    }

    /// The selected page after the session gate.
    #[must_use]
    pub fn visible(&self) -> View {
        let page = self.page.get();
        match self.session.current().status() {
            SessionStatus::Checking => View::Checking,
            SessionStatus::Anonymous => match page {
                Page::Register => View::Page(Page::Register),
                _ => View::Page(Page::SignIn),
            },
            SessionStatus::Authenticated => match page {
                Page::SignIn | Page::Register => View::Page(Page::Home),
                other => View::Page(other),
            },
        }
    }

    /// Select a page. The choice is kept even while gated.
    pub fn navigate(&self, page: Page) {
        tracing::debug!(?page, "navigate");
        self.page.set(page);
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank username, otherwise the server's
    /// rejection.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Session, ShellError> {
        let credentials = credentials(username, password)?;
        let user = self.api.login(&credentials).await?;
        Ok(self.enter(user.username))
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank username or a too-short password,
    /// otherwise the server's rejection.
    pub async fn register(&self, username: &str, password: &str) -> Result<Session, ShellError> {
        let credentials = credentials(username, password)?;
        if credentials.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ShellError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let user = self.api.register(&credentials).await?;
        Ok(self.enter(user.username))
    }

    fn enter(&self, username: String) -> Session {
        self.session.login(username);
        self.navigate(Page::Home);
        self.session.current()
    }

    /// End the session and drop every per-user resource.
    pub async fn logout(&self) {
        self.submission.cancel();
        self.speech.stop();
        self.session.logout().await;
        self.entries.reset();
        self.submission.reset();
        self.navigate(Page::Home);
    }

    /// Submit the survey. On success the form is cleared and the entry
    /// cache refreshed; on failure the form is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when signed out, otherwise the submission
    /// failure. A failed follow-up refresh is not an error here; it lands in
    /// the entry cache's error slot.
    pub async fn submit_survey(&self, answers: &mut SurveyAnswers) -> Result<Entry, ShellError> {
        self.require_session()?;
        let entry = self.submission.submit(answers).await?;
        answers.clear();
        if let Err(e) = self.entries.refresh().await {
            tracing::warn!(error = %e, "entry refresh after submission failed");
        }
        Ok(entry)
    }

    /// # Errors
    ///
    /// Returns `NotAuthenticated` when signed out, otherwise the fetch error.
    pub async fn refresh_entries(&self) -> Result<Vec<Entry>, ShellError> {
        self.require_session()?;
        Ok(self.entries.refresh().await?)
    }

    /// Delete an entry by server id. Confirmation is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when signed out, otherwise the delete or
    /// refresh error.
    pub async fn delete_entry(&self, id: i64) -> Result<Vec<Entry>, ShellError> {
        self.require_session()?;
        Ok(self.entries.remove(id).await?)
    }

    fn require_session(&self) -> Result<(), ShellError> {
        if self.session.is_authenticated() { Ok(()) } else { Err(ShellError::NotAuthenticated) }
    }
}

fn credentials(username: &str, password: &str) -> Result<Credentials, ShellError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ShellError::InvalidInput("Username cannot be empty".to_owned()));
    }
    Ok(Credentials { username: username.to_owned(), password: password.to_owned() })
}
