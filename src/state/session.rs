//! Authentication session state.
//!
//! The session starts in `Checking`, and the startup session check settles it to
//! `Authenticated` or `Anonymous`. Anonymity is a valid steady state, so
//! session check failures degrade to `Anonymous` instead of surfacing as errors.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use tokio::sync::watch;

use super::store::Store;
use crate::net::SurveyApi;

/// Session state. The username lives inside `Authenticated`, so it is
/// present exactly when the user is logged in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Checking,
    Authenticated {
        username: String,
    },
    Anonymous,
}

/// Status of a [`Session`] without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Checking,
    Authenticated,
    Anonymous,
}

impl Session {
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Checking => SessionStatus::Checking,
            Self::Authenticated { .. } => SessionStatus::Authenticated,
            Self::Anonymous => SessionStatus::Anonymous,
        }
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Authenticated { username } => Some(username),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

#[derive(Clone)]
pub struct SessionStore {
    api: SurveyApi,
    state: Store<Session>,
}

impl SessionStore {
    #[must_use]
    pub fn new(api: SurveyApi) -> Self {
        Self { api, state: Store::new(Session::Checking) }
    }

    #[must_use]
    pub fn current(&self) -> Session {
        self.state.get()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.with(Session::is_authenticated)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Ask the server who the session cookie belongs to.
    ///
    /// Never fails: any non-success answer or transport error resolves to
    /// `Anonymous`.
    pub async fn check_session(&self) -> Session {
        let session = match self.api.current_user().await {
            Ok(user) => {
                tracing::info!(username = %user.username, "session restored");
                Session::Authenticated { username: user.username }
            }
            Err(e) => {
                tracing::debug!(error = %e, "session check failed; continuing anonymously");
                Session::Anonymous
            }
        };
        self.state.set(session.clone());
        session
    }

    /// Mark the session authenticated after a successful login or register
    /// call. No credentials are checked here.
    pub fn login(&self, username: impl Into<String>) {
        let username = username.into();
        tracing::info!(username = %username, "logged in");
        self.state.set(Session::Authenticated { username });
    }

    /// Best-effort remote logout; the local session becomes `Anonymous`
    /// whatever the server says.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "logout call failed; clearing local session anyway");
        }
        self.state.set(Session::Anonymous);
        tracing::info!("logged out");
    }
}
