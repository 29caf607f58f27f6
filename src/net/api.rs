//! REST API helpers for communicating with the job-suggestions server.
//!
//! ERROR HANDLING
//! ==============
//! Each endpoint owns its own reading of failures: which message the user
//! sees for a rejected login differs from a rejected submission, so the
//! mapping from status + body to [`ApiError`] lives here, per call, and
//! callers get `Result` outputs instead of panics.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use super::transport::{ApiRequest, ApiResponse, Transport};
use super::types::{ApiError, Credentials, CurrentUser, Entry, ErrorBody, SurveyAnswers};

const SUBMIT_FAILED: &str = "Failed to submit form.";

/// Typed façade over the REST contract.
#[derive(Clone)]
pub struct SurveyApi {
    transport: Arc<dyn Transport>,
}

impl SurveyApi {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        tracing::debug!(method = ?request.method, path = %request.path, "api request");
        let response = self.transport.send(request).await?;
        tracing::debug!(status = response.status, "api response");
        Ok(response)
    }

    /// Ask `GET /api/auth/me` for the user bound to the session cookie.
    ///
    /// # Errors
    ///
    /// Returns an error when the session is not authenticated or the request
    /// fails for any other reason.
    pub async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        let response = self.send(ApiRequest::get("/api/auth/me")).await?;
        if !response.is_success() {
            return Err(rejected(&response, "Not authenticated"));
        }
        parse_body(&response.body)
    }

    /// Log in via `POST /api/auth/login`.
    ///
    /// # Errors
    ///
    /// Returns the server's `error` message (or `"Login failed"`) on rejection.
    pub async fn login(&self, credentials: &Credentials) -> Result<CurrentUser, ApiError> {
        self.authenticate("/api/auth/login", credentials, "Login failed").await
    }

    /// Create an account via `POST /api/auth/register`. The server logs the
    /// new user in as part of registration.
    ///
    /// # Errors
    ///
    /// Returns the server's `error` message (or `"Registration failed"`) on rejection.
    pub async fn register(&self, credentials: &Credentials) -> Result<CurrentUser, ApiError> {
        self.authenticate("/api/auth/register", credentials, "Registration failed")
            .await
    }

    async fn authenticate(
        &self,
        path: &str,
        credentials: &Credentials,
        fallback: &str,
    ) -> Result<CurrentUser, ApiError> {
        let body = serde_json::to_value(credentials).map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
        let response = self.send(ApiRequest::post(path, Some(body))).await?;
        if !response.is_success() {
            return Err(rejected(&response, fallback));
        }
        parse_body(&response.body)
    }

    /// Invalidate the server session via `POST /api/auth/logout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the server rejects it.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let response = self.send(ApiRequest::post("/api/auth/logout", None)).await?;
        if !response.is_success() {
            return Err(rejected(&response, "Logout failed"));
        }
        Ok(())
    }

    /// Fetch every entry via `GET /api/suggestions`.
    ///
    /// An empty body or a JSON value that is not an array yields an empty
    /// list rather than an error.
    ///
    /// # Errors
    ///
    /// Returns an error for non-success statuses, transport failures, and
    /// bodies that are not JSON at all.
    pub async fn list_entries(&self) -> Result<Vec<Entry>, ApiError> {
        let response = self.send(ApiRequest::get("/api/suggestions")).await?;
        parse_entry_list(&response)
    }

    /// Submit survey answers via `POST /api/suggestions`.
    ///
    /// The server generates suggestions synchronously, so this call can take
    /// a long time; callers bound it with their own deadline.
    ///
    /// # Errors
    ///
    /// Returns `ServerRejected` when the server explains the failure,
    /// `Transport` when there is no usable body, and `MalformedResponse`
    /// for a success body that is not an entry.
    pub async fn create_entry(&self, answers: &SurveyAnswers) -> Result<Entry, ApiError> {
        let body = serde_json::json!({ "answers": answers });
        let response = self.send(ApiRequest::post("/api/suggestions", Some(body))).await?;
        parse_created_entry(&response)
    }

    /// Delete one entry via `DELETE /api/suggestions/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the server's `error` message (or `"Failed to delete"`) on rejection.
    pub async fn delete_entry(&self, id: i64) -> Result<(), ApiError> {
        let response = self.send(ApiRequest::delete(format!("/api/suggestions/{id}"))).await?;
        if !response.is_success() {
            return Err(rejected(&response, "Failed to delete"));
        }
        Ok(())
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// `error` field of a failure body, if the body is JSON and carries one.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}

fn rejected(response: &ApiResponse, fallback: &str) -> ApiError {
    ApiError::ServerRejected {
        status: response.status,
        message: error_message(&response.body).unwrap_or_else(|| fallback.to_owned()),
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

fn parse_entry_list(response: &ApiResponse) -> Result<Vec<Entry>, ApiError> {
    if !response.is_success() {
        let message = match serde_json::from_str::<ErrorBody>(&response.body) {
            Ok(body) => body
                .error
                .unwrap_or_else(|| "Failed to fetch data".to_owned()),
            Err(_) => format!("HTTP {}: {}", response.status, response.reason),
        };
        return Err(ApiError::ServerRejected { status: response.status, message });
    }

    if response.body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: serde_json::Value = parse_body(&response.body)?;
    if !value.is_array() {
        tracing::warn!(payload = %value, "expected an array of entries; treating as empty");
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

fn parse_created_entry(response: &ApiResponse) -> Result<Entry, ApiError> {
    if response.is_success() {
        return parse_body(&response.body);
    }

    match serde_json::from_str::<ErrorBody>(&response.body) {
        Ok(ErrorBody { error: Some(error) }) => Err(ApiError::ServerRejected {
            status: response.status,
            message: format!("{SUBMIT_FAILED} {error}"),
        }),
        Ok(ErrorBody { error: None }) => Err(ApiError::ServerRejected {
            status: response.status,
            message: format!("{SUBMIT_FAILED} Server returned status {}.", response.status),
        }),
        Err(_) => Err(ApiError::Transport(format!(
            "{SUBMIT_FAILED} Server returned status {}: {}.",
            response.status, response.reason
        ))),
    }
}
