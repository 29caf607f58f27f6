//! Client configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 40;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SPEECH_WPM: u32 = 180;

/// Errors produced while building a [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The API base URL was set but empty.
    #[error("base URL must not be empty")]
    EmptyBaseUrl,

    /// The API base URL does not use an HTTP scheme.
    #[error("base URL must start with http:// or https://, got '{0}'")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin of the REST API, without a trailing slash.
    pub base_url: String,
    /// Hard deadline for one survey submission round-trip.
    pub submit_timeout: Duration,
    /// TCP connect timeout for every request.
    pub connect_timeout: Duration,
    /// Pacing of the console narrator, in words per minute.
    pub speech_wpm: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            submit_timeout: Duration::from_secs(DEFAULT_SUBMIT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            speech_wpm: DEFAULT_SPEECH_WPM,
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `JOBSUGGEST_BASE_URL`: default `http://127.0.0.1:8080`
    /// - `JOBSUGGEST_SUBMIT_TIMEOUT_SECS`: default 40
    /// - `JOBSUGGEST_CONNECT_TIMEOUT_SECS`: default 10
    /// - `JOBSUGGEST_SPEECH_WPM`: default 180
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or not an HTTP URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. `from_env` delegates here.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or not an HTTP URL.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(
            lookup("JOBSUGGEST_BASE_URL")
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL),
        )?;
        let submit_secs = parse_or(&lookup, "JOBSUGGEST_SUBMIT_TIMEOUT_SECS", DEFAULT_SUBMIT_TIMEOUT_SECS);
        let connect_secs = parse_or(&lookup, "JOBSUGGEST_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS);
        let speech_wpm = parse_or(&lookup, "JOBSUGGEST_SPEECH_WPM", DEFAULT_SPEECH_WPM).max(1);

        Ok(Self {
            base_url,
            submit_timeout: Duration::from_secs(submit_secs),
            connect_timeout: Duration::from_secs(connect_secs),
            speech_wpm,
        })
    }

    /// Replace the base URL, e.g. from a command-line override.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty or not an HTTP URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ConfigError::InvalidBaseUrl(trimmed.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
