//! Wire types for the job-suggestions REST API and the errors it maps to.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Typed failure of one API operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status and a usable message.
    #[error("{message}")]
    ServerRejected { status: u16, message: String },

    /// No usable response at all.
    #[error("{0}")]
    Transport(String),

    /// A success status whose body does not have the expected shape.
    #[error("unexpected response from server: {0}")]
    MalformedResponse(String),
}

impl From<super::TransportError> for ApiError {
    fn from(err: super::TransportError) -> Self {
        Self::Transport(err.to_string())
    }
}

/// `{ "error": "..." }` body returned by failing endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

// =============================================================================
// AUTH
// =============================================================================

/// Body of `/api/auth/me`, `/api/auth/login` and `/api/auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// =============================================================================
// SURVEY
// =============================================================================

/// The five survey questions, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurveyField {
    WorkHistory,
    Skills,
    Personality,
    Location,
    RolePreference,
}

impl SurveyField {
    pub const ALL: [Self; 5] = [
        Self::WorkHistory,
        Self::Skills,
        Self::Personality,
        Self::Location,
        Self::RolePreference,
    ];

    /// Human-facing label used in validation messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::WorkHistory => "Work History",
            Self::Skills => "Skills",
            Self::Personality => "Personality Traits",
            Self::Location => "Location Preference",
            Self::RolePreference => "Role Preference",
        }
    }

    /// JSON key inside the `answers` object.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::WorkHistory => "workHistory",
            Self::Skills => "skills",
            Self::Personality => "personality",
            Self::Location => "location",
            Self::RolePreference => "rolePreference",
        }
    }
}

/// Choices the survey form offers for [`SurveyField::Location`].
pub const LOCATION_OPTIONS: [&str; 3] = ["Remote", "On-site", "Hybrid"];

/// Answers to the survey, built up field by field before submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnswers {
    pub work_history: String,
    pub skills: String,
    pub personality: String,
    pub location: String,
    pub role_preference: String,
}

impl SurveyAnswers {
    #[must_use]
    pub fn get(&self, field: SurveyField) -> &str {
        match field {
            SurveyField::WorkHistory => &self.work_history,
            SurveyField::Skills => &self.skills,
            SurveyField::Personality => &self.personality,
            SurveyField::Location => &self.location,
            SurveyField::RolePreference => &self.role_preference,
        }
    }

    pub fn set(&mut self, field: SurveyField, value: impl Into<String>) {
        let slot = match field {
            SurveyField::WorkHistory => &mut self.work_history,
            SurveyField::Skills => &mut self.skills,
            SurveyField::Personality => &mut self.personality,
            SurveyField::Location => &mut self.location,
            SurveyField::RolePreference => &mut self.role_preference,
        };
        *slot = value.into();
    }

    /// Every field that is empty or whitespace-only, in form order.
    #[must_use]
    pub fn blank_fields(&self) -> Vec<SurveyField> {
        SurveyField::ALL
            .into_iter()
            .filter(|field| self.get(*field).trim().is_empty())
            .collect()
    }

    /// Reset every answer to the empty string.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// ENTRY
// =============================================================================

/// Extra data the server attached to an entry: either plain text or JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalData {
    Text(String),
    Json(serde_json::Value),
}

impl ExternalData {
    /// Text form suitable for display or reading aloud.
    #[must_use]
    pub fn to_display_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Json(value) => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
        }
    }
}

/// A saved survey submission and the suggestions generated for it.
///
/// Entries are server-owned: the client replaces its cached list wholesale
/// and never edits one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: i64,
    /// User-scoped number shown in the UI.
    #[serde(default)]
    pub entry_number: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub suggestions: Option<String>,
    #[serde(default)]
    pub external_api_data: Option<ExternalData>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Entry {
    /// Number to display for the entry at `position` (0-based) in its list.
    ///
    /// Uses the server's `entryNumber`, falling back to the 1-based position.
    #[must_use]
    pub fn display_number(&self, position: usize) -> i64 {
        self.entry_number
            .filter(|n| *n > 0)
            .unwrap_or_else(|| i64::try_from(position).map_or(i64::MAX, |p| p.saturating_add(1)))
    }

    #[must_use]
    pub fn suggestions_text(&self) -> &str {
        self.suggestions.as_deref().unwrap_or("N/A")
    }

    /// Answers rendered as pretty JSON, the way they are shown and read aloud.
    #[must_use]
    pub fn answers_text(&self) -> String {
        serde_json::to_string_pretty(&self.answers).unwrap_or_default()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
