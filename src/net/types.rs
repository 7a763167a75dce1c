//! Wire DTOs for the marketplace REST API.
//!
//! DESIGN
//! ======
//! Field names mirror the backend serializers exactly. Decimal columns
//! (`budget`, `bid_amount`) arrive as strings like `"1500.00"`, so they go
//! through `deserialize_optional_amount` rather than plain `f64`.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// IDENTITY
// =============================================================================

/// Account role chosen at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Freelancer,
    Client,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Freelancer => "freelancer",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user as known to the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Backend primary key.
    pub id: u64,
    /// Unique login name; the stable key for ownership checks.
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Serialized as `user_type` on the wire.
    #[serde(rename = "user_type")]
    pub role: Role,
    #[serde(default)]
    pub bio: Option<String>,
}

impl Identity {
    /// Name shown in greetings: first name when set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.first_name.trim().is_empty() { &self.username } else { &self.first_name }
    }

    /// Ownership is decided by username, never by object identity.
    #[must_use]
    pub fn is_same_user(&self, username: &str) -> bool {
        self.username == username
    }
}

/// Body of a successful `register` or `login` response.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AuthResponse {
    pub user: Identity,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: Role,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Partial profile update; absent fields are left unchanged server-side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email.is_none() && self.bio.is_none()
    }
}

// =============================================================================
// JOBS
// =============================================================================

/// Job category slugs accepted by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    WebDevelopment,
    MobileDevelopment,
    Design,
    Writing,
    Marketing,
    Other,
}

impl Category {
    pub const ALL: [Self; 6] = [
        Self::WebDevelopment,
        Self::MobileDevelopment,
        Self::Design,
        Self::Writing,
        Self::Marketing,
        Self::Other,
    ];

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::WebDevelopment => "web-development",
            Self::MobileDevelopment => "mobile-development",
            Self::Design => "design",
            Self::Writing => "writing",
            Self::Marketing => "marketing",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::WebDevelopment => "Web Development",
            Self::MobileDevelopment => "Mobile Development",
            Self::Design => "Design",
            Self::Writing => "Writing",
            Self::Marketing => "Marketing",
            Self::Other => "Other",
        }
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.slug() == slug)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    #[default]
    Entry,
    Intermediate,
    Expert,
}

impl ExperienceLevel {
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Intermediate => "intermediate",
            Self::Expert => "expert",
        }
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        [Self::Entry, Self::Intermediate, Self::Expert]
            .into_iter()
            .find(|level| level.slug() == slug)
    }
}

/// A job posting. Category and experience level stay raw strings so an
/// unexpected slug from the backend does not fail the whole list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub budget: Option<f64>,
    #[serde(default = "default_true")]
    pub is_fixed_price: bool,
    pub experience_level: String,
    #[serde(default)]
    pub deadline: Option<String>,
    pub created_at: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// The posting client.
    pub client: Identity,
}

impl Job {
    /// True when `identity` posted this job.
    #[must_use]
    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        identity.is_same_user(&self.client.username)
    }
}

/// Body of `POST /jobs/create/`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub experience_level: ExperienceLevel,
    pub is_fixed_price: bool,
    pub budget: Option<f64>,
    /// ISO 8601 date, e.g. `2026-12-31`.
    pub deadline: Option<String>,
}

// =============================================================================
// APPLICATIONS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Capitalized form used in listings ("Pending", "Accepted", ...).
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }
}

/// The two decisions an owner can make on a pending application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Rejected,
}

impl From<Decision> for ApplicationStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accepted => Self::Accepted,
            Decision::Rejected => Self::Rejected,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: u64,
    pub job: Job,
    pub freelancer: Identity,
    pub cover_letter: String,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub bid_amount: Option<f64>,
    pub status: ApplicationStatus,
    pub created_at: String,
}

/// Body of `POST /jobs/{id}/apply/`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewApplication {
    pub cover_letter: String,
    pub bid_amount: Option<f64>,
}

/// The apply endpoint echoes only the submitted fields.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SubmittedApplication {
    pub cover_letter: String,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub bid_amount: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct StatusUpdate {
    pub status: Decision,
}

// =============================================================================
// HELPERS
// =============================================================================

/// Render an optional amount the way listings show it.
#[must_use]
pub fn format_budget(amount: Option<f64>) -> String {
    match amount {
        Some(value) => format!("${value:.2}"),
        None => "Negotiable".to_owned(),
    }
}

fn default_true() -> bool {
    true
}

fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(number) => number
            .as_f64()
            .map(Some)
            .ok_or_else(|| D::Error::custom("amount out of range")),
        serde_json::Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid decimal amount: {raw}")))
        }
        _ => Err(D::Error::custom("expected decimal string or number")),
    }
}
