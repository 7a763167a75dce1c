//! Classified failures from the HTTP adapter.
//!
//! ERROR HANDLING
//! ==============
//! The adapter never swallows a failure. Callers decide what a status means;
//! in particular a 403 is handed back untouched because an anti-forgery
//! mismatch and a permission failure look identical at this layer.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde_json::Value;

/// Keys the backend uses for non-field errors, checked after the caller's
/// own field list.
pub const GENERIC_ERROR_KEYS: [&str; 3] = ["error", "detail", "non_field_errors"];

/// Errors produced by API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was received (connect failure, reset, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// A response arrived with a non-2xx status.
    #[error("HTTP {status}")]
    Http { status: u16, body: ErrorBody },

    /// A 2xx response body could not be decoded.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The configured base URL and path did not form a valid URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    Client(String),
}

impl ApiError {
    /// Status code for HTTP failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403 responses.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// First message found by walking `fields` in order, then the generic
    /// keys, falling back to `fallback`. Non-HTTP failures yield `fallback`.
    #[must_use]
    pub fn message_for(&self, fields: &[&str], fallback: &str) -> String {
        match self {
            Self::Http { body, .. } => body.first_message(fields).unwrap_or_else(|| fallback.to_owned()),
            _ => fallback.to_owned(),
        }
    }
}

/// Parsed body of a failed response. Non-JSON bodies are kept as text.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorBody {
    Json(Value),
    Text(String),
}

impl ErrorBody {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(raw.to_owned()),
        }
    }

    /// Message for one key. A string is used as-is; an array yields its first
    /// non-empty string (the backend reports field errors as lists).
    #[must_use]
    pub fn field_message(&self, field: &str) -> Option<String> {
        let Self::Json(Value::Object(map)) = self else {
            return None;
        };
        message_from_value(map.get(field)?)
    }

    /// First non-empty message in `fields` order, then [`GENERIC_ERROR_KEYS`].
    #[must_use]
    pub fn first_message(&self, fields: &[&str]) -> Option<String> {
        fields
            .iter()
            .chain(GENERIC_ERROR_KEYS.iter())
            .find_map(|field| self.field_message(field))
    }
}

fn message_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => items.iter().find_map(message_from_value),
        _ => None,
    }
}
