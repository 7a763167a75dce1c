//! Client configuration parsed from environment variables.

use std::time::Duration;

use crate::net::credentials::{DEFAULT_CSRF_COOKIE, DEFAULT_SESSION_COOKIE};

pub const DEFAULT_DEV_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_PROD_BASE_URL: &str = "https://freelancing-marketplace.onrender.com/api";
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";
pub const DEFAULT_RESOLVE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Upper bound on the startup identity resolve and on logout.
    pub resolve_secs: u64,
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn resolve(&self) -> Duration {
        Duration::from_secs(self.resolve_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            resolve_secs: DEFAULT_RESOLVE_TIMEOUT_SECS,
            request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root without a trailing slash, e.g. `http://localhost:8000/api`.
    pub base_url: String,
    pub session_cookie: String,
    pub csrf_cookie: String,
    pub csrf_header: String,
    /// Path fetched once at startup to obtain an anti-forgery cookie.
    pub csrf_prime_path: Option<String>,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Config pointing at `base_url` with every other value defaulted.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            session_cookie: DEFAULT_SESSION_COOKIE.to_owned(),
            csrf_cookie: DEFAULT_CSRF_COOKIE.to_owned(),
            csrf_header: DEFAULT_CSRF_HEADER.to_owned(),
            csrf_prime_path: None,
            timeouts: Timeouts::default(),
        }
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `FREELANCEHUB_API_BASE_URL`: overrides the environment default
    /// - `FREELANCEHUB_ENV`: `development` (default) or `production`
    /// - `FREELANCEHUB_SESSION_COOKIE`: default `sessionid`
    /// - `FREELANCEHUB_CSRF_COOKIE`: default `csrftoken`
    /// - `FREELANCEHUB_CSRF_HEADER`: default `X-CSRFToken`
    /// - `FREELANCEHUB_CSRF_PRIME_PATH`: unset by default
    /// - `FREELANCEHUB_RESOLVE_TIMEOUT_SECS`: default 10
    /// - `FREELANCEHUB_REQUEST_TIMEOUT_SECS`: default 30
    /// - `FREELANCEHUB_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown environment name or a malformed value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_name = std::env::var("FREELANCEHUB_ENV").unwrap_or_else(|_| "development".to_owned());
        let default_base = default_base_url(&env_name)?;
        let base_url = std::env::var("FREELANCEHUB_API_BASE_URL").unwrap_or_else(|_| default_base.to_owned());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Parse(format!("FREELANCEHUB_API_BASE_URL must be http(s): {base_url}")));
        }

        let mut config = Self::new(&base_url);
        if let Ok(name) = std::env::var("FREELANCEHUB_SESSION_COOKIE") {
            config.session_cookie = non_empty("FREELANCEHUB_SESSION_COOKIE", name)?;
        }
        if let Ok(name) = std::env::var("FREELANCEHUB_CSRF_COOKIE") {
            config.csrf_cookie = non_empty("FREELANCEHUB_CSRF_COOKIE", name)?;
        }
        if let Ok(name) = std::env::var("FREELANCEHUB_CSRF_HEADER") {
            config.csrf_header = non_empty("FREELANCEHUB_CSRF_HEADER", name)?;
        }
        config.csrf_prime_path = match std::env::var("FREELANCEHUB_CSRF_PRIME_PATH") {
            Ok(path) if !path.trim().is_empty() => Some(path.trim().to_owned()),
            _ => None,
        };
        config.timeouts = Timeouts {
            resolve_secs: env_secs("FREELANCEHUB_RESOLVE_TIMEOUT_SECS", DEFAULT_RESOLVE_TIMEOUT_SECS)?,
            request_secs: env_secs("FREELANCEHUB_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_secs("FREELANCEHUB_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        Ok(config)
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn default_base_url(raw: &str) -> Result<&'static str, ConfigError> {
    match raw.trim() {
        "development" | "dev" => Ok(DEFAULT_DEV_BASE_URL),
        "production" | "prod" => Ok(DEFAULT_PROD_BASE_URL),
        other => Err(ConfigError::Parse(format!("unknown FREELANCEHUB_ENV: {other}"))),
    }
}

/// A timeout in whole seconds. Zero would expire every call at once.
fn env_secs(key: &str, default: u64) -> Result<u64, ConfigError> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Parse(format!("{key} must be at least 1 second"))),
        Ok(secs) => Ok(secs),
        Err(_) => Err(ConfigError::Parse(format!("{key} must be a whole number of seconds, got {raw:?}"))),
    }
}

fn non_empty(key: &str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Parse(format!("{key} must not be empty")));
    }
    Ok(value.trim().to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
