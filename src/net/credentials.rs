//! Credential source for the HTTP adapter.
//!
//! SYSTEM CONTEXT
//! ==============
//! A browser attaches cookies ambiently. Here the adapter asks an injected
//! [`CredentialSource`] for them on every request, and hands every
//! `Set-Cookie` header back so rotation (login, logout, CSRF refresh) is
//! visible to the very next call.

#[cfg(test)]
#[path = "credentials_test.rs"]
mod credentials_test;

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use cookie::Cookie;
use cookie::time::OffsetDateTime;

pub const DEFAULT_SESSION_COOKIE: &str = "sessionid";
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";

/// Supplies the session cookie and anti-forgery token for outgoing requests.
pub trait CredentialSource: Send + Sync {
    /// Current session identifier, if any.
    fn session_cookie(&self) -> Option<String>;

    /// Current anti-forgery token, read fresh. Empty values are reported as `None`.
    fn anti_forgery_token(&self) -> Option<String>;

    /// Full `Cookie` header value, or `None` when nothing is stored.
    fn cookie_header(&self) -> Option<String>;

    /// Apply one raw `Set-Cookie` header value.
    fn absorb_set_cookie(&self, raw: &str);

    /// Forget the session identifier. The anti-forgery cookie is kept.
    fn clear_session(&self);
}

/// In-memory cookie jar scoped to the API origin.
#[derive(Debug)]
pub struct CookieCredentials {
    session_name: String,
    csrf_name: String,
    jar: RwLock<BTreeMap<String, String>>,
}

impl CookieCredentials {
    #[must_use]
    pub fn new(session_name: impl Into<String>, csrf_name: impl Into<String>) -> Self {
        Self { session_name: session_name.into(), csrf_name: csrf_name.into(), jar: RwLock::new(BTreeMap::new()) }
    }

    /// Seed the session cookie, e.g. from a value saved by an earlier `login`.
    #[must_use]
    pub fn with_session(self, value: impl Into<String>) -> Self {
        self.insert(&self.session_name, value.into());
        self
    }

    /// Seed the anti-forgery cookie.
    #[must_use]
    pub fn with_anti_forgery(self, value: impl Into<String>) -> Self {
        self.insert(&self.csrf_name, value.into());
        self
    }

    fn get(&self, name: &str) -> Option<String> {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner);
        jar.get(name).filter(|value| !value.trim().is_empty()).cloned()
    }

    fn insert(&self, name: &str, value: String) {
        let mut jar = self.jar.write().unwrap_or_else(PoisonError::into_inner);
        if value.is_empty() {
            jar.remove(name);
        } else {
            jar.insert(name.to_owned(), value);
        }
    }

    fn remove(&self, name: &str) {
        let mut jar = self.jar.write().unwrap_or_else(PoisonError::into_inner);
        jar.remove(name);
    }
}

impl Default for CookieCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_COOKIE, DEFAULT_CSRF_COOKIE)
    }
}

impl CredentialSource for CookieCredentials {
    fn session_cookie(&self) -> Option<String> {
        self.get(&self.session_name)
    }

    fn anti_forgery_token(&self) -> Option<String> {
        self.get(&self.csrf_name)
    }

    fn cookie_header(&self) -> Option<String> {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner);
        if jar.is_empty() {
            return None;
        }
        let header = jar
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(header)
    }

    fn absorb_set_cookie(&self, raw: &str) {
        let parsed = match Cookie::parse(raw.to_owned()) {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::debug!(%error, "ignoring unparseable set-cookie header");
                return;
            }
        };
        if is_expired(&parsed) {
            tracing::debug!(cookie = parsed.name(), "cookie expired by server");
            self.remove(parsed.name());
            return;
        }
        self.insert(parsed.name(), parsed.value().to_owned());
    }

    fn clear_session(&self) {
        self.remove(&self.session_name);
    }
}

fn is_expired(cookie: &Cookie<'_>) -> bool {
    if cookie.value().is_empty() {
        return true;
    }
    if let Some(max_age) = cookie.max_age() {
        if max_age.is_zero() || max_age.is_negative() {
            return true;
        }
    }
    cookie.expires_datetime().is_some_and(|expires| expires <= OffsetDateTime::now_utc())
}
