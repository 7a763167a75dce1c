//! Application context.
//!
//! ARCHITECTURE
//! ============
//! One [`App`] owns exactly one credential source, one HTTP adapter and one
//! session store. Page controllers receive it by reference; nothing reads
//! session state from a global.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::net::api::Api;
use crate::net::credentials::{CookieCredentials, CredentialSource};
use crate::net::error::ApiError;
use crate::net::http::HttpClient;
use crate::state::gate::AuthGate;
use crate::state::session::{SessionState, SessionStore};

#[derive(Clone)]
pub struct App {
    config: Arc<ClientConfig>,
    credentials: Arc<dyn CredentialSource>,
    api: Api,
    session: SessionStore,
}

impl App {
    /// Build the context around an injected credential source.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP adapter cannot be constructed.
    pub fn new(config: ClientConfig, credentials: Arc<dyn CredentialSource>) -> Result<Self, ApiError> {
        let http = HttpClient::new(&config, credentials.clone())?;
        let api = Api::new(Arc::new(http));
        let session = SessionStore::new(Arc::new(api.clone()), config.timeouts.resolve());
        Ok(Self { config: Arc::new(config), credentials, api, session })
    }

    /// Build the context with an empty in-memory cookie jar using the
    /// configured cookie names.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP adapter cannot be constructed.
    pub fn from_config(config: ClientConfig) -> Result<Self, ApiError> {
        let credentials = Arc::new(CookieCredentials::new(&config.session_cookie, &config.csrf_cookie));
        Self::new(config, credentials)
    }

    /// Prime the anti-forgery cookie when configured, then resolve the
    /// session. Neither step can fail the startup.
    pub async fn start(&self) -> SessionState {
        if let Some(path) = &self.config.csrf_prime_path {
            if let Err(error) = self.api.prime_anti_forgery(path).await {
                tracing::debug!(%error, path, "anti-forgery priming failed; continuing");
            }
        }
        self.session.resolve().await
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn api(&self) -> &Api {
        &self.api
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialSource> {
        &self.credentials
    }

    #[must_use]
    pub fn gate(&self) -> AuthGate {
        self.session.gate()
    }
}
