//! Session store: the single holder of the authenticated identity.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page controller reads the current identity from here, never from
//! its own copy. The store resolves identity once at startup from the session
//! cookie, is updated in place by login/register, and is cleared by logout.
//!
//! DESIGN
//! ======
//! State lives in one `tokio::sync::watch` channel. Each transition is a
//! single write, so readers see either the old or the new state and never a
//! partial one. `resolve` only commits its result if the state is still
//! `Resolving`; a login that lands first wins.
//!
//! ERROR HANDLING
//! ==============
//! Resolve failures (network, 401/403, bad body, timeout) settle as anonymous
//! and are logged at debug level. Logout clears local state whatever the
//! backend says.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use super::gate::AuthGate;
use crate::net::api::Api;
use crate::net::error::ApiError;
use crate::net::types::Identity;

/// Lifecycle of the session as seen by the client.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Unresolved,
    Resolving,
    /// `None` means anonymous.
    Resolved(Option<Identity>),
}

impl SessionState {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Resolved(identity) => identity.as_ref(),
            _ => None,
        }
    }
}

/// Remote operations the store needs. [`Api`] is the production impl; tests
/// substitute scripted backends.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    async fn current_identity(&self) -> Result<Identity, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;

    /// Drop the locally held session credential.
    fn clear_local_session(&self);
}

#[async_trait]
impl IdentityBackend for Api {
    async fn current_identity(&self) -> Result<Identity, ApiError> {
        Api::current_identity(self).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        Api::logout(self).await
    }

    fn clear_local_session(&self) {
        self.http().credentials().clear_session();
    }
}

struct Inner {
    tx: watch::Sender<SessionState>,
    backend: Arc<dyn IdentityBackend>,
    timeout: Duration,
}

/// Shared handle; clones observe and mutate the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// `timeout` bounds both the startup resolve and the logout call.
    #[must_use]
    pub fn new(backend: Arc<dyn IdentityBackend>, timeout: Duration) -> Self {
        let (tx, _rx) = watch::channel(SessionState::Unresolved);
        Self { inner: Arc::new(Inner { tx, backend, timeout }) }
    }

    /// Atomic copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.inner.tx.borrow().clone()
    }

    /// Gate evaluated against the current snapshot.
    #[must_use]
    pub fn gate(&self) -> AuthGate {
        AuthGate::new(self.snapshot())
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.tx.subscribe()
    }

    /// Resolve the identity behind the current session cookie.
    ///
    /// Only the first call talks to the backend. Concurrent callers wait for
    /// that one to settle; later callers get the settled state immediately.
    pub async fn resolve(&self) -> SessionState {
        let claimed = self.inner.tx.send_if_modified(|state| {
            if *state == SessionState::Unresolved {
                *state = SessionState::Resolving;
                true
            } else {
                false
            }
        });
        if !claimed {
            self.wait_resolved().await;
            return self.snapshot();
        }

        tracing::debug!("resolving session identity");
        let identity = match tokio::time::timeout(self.inner.timeout, self.inner.backend.current_identity()).await {
            Ok(Ok(identity)) => Some(identity),
            Ok(Err(error)) => {
                tracing::debug!(%error, "identity resolve failed; continuing anonymous");
                None
            }
            Err(_) => {
                tracing::debug!(timeout = ?self.inner.timeout, "identity resolve timed out; continuing anonymous");
                None
            }
        };

        let committed = self.inner.tx.send_if_modified(|state| {
            if *state == SessionState::Resolving {
                *state = SessionState::Resolved(identity.clone());
                true
            } else {
                false
            }
        });
        if committed {
            match &identity {
                Some(user) => tracing::info!(username = %user.username, role = %user.role, "session resolved"),
                None => tracing::info!("session resolved anonymous"),
            }
        } else {
            tracing::debug!("identity changed during resolve; discarding resolve result");
        }
        self.snapshot()
    }

    /// Install the identity returned by a successful login or register.
    pub fn set_identity(&self, identity: Identity) {
        tracing::info!(username = %identity.username, role = %identity.role, "session identity set");
        self.inner.tx.send_replace(SessionState::Resolved(Some(identity)));
    }

    /// Log out remotely, then clear local state unconditionally.
    pub async fn logout(&self) {
        match tokio::time::timeout(self.inner.timeout, self.inner.backend.logout()).await {
            Ok(Ok(())) => tracing::debug!("remote logout succeeded"),
            Ok(Err(error)) => tracing::warn!(%error, "remote logout failed; clearing local session anyway"),
            Err(_) => tracing::warn!("remote logout timed out; clearing local session anyway"),
        }
        self.inner.backend.clear_local_session();
        self.inner.tx.send_replace(SessionState::Resolved(None));
        tracing::info!("session cleared");
    }

    /// Suspend until the state is `Resolved`, then return the identity.
    /// Never returns if nobody calls [`SessionStore::resolve`].
    pub async fn wait_resolved(&self) -> Option<Identity> {
        let mut rx = self.inner.tx.subscribe();
        match rx.wait_for(SessionState::is_resolved).await {
            Ok(state) => state.identity().cloned(),
            Err(_) => None,
        }
    }
}
