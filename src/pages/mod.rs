//! Headless page controllers.
//!
//! Each controller owns its view state and reads identity only through the
//! [`App`] it was handed. Gated pages wait for the session to settle before
//! deciding, so a page never flashes a denial while identity is resolving.

pub mod auth;
pub mod job_detail;
pub mod job_list;
pub mod my_applications;
pub mod my_jobs;
pub mod nav;
pub mod post_job;
pub mod profile;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::app::App;
use crate::net::types::Identity;
use crate::state::gate::{Access, Action, denial_message};

/// Failure of a page action, carrying the text the page shows.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    /// The session does not allow the action.
    #[error("{0}")]
    Denied(&'static str),

    /// Rejected client-side before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// The request failed; the message is already resolved for display.
    #[error("{0}")]
    Failed(String),
}

impl PageError {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Denied(message) => message,
            Self::Validation(message) | Self::Failed(message) => message,
        }
    }
}

/// What a gated page renders.
#[derive(Clone, Debug, PartialEq)]
pub enum Gated<T> {
    /// Identity still resolving.
    Loading,
    Denied(&'static str),
    Ready(T),
}

impl<T> Gated<T> {
    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Settle the session (resolving it if nothing has yet), then check `action`.
///
/// # Errors
///
/// [`PageError::Denied`] with the action's denial text.
pub(crate) async fn require(app: &App, action: Action<'_>) -> Result<Identity, PageError> {
    let identity = app.session().resolve().await.identity().cloned();
    match (app.gate().can(action), identity) {
        (Access::Allow, Some(identity)) => Ok(identity),
        _ => Err(PageError::Denied(denial_message(action))),
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
