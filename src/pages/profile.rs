//! Profile editing for the signed-in user.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use super::{Gated, PageError, require};
use crate::app::App;
use crate::net::types::{Identity, ProfileUpdate};
use crate::state::gate::{Access, Action, denial_message};

pub const PROFILE_UPDATE_FAILED: &str = "Failed to update profile";

const PROFILE_ERROR_FIELDS: [&str; 4] = ["first_name", "last_name", "email", "bio"];

pub struct Profile {
    app: App,
}

impl Profile {
    #[must_use]
    pub fn new(app: &App) -> Self {
        Self { app: app.clone() }
    }

    /// The identity as currently held by the session.
    #[must_use]
    pub fn view(&self) -> Gated<Identity> {
        let gate = self.app.gate();
        match (gate.can(Action::UpdateProfile), gate.identity()) {
            (Access::Unknown, _) => Gated::Loading,
            (Access::Allow, Some(identity)) => Gated::Ready(identity.clone()),
            _ => Gated::Denied(denial_message(Action::UpdateProfile)),
        }
    }

    /// Send the changed fields; on success the session identity is replaced
    /// with the backend's copy.
    ///
    /// # Errors
    ///
    /// `Denied` when signed out, `Validation` for an empty update, `Failed`
    /// with the first field message otherwise.
    pub async fn update(&self, update: &ProfileUpdate) -> Result<Identity, PageError> {
        require(&self.app, Action::UpdateProfile).await?;
        if update.is_empty() {
            return Err(PageError::Validation("Nothing to update.".to_owned()));
        }
        match self.app.api().update_profile(update).await {
            Ok(identity) => {
                self.app.session().set_identity(identity.clone());
                Ok(identity)
            }
            Err(error) => {
                tracing::warn!(%error, "profile update failed");
                Err(PageError::Failed(error.message_for(&PROFILE_ERROR_FIELDS, PROFILE_UPDATE_FAILED)))
            }
        }
    }
}
