//! Access decisions derived from a session snapshot.
//!
//! Pure functions only: the gate never talks to the network and never
//! mutates the session. While the session is still resolving every decision
//! is [`Access::Unknown`], which pages render as a neutral loading state
//! rather than a denial.

#[cfg(test)]
#[path = "gate_test.rs"]
mod gate_test;

use super::session::SessionState;
use crate::net::types::{Identity, Role};

/// Outcome of a gate check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
    /// Identity not settled yet.
    Unknown,
}

impl Access {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }
}

/// Protected things a page may try to do. Job-scoped actions carry the job
/// owner's username, which is what ownership is compared on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action<'a> {
    PostJob,
    ViewMyJobs,
    ViewMyApplications,
    Apply { job_owner: &'a str },
    ManageApplications { job_owner: &'a str },
    UpdateProfile,
}

/// Message shown when `action` is denied.
#[must_use]
pub fn denial_message(action: Action<'_>) -> &'static str {
    match action {
        Action::PostJob => "You must be logged in as a client to post jobs.",
        Action::ViewMyJobs => "You must be logged in as a client to view your jobs.",
        Action::ViewMyApplications => "You must be logged in as a freelancer to view your applications.",
        Action::Apply { .. } => "Log in as a freelancer to apply for this job.",
        Action::ManageApplications { .. } => "Only the client who posted this job can manage its applications.",
        Action::UpdateProfile => "You must be logged in to edit your profile.",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AuthGate {
    state: SessionState,
}

impl AuthGate {
    #[must_use]
    pub fn new(state: SessionState) -> Self {
        Self { state }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.identity().is_some()
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.state.identity()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.identity().map(|identity| identity.role)
    }

    #[must_use]
    pub fn can(&self, action: Action<'_>) -> Access {
        let SessionState::Resolved(identity) = &self.state else {
            return Access::Unknown;
        };
        let Some(identity) = identity else {
            return Access::Deny;
        };
        let allowed = match action {
            Action::PostJob | Action::ViewMyJobs => identity.role == Role::Client,
            Action::ViewMyApplications => identity.role == Role::Freelancer,
            Action::Apply { job_owner } => identity.role == Role::Freelancer && !identity.is_same_user(job_owner),
            Action::ManageApplications { job_owner } => identity.is_same_user(job_owner),
            Action::UpdateProfile => true,
        };
        if allowed { Access::Allow } else { Access::Deny }
    }
}
