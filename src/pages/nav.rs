//! Navigation bar and home page call-to-action.

#[cfg(test)]
#[path = "nav_test.rs"]
mod nav_test;

use crate::net::types::Role;
use crate::state::gate::AuthGate;
use crate::state::session::SessionState;

/// Destinations reachable from the navigation bar or home page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Link {
    Home,
    BrowseJobs,
    PostJob,
    MyJobs,
    MyApplications,
    Login,
    Register,
    Logout,
}

impl Link {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "FreelanceHub",
            Self::BrowseJobs => "Browse Jobs",
            Self::PostJob => "Post Job",
            Self::MyJobs => "My Jobs",
            Self::MyApplications => "My Applications",
            Self::Login => "Login",
            Self::Register => "Register",
            Self::Logout => "Logout",
        }
    }

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::BrowseJobs => "/jobs",
            Self::PostJob => "/post-job",
            Self::MyJobs => "/my-jobs",
            Self::MyApplications => "/my-applications",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Logout => "/",
        }
    }
}

/// Right-hand side of the bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Account {
    /// Identity not settled; no auth links shown.
    Pending,
    Anonymous,
    SignedIn { greeting: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavBar {
    pub menu: Vec<Link>,
    pub account: Account,
}

impl NavBar {
    /// Auth links on the right, in display order.
    #[must_use]
    pub fn account_links(&self) -> Vec<Link> {
        match self.account {
            Account::Pending => Vec::new(),
            Account::Anonymous => vec![Link::Login, Link::Register],
            Account::SignedIn { .. } => vec![Link::Logout],
        }
    }
}

#[must_use]
pub fn nav_bar(gate: &AuthGate) -> NavBar {
    let mut menu = vec![Link::BrowseJobs];
    match gate.role() {
        Some(Role::Client) => menu.extend([Link::PostJob, Link::MyJobs]),
        Some(Role::Freelancer) => menu.push(Link::MyApplications),
        None => {}
    }
    let account = match (gate.state(), gate.identity()) {
        (_, Some(identity)) => Account::SignedIn { greeting: format!("Hello, {}", identity.display_name()) },
        (SessionState::Resolved(None), None) => Account::Anonymous,
        _ => Account::Pending,
    };
    NavBar { menu, account }
}

/// Primary and secondary buttons under the home page headline.
#[must_use]
pub fn home_actions(gate: &AuthGate) -> Vec<(&'static str, Link)> {
    if !gate.is_resolved() {
        return vec![("Browse Jobs", Link::BrowseJobs)];
    }
    match gate.role() {
        None => vec![("Get Started", Link::Register), ("Browse Jobs", Link::BrowseJobs)],
        Some(Role::Client) => vec![("Browse Jobs", Link::BrowseJobs), ("Post a Job", Link::PostJob)],
        Some(Role::Freelancer) => vec![("Browse Jobs", Link::BrowseJobs)],
    }
}
