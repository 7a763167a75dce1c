//! A freelancer's submitted applications.

#[cfg(test)]
#[path = "my_applications_test.rs"]
mod my_applications_test;

use std::sync::Mutex;

use super::{Gated, PageError, lock, require};
use crate::app::App;
use crate::net::types::JobApplication;
use crate::state::gate::{Access, Action, denial_message};
use crate::state::latest::Latest;

pub const FETCH_MY_APPLICATIONS_FAILED: &str = "Failed to fetch your applications";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MyApplicationsView {
    pub loading: bool,
    pub applications: Vec<JobApplication>,
    pub error: Option<String>,
}

pub struct MyApplications {
    app: App,
    latest: Latest,
    view: Mutex<MyApplicationsView>,
}

impl MyApplications {
    #[must_use]
    pub fn new(app: &App) -> Self {
        Self { app: app.clone(), latest: Latest::new(), view: Mutex::new(MyApplicationsView::default()) }
    }

    #[must_use]
    pub fn view(&self) -> Gated<MyApplicationsView> {
        match self.app.gate().can(Action::ViewMyApplications) {
            Access::Unknown => Gated::Loading,
            Access::Deny => Gated::Denied(denial_message(Action::ViewMyApplications)),
            Access::Allow => Gated::Ready(lock(&self.view).clone()),
        }
    }

    pub fn close(&self) {
        self.latest.invalidate();
    }

    /// # Errors
    ///
    /// `Denied` unless signed in as a freelancer; `Failed` when the fetch
    /// fails.
    pub async fn load(&self) -> Result<(), PageError> {
        require(&self.app, Action::ViewMyApplications).await?;
        let ticket = {
            lock(&self.view).loading = true;
            self.latest.issue()
        };

        let result = self.app.api().my_applications().await;
        if !ticket.is_current() {
            return Ok(());
        }

        let mut view = lock(&self.view);
        view.loading = false;
        match result {
            Ok(applications) => {
                view.applications = applications;
                view.error = None;
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "my applications fetch failed");
                view.error = Some(FETCH_MY_APPLICATIONS_FAILED.to_owned());
                Err(PageError::Failed(FETCH_MY_APPLICATIONS_FAILED.to_owned()))
            }
        }
    }
}
