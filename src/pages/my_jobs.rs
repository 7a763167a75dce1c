//! A client's own jobs and the applications they received.
//!
//! Accepting or rejecting an application updates the in-memory status first
//! so the list reacts immediately, then reloads from the backend. The reload
//! also runs after a failure, which puts the true status back.

#[cfg(test)]
#[path = "my_jobs_test.rs"]
mod my_jobs_test;

use std::sync::Mutex;

use futures::future::try_join_all;

use super::{Gated, PageError, lock, require};
use crate::app::App;
use crate::net::error::ApiError;
use crate::net::types::{ApplicationStatus, Decision, Job, JobApplication};
use crate::state::gate::{Access, Action, denial_message};
use crate::state::latest::Latest;

pub const FETCH_MY_JOBS_FAILED: &str = "Failed to fetch your jobs";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MyJobsView {
    pub loading: bool,
    pub jobs: Vec<Job>,
    pub applications: Vec<JobApplication>,
    pub error: Option<String>,
}

impl MyJobsView {
    /// Applications received for one job, in load order.
    #[must_use]
    pub fn applications_for(&self, job_id: u64) -> Vec<&JobApplication> {
        self.applications.iter().filter(|app| app.job.id == job_id).collect()
    }
}

/// `Failed to update application status: {reason}`, where the reason is the
/// backend's `error` message when there is one.
#[must_use]
pub fn status_update_failure(error: &ApiError) -> String {
    let reason = match error {
        ApiError::Http { body, .. } => body.field_message("error"),
        _ => None,
    };
    format!("Failed to update application status: {}", reason.as_deref().unwrap_or("Please try again"))
}

pub struct MyJobs {
    app: App,
    latest: Latest,
    view: Mutex<MyJobsView>,
}

impl MyJobs {
    #[must_use]
    pub fn new(app: &App) -> Self {
        Self { app: app.clone(), latest: Latest::new(), view: Mutex::new(MyJobsView::default()) }
    }

    #[must_use]
    pub fn view(&self) -> Gated<MyJobsView> {
        match self.app.gate().can(Action::ViewMyJobs) {
            Access::Unknown => Gated::Loading,
            Access::Deny => Gated::Denied(denial_message(Action::ViewMyJobs)),
            Access::Allow => Gated::Ready(lock(&self.view).clone()),
        }
    }

    pub fn close(&self) {
        self.latest.invalidate();
    }

    /// Load the jobs, then every job's applications concurrently.
    ///
    /// # Errors
    ///
    /// `Denied` unless signed in as a client; `Failed` when a fetch fails.
    pub async fn load(&self) -> Result<(), PageError> {
        require(&self.app, Action::ViewMyJobs).await?;
        let ticket = {
            lock(&self.view).loading = true;
            self.latest.issue()
        };

        let result = self.fetch().await;
        if !ticket.is_current() {
            tracing::debug!("discarding superseded my-jobs response");
            return Ok(());
        }

        let mut view = lock(&self.view);
        view.loading = false;
        match result {
            Ok((jobs, applications)) => {
                view.jobs = jobs;
                view.applications = applications;
                view.error = None;
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "my jobs fetch failed");
                view.error = Some(FETCH_MY_JOBS_FAILED.to_owned());
                Err(PageError::Failed(FETCH_MY_JOBS_FAILED.to_owned()))
            }
        }
    }

    async fn fetch(&self) -> Result<(Vec<Job>, Vec<JobApplication>), ApiError> {
        let api = self.app.api();
        let jobs = api.my_jobs().await?;
        let per_job = try_join_all(jobs.iter().map(|job| api.job_applications(job.id))).await?;
        Ok((jobs, per_job.into_iter().flatten().collect()))
    }

    /// Accept or reject a pending application.
    ///
    /// # Errors
    ///
    /// `Denied` for a non-owner, `Validation` for an unknown or already
    /// decided application, `Failed` when the update request fails.
    pub async fn decide(&self, application_id: u64, decision: Decision) -> Result<(), PageError> {
        require(&self.app, Action::ViewMyJobs).await?;
        let owner = {
            let view = lock(&self.view);
            let Some(application) = view.applications.iter().find(|app| app.id == application_id) else {
                return Err(PageError::Validation(format!("No application with id {application_id}.")));
            };
            if application.status != ApplicationStatus::Pending {
                return Err(PageError::Validation("Only pending applications can be accepted or rejected.".to_owned()));
            }
            application.job.client.username.clone()
        };
        if !self.app.gate().can(Action::ManageApplications { job_owner: &owner }).is_allowed() {
            return Err(PageError::Denied(denial_message(Action::ManageApplications { job_owner: &owner })));
        }

        self.set_status(application_id, decision.into());
        let outcome = self.app.api().update_application_status(application_id, decision).await;
        let failure = match outcome {
            Ok(_) => {
                tracing::info!(application_id, status = ApplicationStatus::from(decision).as_str(), "application decided");
                None
            }
            Err(error) => {
                tracing::warn!(%error, application_id, "application status update failed");
                Some(status_update_failure(&error))
            }
        };

        if let Err(error) = self.load().await {
            tracing::debug!(%error, "refresh after status update failed");
        }
        // Recorded after the refresh, which clears errors on success.
        match failure {
            Some(message) => {
                lock(&self.view).error = Some(message.clone());
                Err(PageError::Failed(message))
            }
            None => Ok(()),
        }
    }

    fn set_status(&self, application_id: u64, status: ApplicationStatus) {
        let mut view = lock(&self.view);
        if let Some(application) = view.applications.iter_mut().find(|app| app.id == application_id) {
            application.status = status;
        }
    }
}
