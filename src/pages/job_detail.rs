//! Single job view and the apply form.
//!
//! The apply panel is derived from the session on every read, so a login or
//! logout elsewhere changes what the page offers without reloading the job.

#[cfg(test)]
#[path = "job_detail_test.rs"]
mod job_detail_test;

use std::sync::Mutex;

use super::{PageError, lock};
use crate::app::App;
use crate::net::types::{Job, NewApplication, Role};
use crate::state::gate::{Access, Action, denial_message};
use crate::state::latest::Latest;

pub const FETCH_JOB_FAILED: &str = "Failed to fetch job details";
pub const APPLY_FAILED: &str = "Failed to submit application. Please try again.";
pub const APPLY_SUCCEEDED: &str = "Your application has been submitted successfully!";
pub const OWNER_NOTICE: &str = "You posted this job.";
pub const FREELANCERS_ONLY: &str = "Only freelancers can apply to jobs";

const APPLY_ERROR_FIELDS: [&str; 2] = ["cover_letter", "bid_amount"];

/// What the page offers under the job description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyPanel {
    /// Job or identity not settled yet.
    Loading,
    Form { error: Option<String> },
    Owner(&'static str),
    Submitted(&'static str),
    LoginPrompt(&'static str),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobDetailView {
    pub loading: bool,
    pub job: Option<Job>,
    pub error: Option<String>,
    pub submitted: bool,
    pub apply_error: Option<String>,
}

pub struct JobDetail {
    app: App,
    job_id: u64,
    latest: Latest,
    view: Mutex<JobDetailView>,
}

impl JobDetail {
    #[must_use]
    pub fn new(app: &App, job_id: u64) -> Self {
        Self {
            app: app.clone(),
            job_id,
            latest: Latest::new(),
            view: Mutex::new(JobDetailView { loading: true, ..JobDetailView::default() }),
        }
    }

    #[must_use]
    pub fn view(&self) -> JobDetailView {
        lock(&self.view).clone()
    }

    pub fn close(&self) {
        self.latest.invalidate();
    }

    pub async fn load(&self) {
        let ticket = {
            lock(&self.view).loading = true;
            self.latest.issue()
        };
        let result = self.app.api().job(self.job_id).await;
        if !ticket.is_current() {
            tracing::debug!(job_id = self.job_id, "discarding superseded job detail response");
            return;
        }

        let mut view = lock(&self.view);
        view.loading = false;
        match result {
            Ok(job) => {
                view.job = Some(job);
                view.error = None;
            }
            Err(error) => {
                tracing::warn!(%error, job_id = self.job_id, "job detail fetch failed");
                view.error = Some(FETCH_JOB_FAILED.to_owned());
            }
        }
    }

    #[must_use]
    pub fn panel(&self) -> ApplyPanel {
        let view = lock(&self.view);
        let Some(job) = &view.job else {
            return ApplyPanel::Loading;
        };
        if view.submitted {
            return ApplyPanel::Submitted(APPLY_SUCCEEDED);
        }
        let gate = self.app.gate();
        let owner = job.client.username.as_str();
        match gate.can(Action::Apply { job_owner: owner }) {
            Access::Unknown => ApplyPanel::Loading,
            Access::Allow => ApplyPanel::Form { error: view.apply_error.clone() },
            Access::Deny if gate.can(Action::ManageApplications { job_owner: owner }).is_allowed() => {
                ApplyPanel::Owner(OWNER_NOTICE)
            }
            Access::Deny => ApplyPanel::LoginPrompt(denial_message(Action::Apply { job_owner: owner })),
        }
    }

    /// Submit an application. `bid` is the raw form text; empty means no bid.
    ///
    /// # Errors
    ///
    /// `Denied` when the session cannot apply, `Validation` for a blank cover
    /// letter or a bad bid, `Failed` with the backend's message otherwise.
    pub async fn apply(&self, cover_letter: &str, bid: &str) -> Result<(), PageError> {
        let owner = {
            let view = lock(&self.view);
            match &view.job {
                Some(job) => job.client.username.clone(),
                None => return Err(PageError::Failed(FETCH_JOB_FAILED.to_owned())),
            }
        };

        self.app.session().resolve().await;
        let gate = self.app.gate();
        if !gate.can(Action::Apply { job_owner: &owner }).is_allowed() {
            let message = match gate.role() {
                None => denial_message(Action::Apply { job_owner: &owner }),
                Some(Role::Client) => FREELANCERS_ONLY,
                Some(Role::Freelancer) => OWNER_NOTICE,
            };
            return Err(PageError::Denied(message));
        }

        let application = validate(cover_letter, bid)?;
        match self.app.api().apply(self.job_id, &application).await {
            Ok(_) => {
                let mut view = lock(&self.view);
                view.submitted = true;
                view.apply_error = None;
                tracing::info!(job_id = self.job_id, "application submitted");
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, job_id = self.job_id, "application failed");
                let message = error.message_for(&APPLY_ERROR_FIELDS, APPLY_FAILED);
                lock(&self.view).apply_error = Some(message.clone());
                Err(PageError::Failed(message))
            }
        }
    }
}

fn validate(cover_letter: &str, bid: &str) -> Result<NewApplication, PageError> {
    if cover_letter.trim().is_empty() {
        return Err(PageError::Validation("Cover letter is required.".to_owned()));
    }
    let bid = bid.trim();
    let bid_amount = if bid.is_empty() {
        None
    } else {
        match bid.parse::<f64>() {
            Ok(amount) if amount.is_finite() && amount > 0.0 => Some(amount),
            _ => return Err(PageError::Validation("Bid amount must be a positive number.".to_owned())),
        }
    };
    Ok(NewApplication { cover_letter: cover_letter.to_owned(), bid_amount })
}
