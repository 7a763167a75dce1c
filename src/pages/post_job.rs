//! Job posting form (clients only).

#[cfg(test)]
#[path = "post_job_test.rs"]
mod post_job_test;

use super::{Gated, PageError, require};
use crate::app::App;
use crate::net::types::{Category, ExperienceLevel, Job, NewJob};
use crate::state::gate::{Access, Action, denial_message};

pub const POST_JOB_FAILED: &str = "Failed to post job. Please check all fields and try again.";
pub const POST_JOB_SUCCEEDED: &str = "Job posted successfully!";

const POST_JOB_ERROR_FIELDS: [&str; 4] = ["title", "description", "category", "experience_level"];

/// Raw form input. Budget and deadline are free text; empty means unset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobForm {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub experience_level: ExperienceLevel,
    pub is_fixed_price: bool,
    pub budget: String,
    /// `YYYY-MM-DD`.
    pub deadline: String,
}

impl Default for JobForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: Category::WebDevelopment,
            experience_level: ExperienceLevel::Entry,
            is_fixed_price: true,
            budget: String::new(),
            deadline: String::new(),
        }
    }
}

impl JobForm {
    /// Convert to the request body.
    ///
    /// # Errors
    ///
    /// [`PageError::Validation`] for missing required text or an
    /// unparseable budget or deadline.
    pub fn to_request(&self) -> Result<NewJob, PageError> {
        if self.title.trim().is_empty() {
            return Err(PageError::Validation("Job title is required.".to_owned()));
        }
        if self.description.trim().is_empty() {
            return Err(PageError::Validation("Description is required.".to_owned()));
        }
        let budget = match self.budget.trim() {
            "" => None,
            raw => match raw.parse::<f64>() {
                Ok(amount) if amount.is_finite() && amount >= 0.0 => Some(amount),
                _ => return Err(PageError::Validation("Budget must be a non-negative number.".to_owned())),
            },
        };
        let deadline = match self.deadline.trim() {
            "" => None,
            raw if is_iso_date(raw) => Some(raw.to_owned()),
            _ => return Err(PageError::Validation("Deadline must be a date like 2026-12-31.".to_owned())),
        };
        Ok(NewJob {
            title: self.title.trim().to_owned(),
            description: self.description.trim().to_owned(),
            category: self.category,
            experience_level: self.experience_level,
            is_fixed_price: self.is_fixed_price,
            budget,
            deadline,
        })
    }
}

fn is_iso_date(raw: &str) -> bool {
    let parts: Vec<&str> = raw.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return false;
    };
    let digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    if !(digits(year, 4) && digits(month, 2) && digits(day, 2)) {
        return false;
    }
    matches!(month.parse::<u8>(), Ok(1..=12)) && matches!(day.parse::<u8>(), Ok(1..=31))
}

pub struct PostJob {
    app: App,
}

impl PostJob {
    #[must_use]
    pub fn new(app: &App) -> Self {
        Self { app: app.clone() }
    }

    /// What the page shows right now, without waiting.
    #[must_use]
    pub fn access(&self) -> Gated<()> {
        match self.app.gate().can(Action::PostJob) {
            Access::Unknown => Gated::Loading,
            Access::Deny => Gated::Denied(denial_message(Action::PostJob)),
            Access::Allow => Gated::Ready(()),
        }
    }

    /// Post the job.
    ///
    /// # Errors
    ///
    /// `Denied` unless signed in as a client, `Validation` for bad input,
    /// `Failed` with the first backend field message otherwise.
    pub async fn submit(&self, form: &JobForm) -> Result<Job, PageError> {
        require(&self.app, Action::PostJob).await?;
        let request = form.to_request()?;
        match self.app.api().create_job(&request).await {
            Ok(job) => {
                tracing::info!(job_id = job.id, "job posted");
                Ok(job)
            }
            Err(error) => {
                tracing::warn!(%error, "job post failed");
                Err(PageError::Failed(error.message_for(&POST_JOB_ERROR_FIELDS, POST_JOB_FAILED)))
            }
        }
    }
}
