//! Public job listing with a category filter.
//!
//! Switching the filter while a fetch is in flight supersedes it: only the
//! response for the most recent selection is applied.

#[cfg(test)]
#[path = "job_list_test.rs"]
mod job_list_test;

use std::sync::Mutex;

use super::{PageError, lock};
use crate::app::App;
use crate::net::api::Api;
use crate::net::types::{Category, Job};
use crate::state::latest::Latest;

pub const FETCH_JOBS_FAILED: &str = "Failed to fetch jobs";

/// Value of the filter control meaning "no filter".
pub const ALL_CATEGORIES: &str = "all";

/// `(value, label)` pairs for the filter control, "all" first.
#[must_use]
pub fn filter_options() -> Vec<(&'static str, &'static str)> {
    let mut options = vec![(ALL_CATEGORIES, "All Categories")];
    options.extend(Category::ALL.iter().map(|category| (category.slug(), category.label())));
    options
}

/// Parse a filter control value. `all` (or empty) means no filter.
///
/// # Errors
///
/// [`PageError::Validation`] for an unknown slug.
pub fn parse_filter(raw: &str) -> Result<Option<Category>, PageError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == ALL_CATEGORIES {
        return Ok(None);
    }
    Category::from_slug(raw)
        .map(Some)
        .ok_or_else(|| PageError::Validation(format!("Unknown category: {raw}")))
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobListView {
    pub filter: Option<Category>,
    pub loading: bool,
    pub jobs: Vec<Job>,
    pub error: Option<String>,
}

pub struct JobList {
    api: Api,
    latest: Latest,
    view: Mutex<JobListView>,
}

impl JobList {
    #[must_use]
    pub fn new(app: &App) -> Self {
        Self { api: app.api().clone(), latest: Latest::new(), view: Mutex::new(JobListView::default()) }
    }

    #[must_use]
    pub fn view(&self) -> JobListView {
        lock(&self.view).clone()
    }

    /// Leave the page: responses still in flight will be dropped.
    pub fn close(&self) {
        self.latest.invalidate();
    }

    /// Refetch with the current filter.
    pub async fn load(&self) {
        let filter = lock(&self.view).filter;
        self.select(filter).await;
    }

    /// Change the filter and fetch. A response that arrives after a newer
    /// selection is dropped.
    pub async fn select(&self, filter: Option<Category>) {
        let ticket = {
            let mut view = lock(&self.view);
            view.filter = filter;
            view.loading = true;
            self.latest.issue()
        };

        let result = self.api.list_jobs(filter).await;
        if !ticket.is_current() {
            tracing::debug!(generation = ticket.generation(), "discarding superseded job list response");
            return;
        }

        let mut view = lock(&self.view);
        view.loading = false;
        match result {
            Ok(jobs) => {
                view.jobs = jobs;
                view.error = None;
            }
            Err(error) => {
                tracing::warn!(%error, "job list fetch failed");
                view.error = Some(FETCH_JOBS_FAILED.to_owned());
            }
        }
    }
}
