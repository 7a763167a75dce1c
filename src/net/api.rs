//! Typed bindings for the marketplace REST API.
//!
//! One method per backend operation. Paths are relative to the configured API
//! base and keep the backend's trailing slashes. Every method returns the
//! adapter's [`ApiError`] untouched so callers pick their own messages.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use super::error::ApiError;
use super::http::{HttpClient, RequestDescriptor};
use super::types::{
    AuthResponse, Category, Decision, Identity, Job, JobApplication, LoginRequest, NewApplication, NewJob,
    ProfileUpdate, RegisterRequest, StatusUpdate, SubmittedApplication,
};

pub(crate) const REGISTER_PATH: &str = "/auth/register/";
pub(crate) const LOGIN_PATH: &str = "/auth/login/";
pub(crate) const LOGOUT_PATH: &str = "/auth/logout/";
pub(crate) const CURRENT_PATH: &str = "/auth/current/";
pub(crate) const PROFILE_PATH: &str = "/auth/profile/";
pub(crate) const JOBS_PATH: &str = "/jobs/";
pub(crate) const CREATE_JOB_PATH: &str = "/jobs/create/";
pub(crate) const MY_JOBS_PATH: &str = "/jobs/my-jobs/";
pub(crate) const MY_APPLICATIONS_PATH: &str = "/jobs/my-applications/";

pub(crate) fn job_endpoint(job_id: u64) -> String {
    format!("/jobs/{job_id}/")
}

pub(crate) fn apply_endpoint(job_id: u64) -> String {
    format!("/jobs/{job_id}/apply/")
}

pub(crate) fn job_applications_endpoint(job_id: u64) -> String {
    format!("/jobs/{job_id}/applications/")
}

pub(crate) fn application_status_endpoint(application_id: u64) -> String {
    format!("/jobs/applications/{application_id}/status/")
}

/// `GET /jobs/` with the category filter. `None` means all categories and
/// sends no query at all.
pub(crate) fn list_jobs_request(category: Option<Category>) -> RequestDescriptor {
    let request = RequestDescriptor::get(JOBS_PATH);
    match category {
        Some(category) => request.with_query("category", category.slug()),
        None => request,
    }
}

/// Cheap to clone; all clones share one adapter and credential source.
#[derive(Clone)]
pub struct Api {
    http: Arc<HttpClient>,
}

impl Api {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    /// `POST /auth/register/`. Creates the account only: the response sets no
    /// session cookie, so a later run needs [`Api::login`].
    ///
    /// # Errors
    ///
    /// Any adapter failure; validation errors arrive as `Http` 400 with
    /// per-field lists.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let req = RequestDescriptor::post(REGISTER_PATH).with_json(request)?;
        self.http.send_json(&req).await
    }

    /// `POST /auth/login/`.
    ///
    /// # Errors
    ///
    /// Any adapter failure; bad credentials arrive as `Http` 401.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let req = RequestDescriptor::post(LOGIN_PATH).with_json(request)?;
        self.http.send_json(&req).await
    }

    /// `POST /auth/logout/`. Only the remote half; local state is the
    /// session store's job.
    ///
    /// # Errors
    ///
    /// Any adapter failure.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.http.send(&RequestDescriptor::post(LOGOUT_PATH)).await.map(drop)
    }

    /// `GET /auth/current/`.
    ///
    /// # Errors
    ///
    /// `Http` 401/403 when the session cookie is missing or stale.
    pub async fn current_identity(&self) -> Result<Identity, ApiError> {
        self.http.send_json(&RequestDescriptor::get(CURRENT_PATH)).await
    }

    /// `PUT /auth/profile/`; returns the updated identity.
    ///
    /// # Errors
    ///
    /// Any adapter failure.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity, ApiError> {
        let req = RequestDescriptor::put(PROFILE_PATH).with_json(update)?;
        self.http.send_json(&req).await
    }

    /// Fetch `path` purely for its `Set-Cookie` side effect.
    ///
    /// # Errors
    ///
    /// Any adapter failure.
    pub async fn prime_anti_forgery(&self, path: &str) -> Result<(), ApiError> {
        self.http.send(&RequestDescriptor::get(path)).await.map(drop)
    }

    // =========================================================================
    // JOBS
    // =========================================================================

    /// `GET /jobs/`, newest first.
    ///
    /// # Errors
    ///
    /// Any adapter failure.
    pub async fn list_jobs(&self, category: Option<Category>) -> Result<Vec<Job>, ApiError> {
        self.http.send_json(&list_jobs_request(category)).await
    }

    /// `GET /jobs/{id}/`.
    ///
    /// # Errors
    ///
    /// `Http` 404 for an unknown or inactive job.
    pub async fn job(&self, job_id: u64) -> Result<Job, ApiError> {
        self.http.send_json(&RequestDescriptor::get(job_endpoint(job_id))).await
    }

    /// `POST /jobs/create/` (clients only).
    ///
    /// # Errors
    ///
    /// Any adapter failure.
    pub async fn create_job(&self, job: &NewJob) -> Result<Job, ApiError> {
        let req = RequestDescriptor::post(CREATE_JOB_PATH).with_json(job)?;
        self.http.send_json(&req).await
    }

    /// `GET /jobs/my-jobs/` (clients only).
    ///
    /// # Errors
    ///
    /// Any adapter failure.
    pub async fn my_jobs(&self) -> Result<Vec<Job>, ApiError> {
        self.http.send_json(&RequestDescriptor::get(MY_JOBS_PATH)).await
    }

    // =========================================================================
    // APPLICATIONS
    // =========================================================================

    /// `GET /jobs/my-applications/` (freelancers only).
    ///
    /// # Errors
    ///
    /// Any adapter failure.
    pub async fn my_applications(&self) -> Result<Vec<JobApplication>, ApiError> {
        self.http.send_json(&RequestDescriptor::get(MY_APPLICATIONS_PATH)).await
    }

    /// `POST /jobs/{id}/apply/` (freelancers only).
    ///
    /// # Errors
    ///
    /// Any adapter failure; a duplicate application is `Http` 400 with an
    /// `error` key.
    pub async fn apply(&self, job_id: u64, application: &NewApplication) -> Result<SubmittedApplication, ApiError> {
        let req = RequestDescriptor::post(apply_endpoint(job_id)).with_json(application)?;
        self.http.send_json(&req).await
    }

    /// `GET /jobs/{id}/applications/` (job owner only).
    ///
    /// # Errors
    ///
    /// Any adapter failure.
    pub async fn job_applications(&self, job_id: u64) -> Result<Vec<JobApplication>, ApiError> {
        self.http
            .send_json(&RequestDescriptor::get(job_applications_endpoint(job_id)))
            .await
    }

    /// `PUT /jobs/applications/{id}/status/` (job owner only).
    ///
    /// # Errors
    ///
    /// Any adapter failure.
    pub async fn update_application_status(
        &self,
        application_id: u64,
        decision: Decision,
    ) -> Result<JobApplication, ApiError> {
        let req = RequestDescriptor::put(application_status_endpoint(application_id))
            .with_json(&StatusUpdate { status: decision })?;
        self.http.send_json(&req).await
    }
}
