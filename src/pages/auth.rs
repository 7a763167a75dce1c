//! Register, login and logout flows.
//!
//! Success installs the returned identity in the session store directly; no
//! follow-up `current` request is made. Logout always ends anonymous.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use super::PageError;
use crate::app::App;
use crate::net::types::{Identity, LoginRequest, RegisterRequest, Role};

pub const REGISTER_FAILED: &str = "Registration failed";
pub const LOGIN_FAILED: &str = "Login failed";

const REGISTER_ERROR_FIELDS: [&str; 3] = ["username", "email", "password"];
const LOGIN_ERROR_FIELDS: [&str; 2] = ["username", "password"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            password: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::Freelancer,
        }
    }
}

impl RegisterForm {
    fn to_request(&self) -> Result<RegisterRequest, PageError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(PageError::Validation("Username and password are required.".to_owned()));
        }
        let email = self.email.trim();
        if !email.contains('@') {
            return Err(PageError::Validation("Enter a valid email address.".to_owned()));
        }
        Ok(RegisterRequest {
            username: self.username.trim().to_owned(),
            email: email.to_owned(),
            password: self.password.clone(),
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            user_type: self.role,
        })
    }
}

/// Create an account. The new user becomes the local identity right away,
/// but the backend opens no session until a login.
///
/// # Errors
///
/// `Validation` for missing input, otherwise `Failed` with the first of the
/// username, email and password messages, then the generic keys, then
/// "Registration failed".
pub async fn register(app: &App, form: &RegisterForm) -> Result<Identity, PageError> {
    let request = form.to_request()?;
    match app.api().register(&request).await {
        Ok(response) => {
            app.session().set_identity(response.user.clone());
            Ok(response.user)
        }
        Err(error) => {
            tracing::warn!(%error, username = %request.username, "registration failed");
            Err(PageError::Failed(error.message_for(&REGISTER_ERROR_FIELDS, REGISTER_FAILED)))
        }
    }
}

/// # Errors
///
/// `Validation` for blank input, otherwise `Failed` with the first of the
/// username and password messages, then the generic keys, then "Login
/// failed".
pub async fn login(app: &App, username: &str, password: &str) -> Result<Identity, PageError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(PageError::Validation("Username and password are required.".to_owned()));
    }
    let request = LoginRequest { username: username.trim().to_owned(), password: password.to_owned() };
    match app.api().login(&request).await {
        Ok(response) => {
            app.session().set_identity(response.user.clone());
            Ok(response.user)
        }
        Err(error) => {
            tracing::warn!(%error, username = %request.username, "login failed");
            Err(PageError::Failed(error.message_for(&LOGIN_ERROR_FIELDS, LOGIN_FAILED)))
        }
    }
}

pub async fn logout(app: &App) {
    app.session().logout().await;
}
