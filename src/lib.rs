//! Client library for the FreelanceHub marketplace API.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend authenticates with a session cookie and rejects unsafe
//! requests that lack a matching anti-forgery header. This crate keeps both
//! cookies in an injected [`net::credentials::CredentialSource`], resolves the
//! signed-in identity once per [`app::App`], and drives headless page
//! controllers that decide what each page shows from that single identity.
//!
//! ARCHITECTURE
//! ============
//! - `net`: credentials, HTTP adapter, error classification, wire types, API.
//! - `state`: session store, auth gate, stale-response tracker.
//! - `pages`: one controller per page.
//! - `app`: the context object handed to every controller.

pub mod app;
pub mod config;
pub mod net;
pub mod pages;
pub mod state;

pub use app::App;
pub use config::{ClientConfig, ConfigError};
pub use net::error::ApiError;

#[cfg(test)]
#[path = "backend_stub_test.rs"]
pub(crate) mod backend_stub;
