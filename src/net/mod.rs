//! Networking: credentials, the HTTP adapter, wire types and API bindings.

pub mod api;
pub mod credentials;
pub mod error;
pub mod http;
pub mod types;
