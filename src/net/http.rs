//! HTTP client adapter.
//!
//! ARCHITECTURE
//! ============
//! Every request gets the session cookie from the injected
//! [`CredentialSource`]. Mutating requests additionally carry the
//! anti-forgery header, read fresh at call time and omitted entirely when no
//! token exists. Responses are classified into success values or
//! [`ApiError`]; nothing is retried here.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{COOKIE, HeaderName, HeaderValue, REFERER, SET_COOKIE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use super::credentials::CredentialSource;
use super::error::{ApiError, ErrorBody};
use crate::config::ClientConfig;

// =============================================================================
// REQUEST DESCRIPTOR
// =============================================================================

/// Method, path, query and body of one API call.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path relative to the API base, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] if `body` cannot be serialized.
    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Everything except read-only fetches needs the anti-forgery header.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        !matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    csrf_header: HeaderName,
    credentials: Arc<dyn CredentialSource>,
}

impl HttpClient {
    /// Build the adapter from config and an injected credential source.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name is invalid or the HTTP client
    /// fails to build.
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialSource>) -> Result<Self, ApiError> {
        let csrf_header = HeaderName::from_bytes(config.csrf_header.as_bytes())
            .map_err(|e| ApiError::Client(format!("invalid anti-forgery header name: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), csrf_header, credentials })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialSource> {
        &self.credentials
    }

    /// Send a request and decode the success body into `T`.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::send`]; additionally [`ApiError::Decode`] when the
    /// body does not match `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &RequestDescriptor) -> Result<T, ApiError> {
        let value = self.send(request).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send a request and return the raw JSON success body (`Null` if empty).
    ///
    /// # Errors
    ///
    /// [`ApiError::Network`] when no response arrives, [`ApiError::Http`] for
    /// any non-2xx status, [`ApiError::Decode`] for a non-JSON 2xx body.
    pub async fn send(&self, request: &RequestDescriptor) -> Result<Value, ApiError> {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "api_request",
            %request_id,
            method = %request.method,
            path = %request.path,
        );
        self.send_inner(request).instrument(span).await
    }

    async fn send_inner(&self, request: &RequestDescriptor) -> Result<Value, ApiError> {
        let built = self.build(request)?;
        let response = self.http.execute(built).await.map_err(|e| {
            tracing::debug!(error = %e, "request failed before a response arrived");
            ApiError::Network(e.to_string())
        })?;

        for raw in response.headers().get_all(SET_COOKIE) {
            match raw.to_str() {
                Ok(text) => self.credentials.absorb_set_cookie(text),
                Err(_) => tracing::debug!("ignoring non-ascii set-cookie header"),
            }
        }

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| ApiError::Network(e.to_string()))?;
        tracing::debug!(status, "response received");

        if !(200..300).contains(&status) {
            return Err(ApiError::Http { status, body: ErrorBody::parse(&text) });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Assemble the outgoing request, attaching credentials.
    pub(crate) fn build(&self, request: &RequestDescriptor) -> Result<reqwest::Request, ApiError> {
        let url = reqwest::Url::parse(&format!("{}{}", self.base_url, request.path))
            .map_err(|e| ApiError::InvalidUrl(format!("{}{}: {e}", self.base_url, request.path)))?;

        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(cookies) = self.credentials.cookie_header() {
            match HeaderValue::from_str(&cookies) {
                Ok(value) => builder = builder.header(COOKIE, value),
                Err(_) => tracing::warn!("stored cookies are not a valid header value; sending none"),
            }
        }
        if request.is_mutating() {
            builder = self.attach_anti_forgery(builder);
        }

        builder.build().map_err(|e| ApiError::Client(e.to_string()))
    }

    fn attach_anti_forgery(&self, mut builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = self.credentials.anti_forgery_token() {
            match HeaderValue::from_str(&token) {
                Ok(value) => builder = builder.header(self.csrf_header.clone(), value),
                Err(_) => tracing::warn!("anti-forgery token is not a valid header value; omitting it"),
            }
        }
        // HTTPS anti-forgery checks reject unsafe requests without a referer.
        if let Ok(referer) = HeaderValue::from_str(&format!("{}/", self.base_url)) {
            builder = builder.header(REFERER, referer);
        }
        builder
    }
}
