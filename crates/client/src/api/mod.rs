//! Foody backend REST client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`; every response is wrapped in an
//!   envelope `{ "success": bool, "message": string, "data": ... }`
//! - The bearer token lives in a shared [`Credentials`] cell and is attached
//!   to every request while present. No token means guest mode, not an error
//! - The backend is the source of truth for pricing, orders and auth; this
//!   client holds no business rules beyond request shaping
//!
//! # Endpoints
//!
//! - `/api/cart` - cart lines ([`cart`])
//! - `/api/resto` - restaurant listing, search and detail ([`restaurants`])
//! - `/api/order` - checkout and order history ([`orders`])
//! - `/api/auth` - login, registration, profile ([`auth`])
//! - `/api/review` - reviews ([`reviews`])
//!
//! # Example
//!
//! ```rust,ignore
//! use foody_client::api::{ApiClient, Credentials};
//!
//! let client = ApiClient::new(&config, Credentials::default())?;
//! let page = client.restaurants(&RestaurantQuery::default()).await?;
//! ```

pub mod auth;
pub mod cart;
pub mod orders;
pub mod restaurants;
pub mod reviews;

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::config::ClientConfig;

/// Body message the backend sends when a protected route is called without
/// a token.
const ACCESS_TOKEN_REQUIRED: &str = "Access token required";

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request needs a logged-in user.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Backend answered with an error status or `success: false`.
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, if any.
        message: String,
    },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The envelope had no `data` where data was required.
    #[error("Missing response data: {0}")]
    MissingData(&'static str),
}

impl ApiError {
    /// Returns true if the view should show a "please log in" affordance.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        match self {
            Self::Unauthorized(_) => true,
            Self::Status { status, message } => {
                *status == StatusCode::UNAUTHORIZED.as_u16() || message == ACCESS_TOKEN_REQUIRED
            }
            _ => false,
        }
    }

    /// Message to show the user: the server's own message when it sent
    /// one, otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Unauthorized(message) | Self::Status { message, .. } if !message.is_empty() => {
                message.clone()
            }
            _ => fallback.to_string(),
        }
    }

    /// Returns true for failures on the server or transport side, which are
    /// worth reporting to error tracking.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) | Self::MissingData(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Standard response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

const fn default_success() -> bool {
    true
}

impl<T> Envelope<T> {
    /// The payload, or [`ApiError::MissingData`].
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope carried no data.
    pub fn into_data(self, what: &'static str) -> Result<T, ApiError> {
        self.data.ok_or(ApiError::MissingData(what))
    }
}

/// Shape of an error body; only the message is interesting.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Shared bearer token cell.
///
/// Cloning shares the cell, so the auth session and the API client see the
/// same token. `Debug` redacts the token.
#[derive(Clone, Default)]
pub struct Credentials {
    token: Arc<RwLock<Option<SecretString>>>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.is_present().then_some("[REDACTED]"))
            .finish()
    }
}

impl Credentials {
    /// Credentials holding a token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let credentials = Self::default();
        credentials.set(token);
        credentials
    }

    /// Store a token.
    pub fn set(&self, token: impl Into<String>) {
        let mut slot = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(SecretString::from(token.into()));
    }

    /// Forget the token.
    pub fn clear(&self) {
        let mut slot = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Returns true if a token is present.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|token| token.expose_secret().to_string())
    }
}

/// Client for the Foody backend.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("credentials", &self.inner.credentials)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, credentials: Credentials) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
                credentials,
            }),
        })
    }

    /// The shared credentials cell.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    /// Returns true if requests will carry a bearer token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.credentials.is_present()
    }

    /// Absolute URL for an API path with optional query parameters.
    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{path}", self.inner.base_url))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match self.inner.credentials.bearer() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and unwrap the response envelope.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Envelope<T>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_default();

            if status == StatusCode::UNAUTHORIZED || message == ACCESS_TOKEN_REQUIRED {
                debug!(status = %status, "Backend requires login");
                return Err(ApiError::Unauthorized(message));
            }

            if status.is_server_error() {
                error!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Backend returned server error"
                );
            }

            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse backend response"
                );
                return Err(ApiError::Parse(e));
            }
        };

        if !envelope.success {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: envelope.message,
            });
        }

        Ok(envelope)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope<T>, ApiError> {
        let url = self.url(path, query)?;
        self.send(self.request(Method::GET, url)).await
    }

    async fn post<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope<T>, ApiError> {
        let url = self.url(path, &[])?;
        self.send(self.request(Method::POST, url).json(body)).await
    }

    async fn put<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope<T>, ApiError> {
        let url = self.url(path, &[])?;
        self.send(self.request(Method::PUT, url).json(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ApiError> {
        let url = self.url(path, &[])?;
        self.send(self.request(Method::DELETE, url)).await
    }
}

/// Page metadata returned by list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

impl Pagination {
    /// Next page to request for an infinite list, if any.
    ///
    /// Uses `page`/`totalPages` when the server sent them; otherwise assumes
    /// more pages exist while the last page came back full.
    #[must_use]
    pub fn next_page(
        pagination: Option<&Self>,
        pages_loaded: u32,
        last_page_len: usize,
        limit: u32,
    ) -> Option<u32> {
        if let Some(Self {
            page: Some(page),
            total_pages: Some(total_pages),
            ..
        }) = pagination
            && *page > 0
            && *total_pages > 0
        {
            return (page < total_pages).then(|| page + 1);
        }

        let full = usize::try_from(limit).is_ok_and(|limit| last_page_len >= limit);
        full.then(|| pages_loaded + 1)
    }
}
