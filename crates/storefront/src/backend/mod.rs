//! Backend-as-a-service clients.
//!
//! # Architecture
//!
//! The backend exposes two REST surfaces that share one base URL and one
//! public (anon) API key:
//!
//! - `/auth/v1/*` - identity provider (password sign-in, sign-up, refresh,
//!   sign-out), see [`GoTrueProvider`]
//! - `/rest/v1/*` - row storage, one `carts` and one `wishlists` row per
//!   user, see [`RestRecords`]
//!
//! Both go through [`BackendClient`], which owns the `reqwest` client and
//! maps HTTP failures to [`BackendError`]. In-memory stand-ins
//! ([`MemoryRecords`], [`crate::identity::MemoryIdentityProvider`]) implement
//! the same traits for demo mode and tests.

mod gotrue;
mod memory;
mod records;

pub use gotrue::GoTrueProvider;
pub use memory::MemoryRecords;
pub use records::{RemoteRecords, RestRecords};

use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Endpoint URL could not be built.
    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    /// The in-memory stand-in was told to fail.
    #[error("simulated backend failure: {0}")]
    Simulated(String),
}

impl BackendError {
    /// Message suitable for showing to a shopper.
    ///
    /// Provider messages ("Invalid login credentials") pass through; transport
    /// details do not.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } if !message.is_empty() => message.clone(),
            Self::RateLimited(secs) => {
                format!("Too many attempts. Please try again in {secs} seconds.")
            }
            Self::Simulated(message) => message.clone(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }

    /// Whether the backend reported a missing resource.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

/// Error body shapes returned by the auth and REST surfaces.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

/// Shared HTTP client for both backend surfaces.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

impl BackendClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.url.clone(),
                anon_key: config.anon_key.clone(),
            }),
        })
    }

    /// Build an endpoint URL below the base URL with query parameters.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Url` if `path` cannot be joined.
    pub fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, BackendError> {
        let mut url = self.inner.base_url.join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Start a request with the API key attached.
    #[must_use]
    pub fn request(&self, method: reqwest::Method, url: Url) -> RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header("apikey", self.inner.anon_key.expose_secret())
    }

    /// Send a request and return the body of a successful response.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::RateLimited` on 429, `BackendError::Api` on any
    /// other non-success status, `BackendError::Http` on transport failure.
    pub async fn send(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(api_error(status, &body));
        }

        Ok(body)
    }

    /// Send a request and parse the JSON body.
    ///
    /// # Errors
    ///
    /// As [`Self::send`], plus `BackendError::Parse` for unexpected bodies.
    pub async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }
}

fn api_error(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    BackendError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client() -> BackendClient {
        BackendClient::new(&BackendConfig {
            url: Url::parse("https://demo.backend.example/").unwrap(),
            anon_key: SecretString::from("anon-key-value"),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_api_error_prefers_error_description() {
        let err = api_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(err.user_message(), "Invalid login credentials");
    }

    #[test]
    fn test_api_error_reads_msg_field() {
        let err = api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"code":422,"msg":"User already registered"}"#,
        );
        assert!(matches!(err, BackendError::Api { status: 422, .. }));
        assert_eq!(err.user_message(), "User already registered");
    }

    #[test]
    fn test_api_error_falls_back_to_reason() {
        let err = api_error(StatusCode::NOT_FOUND, "<html>nope</html>");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "backend returned 404: Not Found");
    }

    #[test]
    fn test_user_message_hides_transport_details() {
        let err = BackendError::Url(url::ParseError::EmptyHost);
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
        assert!(BackendError::RateLimited(3).user_message().contains("3 seconds"));
    }

    #[test]
    fn test_endpoint_builds_query() {
        let url = client()
            .endpoint("rest/v1/carts", &[("select", "items"), ("user_id", "eq.u 1")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://demo.backend.example/rest/v1/carts?select=items&user_id=eq.u+1"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", client());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("anon-key-value"));
    }
}
