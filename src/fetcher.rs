use crate::ResolveError;
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turns non-2xx responses into `HttpStatus` errors.
    pub fn error_for_status(self) -> Result<Self, ResolveError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ResolveError::HttpStatus {
                status: self.status,
                url: self.url,
            })
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ResolveError> {
        serde_json::from_slice(&self.body).map_err(|e| ResolveError::DecodeError(e.to_string()))
    }
}

/// Outbound HTTP used by every metadata source and the asset inliner.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, ResolveError>;
}

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        debug!("Fetcher initialized with default configuration");
        Self::new_with_config(FetcherConfig::default()).unwrap_or_else(|e| {
            error!(error = %e, "Failed to create configured HTTP client, using defaults");
            Self {
                client: Client::new(),
            }
        })
    }

    /// Creates a Fetcher with custom configuration
    pub fn new_with_config(config: FetcherConfig) -> Result<Self, ResolveError> {
        let mut client_builder = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .pool_max_idle_per_host(10);

        if let Some(headers) = config.headers {
            client_builder = client_builder.default_headers(headers);
        }

        if let Some(redirect_policy) = config.redirect_policy {
            client_builder = client_builder.redirect(redirect_policy);
        }

        let client = client_builder.build().map_err(|e| {
            error!(error = %e, "Failed to create HTTP client");
            ResolveError::FetchError(format!("Failed to initialize HTTP client: {e}"))
        })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for Fetcher {
    #[instrument(level = "debug", skip(self), err)]
    async fn get(&self, url: &str) -> Result<HttpResponse, ResolveError> {
        debug!(url = %url, "Starting fetch request");

        let response = self.client.get(url).send().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to send request");
            if e.is_timeout() {
                ResolveError::TimeoutError(e.to_string())
            } else {
                ResolveError::FetchError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response.bytes().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to read response body");
            ResolveError::FetchError(e.to_string())
        })?;

        debug!(url = %url, status, content_length = body.len(), "Fetch complete");
        Ok(HttpResponse {
            url: url.to_string(),
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

/// HTTP client options for [`Fetcher::new_with_config`].
///
/// # Examples
/// ```ignore
/// let fetcher = Fetcher::new_with_config(FetcherConfig {
///     user_agent: "my-agent/1.0".to_string(),
///     timeout: Duration::from_secs(20),
///     ..FetcherConfig::default()
/// })?;
/// ```
pub struct FetcherConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub headers: Option<HeaderMap>,
    pub redirect_policy: Option<reqwest::redirect::Policy>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("link-card/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(10),
            headers: None,
            redirect_policy: Some(reqwest::redirect::Policy::limited(10)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            url: "https://api.example/x".into(),
            status,
            content_type: Some("application/json".into()),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_error_for_status() {
        assert!(response(200, "{}").error_for_status().is_ok());
        match response(503, "").error_for_status() {
            Err(ResolveError::HttpStatus { status, url }) => {
                assert_eq!(status, 503);
                assert_eq!(url, "https://api.example/x");
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[test]
    fn test_json_decode_error() {
        let result: Result<serde_json::Value, _> = response(200, "<html>").json();
        assert!(matches!(result, Err(ResolveError::DecodeError(_))));
    }
}
