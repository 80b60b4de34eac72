use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Rate limit exceeded, retry in {}ms", .retry_after.as_millis())]
    RateLimited { retry_after: Duration },

    #[error("Source {source_name} failed: {message}")]
    SourceFailed {
        source_name: String,
        message: String,
    },

    #[error("All metadata sources failed")]
    AllSourcesFailed,

    #[error("Failed to inline asset: {0}")]
    AssetFetchFailed(String),

    #[error("Failed to export card: {0}")]
    ExportFailed(String),

    #[error("Failed to parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Failed to fetch content: {0}")]
    FetchError(String),

    #[error("Request timeout: {0}")]
    TimeoutError(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to decode response: {0}")]
    DecodeError(String),
}

impl ResolveError {
    pub fn source_failed(source_name: &str, cause: &ResolveError) -> Self {
        ResolveError::SourceFailed {
            source_name: source_name.to_string(),
            message: cause.to_string(),
        }
    }

    pub fn log(&self) {
        match self {
            ResolveError::InvalidUrl(e) => {
                warn!(error = %e, "Rejected invalid URL");
            }
            ResolveError::RateLimited { retry_after } => {
                warn!(retry_after_ms = retry_after.as_millis() as u64, "Rate limit exceeded");
            }
            ResolveError::SourceFailed {
                source_name,
                message,
            } => {
                warn!(source = %source_name, error = %message, "Metadata source failed, falling through");
            }
            ResolveError::AllSourcesFailed => {
                error!("Every metadata source failed");
            }
            ResolveError::AssetFetchFailed(e) => {
                warn!(error = %e, "Asset inlining failed, degrading");
            }
            ResolveError::ExportFailed(e) => {
                error!(error = %e, "Card export failed");
            }
            ResolveError::UrlParseError(e) => {
                warn!(error = %e, "URL parsing failed");
            }
            ResolveError::FetchError(e) => {
                error!(error = %e, "Content fetch failed");
            }
            ResolveError::TimeoutError(e) => {
                warn!(error = %e, "Request timed out");
            }
            ResolveError::HttpStatus { status, url } => {
                warn!(status = *status, url = %url, "Unexpected HTTP status");
            }
            ResolveError::DecodeError(e) => {
                error!(error = %e, "Response decoding failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_message_carries_wait() {
        let err = ResolveError::RateLimited {
            retry_after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "Rate limit exceeded, retry in 1500ms");
    }

    #[test]
    fn test_source_failed_wraps_cause() {
        let cause = ResolveError::HttpStatus {
            status: 502,
            url: "https://api.example/".into(),
        };
        let err = ResolveError::source_failed("primary", &cause);
        assert_eq!(
            err.to_string(),
            "Source primary failed: HTTP 502 from https://api.example/"
        );
    }
}
