//! Error types for the collection library.

use thiserror::Error;

/// Result type alias for collection operations.
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Errors that can occur while collecting content.
///
/// Most variants describe degraded conditions that the collector absorbs
/// internally (a skipped source, an evicted proxy, a retried request). Only
/// `InvalidConfig` is expected to reach the caller of a collection run.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse a response body or markup.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A proxy-list provider or search backend was unreachable or
    /// returned garbage.
    #[error("Source '{provider}' unavailable: {reason}")]
    SourceUnavailable { provider: String, reason: String },

    /// A request failed because of the assigned proxy, not the target.
    #[error("Proxy failure: {0}")]
    ProxyFailure(String),

    /// Target responded with 429.
    #[error("Rate limited by target")]
    RateLimited,

    /// All retry attempts for a fetch were consumed.
    #[error("Retries exhausted for {0}")]
    RetriesExhausted(String),

    /// Misconfiguration detected at startup.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Filesystem error while persisting state.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_parse() {
        let err = HarvestError::Parse("bad markup".to_string());
        assert_eq!(err.to_string(), "Failed to parse response: bad markup");
    }

    #[test]
    fn test_error_display_source_unavailable() {
        let err = HarvestError::SourceUnavailable {
            provider: "proxyscrape".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "Source 'proxyscrape' unavailable: timeout");
    }

    // The provider name must not be wired into thiserror's causal chain;
    // a plain String field can never satisfy it.
    #[test]
    fn test_source_unavailable_has_no_cause() {
        use std::error::Error;
        let err = HarvestError::SourceUnavailable {
            provider: "free-proxy-list".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(err.source().is_none());
    }

    #[test]
    fn test_error_display_proxy_failure() {
        let err = HarvestError::ProxyFailure("connection refused".to_string());
        assert_eq!(err.to_string(), "Proxy failure: connection refused");
    }

    #[test]
    fn test_error_display_rate_limited() {
        let err = HarvestError::RateLimited;
        assert_eq!(err.to_string(), "Rate limited by target");
    }

    #[test]
    fn test_error_display_retries_exhausted() {
        let err = HarvestError::RetriesExhausted("https://example.com".to_string());
        assert_eq!(err.to_string(), "Retries exhausted for https://example.com");
    }

    #[test]
    fn test_error_display_invalid_config() {
        let err = HarvestError::InvalidConfig("concurrency must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: concurrency must be > 0"
        );
    }

    #[test]
    fn test_error_debug() {
        let err = HarvestError::RateLimited;
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("RateLimited"));
    }
}
