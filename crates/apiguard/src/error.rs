//! Error types for apiguard
//!
//! The application-facing error wraps the core [`Failure`] so callers keep
//! full access to the classified failure, and adds the configuration and
//! client-construction errors of this crate.

use apiguard_core::{ConfigError, Failure, FailureKind, RetryError, classify};
use thiserror::Error;

/// Result type alias for apiguard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for apiguard.
#[derive(Debug, Error)]
pub enum Error {
    /// An API call failed and was surfaced after classification and retries.
    #[error(transparent)]
    Failure(#[from] Failure),

    /// The call was cancelled between retries.
    #[error("request cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Attempts made before cancellation.
        attempts: u32,
    },

    /// Required configuration values are missing.
    #[error(
        "Missing required environment variables:\n{}\n\nTip: Set APIGUARD_USE_MOCK_DATA=true to use mock data instead.",
        .0.iter().map(|k| format!("  - {k}")).collect::<Vec<_>>().join("\n")
    )]
    MissingConfig(Vec<String>),

    /// A configuration value is present but invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Retry settings are invalid.
    #[error("Invalid retry configuration: {0}")]
    Retry(#[from] ConfigError),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client configuration or initialization error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigFormat(#[from] toml::de::Error),

    /// Other errors not covered by specific variants.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// The underlying failure, if this error came from an API call.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Error::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Classified kind of the underlying failure.
    pub fn kind(&self) -> Option<FailureKind> {
        self.failure().map(|failure| classify(failure).reason)
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.failure().is_some_and(|failure| classify(failure).retryable)
    }

    /// Whether the call was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }
}

impl From<RetryError> for Error {
    fn from(err: RetryError) -> Self {
        match err {
            RetryError::Failed(failure) => Error::Failure(failure),
            RetryError::Cancelled { attempts, .. } => Error::Cancelled { attempts },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiguard_core::TransportCode;

    #[test]
    fn test_error_is_retryable() {
        assert!(Error::Failure(Failure::http(503, "down")).is_retryable());
        assert!(
            Error::Failure(Failure::transport(TransportCode::NetworkUnreachable, "x"))
                .is_retryable()
        );
        assert!(!Error::Failure(Failure::http(401, "expired")).is_retryable());
        assert!(!Error::InvalidConfig("x".to_string()).is_retryable());
        assert!(!Error::Cancelled { attempts: 2 }.is_retryable());
    }

    #[test]
    fn test_error_kind() {
        let err = Error::from(Failure::http(403, "nope"));
        assert_eq!(err.kind(), Some(FailureKind::Forbidden));
        assert_eq!(Error::HttpClient("x".to_string()).kind(), None);
    }

    #[test]
    fn test_from_retry_error() {
        let failed = Error::from(RetryError::Failed(Failure::http(404, "gone")));
        assert_eq!(failed.failure().and_then(Failure::status), Some(404));

        let cancelled = Error::from(RetryError::Cancelled {
            attempts: 1,
            last_failure: Some(Failure::http(503, "down")),
        });
        assert!(cancelled.is_cancelled());
        assert!(cancelled.failure().is_none());
    }

    #[test]
    fn test_missing_config_lists_every_key() {
        let err = Error::MissingConfig(vec![
            "APIGUARD_API_URL".to_string(),
            "APIGUARD_OTHER".to_string(),
        ]);
        let message = err.to_string();
        assert!(message.contains("  - APIGUARD_API_URL"));
        assert!(message.contains("  - APIGUARD_OTHER"));
        assert!(message.contains("APIGUARD_USE_MOCK_DATA=true"));
    }

    #[test]
    fn test_failure_display_is_transparent() {
        let err = Error::from(Failure::http(500, "boom"));
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }
}
