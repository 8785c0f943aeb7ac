//! Configuration for apiguard

use crate::error::{Error, Result};
use crate::session::DEFAULT_UNAUTHENTICATED_ROUTE;
use apiguard_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Deployment environment; controls log verbosity and failure logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Verbose logging, every API failure is logged with its request.
    #[default]
    Development,
    /// Quieter logging.
    Production,
}

impl Environment {
    /// Whether this is the development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

/// Which request timeout applies to a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutClass {
    /// Ordinary request.
    #[default]
    Default,
    /// File uploads.
    Upload,
    /// Complex, slow operations.
    Long,
}

/// Request timeouts by class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiTimeouts {
    /// Ordinary requests.
    #[serde(with = "secs")]
    pub default: Duration,
    /// File uploads.
    #[serde(with = "secs")]
    pub upload: Duration,
    /// Complex operations.
    #[serde(with = "secs")]
    pub long: Duration,
}

impl Default for ApiTimeouts {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(30),
            upload: Duration::from_secs(120),
            long: Duration::from_secs(60),
        }
    }
}

impl ApiTimeouts {
    /// Timeout for a class of request.
    pub fn for_class(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Default => self.default,
            TimeoutClass::Upload => self.upload,
            TimeoutClass::Long => self.long,
        }
    }
}

/// Configuration for the error handler and the API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Base URL of the remote API. Required unless `use_mock_data` is set.
    pub api_url: Option<String>,

    /// Skip API validation and let the application serve mock data.
    pub use_mock_data: bool,

    /// Deployment environment.
    pub environment: Environment,

    /// Request timeouts.
    pub timeouts: ApiTimeouts,

    /// Retry attempts and backoff schedule.
    pub retry: RetryConfig,

    /// Route to navigate to when the session is lost.
    pub unauthenticated_route: String,

    /// Capacity of the notification channel handed to the UI.
    pub notification_buffer: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            use_mock_data: false,
            environment: Environment::default(),
            timeouts: ApiTimeouts::default(),
            retry: RetryConfig::default(),
            unauthenticated_route: DEFAULT_UNAUTHENTICATED_ROUTE.to_string(),
            notification_buffer: 32,
        }
    }
}

impl GuardConfig {
    /// Create a configuration pointing at an API.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: Some(api_url.into()),
            ..Default::default()
        }
    }

    /// Configuration for mock-data mode; no API is required.
    pub fn mock() -> Self {
        Self {
            use_mock_data: true,
            ..Default::default()
        }
    }

    /// Parse configuration from a TOML document and validate it.
    ///
    /// ```rust
    /// use apiguard::GuardConfig;
    ///
    /// let config = GuardConfig::from_toml_str(r#"
    ///     api_url = "https://api.example.com"
    ///     environment = "production"
    ///
    ///     [retry]
    ///     max_retries = 5
    ///     backoff_schedule = [0, 500, 1000]
    /// "#).unwrap();
    /// assert_eq!(config.retry.max_retries, 5);
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: GuardConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// This will look for:
    /// - `APIGUARD_API_URL` for the API base URL
    /// - `APIGUARD_USE_MOCK_DATA` (`true` to skip API validation)
    /// - `APIGUARD_ENV` (`development` or `production`)
    /// - `APIGUARD_MAX_RETRIES` for the number of attempts
    /// - `APIGUARD_BACKOFF_MS` for the backoff schedule, e.g. `0,2000,5000`
    /// - `APIGUARD_TIMEOUT_SECS` for the default request timeout
    /// - `APIGUARD_UNAUTHENTICATED_ROUTE` for the session-lost route
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source and validate it.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(api_url) = var("APIGUARD_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_url = Some(api_url);
        }

        if let Some(mock) = var("APIGUARD_USE_MOCK_DATA") {
            config.use_mock_data = mock.trim().eq_ignore_ascii_case("true");
        }

        if let Some(env) = var("APIGUARD_ENV") {
            config.environment = Environment::parse(&env).ok_or_else(|| {
                Error::InvalidConfig(format!("APIGUARD_ENV must be development or production, got '{env}'"))
            })?;
        }

        if let Some(max_retries) = var("APIGUARD_MAX_RETRIES") {
            config.retry.max_retries = max_retries.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("APIGUARD_MAX_RETRIES is not a number: '{max_retries}'"))
            })?;
        }

        if let Some(backoff) = var("APIGUARD_BACKOFF_MS") {
            config.retry.backoff_schedule = apiguard_core::retry::parse_backoff_millis(&backoff)?;
        }

        if let Some(timeout) = var("APIGUARD_TIMEOUT_SECS") {
            let secs: u64 = timeout.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("APIGUARD_TIMEOUT_SECS is not a number: '{timeout}'"))
            })?;
            config.timeouts.default = Duration::from_secs(secs);
        }

        if let Some(route) = var("APIGUARD_UNAUTHENTICATED_ROUTE") {
            config.unauthenticated_route = route;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable.
    ///
    /// In mock-data mode the API URL is not required. The backoff schedule
    /// needs no check here: it cannot be constructed empty.
    pub fn validate(&self) -> Result<()> {
        if self.use_mock_data {
            tracing::info!("Using mock data - API validation skipped");
        } else {
            let mut missing = Vec::new();
            if self.api_url.as_deref().is_none_or(|url| url.trim().is_empty()) {
                missing.push("APIGUARD_API_URL".to_string());
            }
            if !missing.is_empty() {
                return Err(Error::MissingConfig(missing));
            }
        }

        if let Some(api_url) = &self.api_url {
            Url::parse(api_url)?;
        }

        if !self.unauthenticated_route.starts_with('/') {
            return Err(Error::InvalidConfig(format!(
                "unauthenticated_route must be an absolute path, got '{}'",
                self.unauthenticated_route
            )));
        }

        Ok(())
    }

    /// Parsed base URL, if configured.
    pub fn base_url(&self) -> Result<Option<Url>> {
        self.api_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(Error::from)
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GuardConfig::default();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.timeouts.default, Duration::from_secs(30));
        assert_eq!(config.timeouts.upload, Duration::from_secs(120));
        assert_eq!(config.timeouts.long, Duration::from_secs(60));
        assert_eq!(config.unauthenticated_route, "/");
    }

    #[test]
    fn test_missing_api_url_is_reported() {
        let err = GuardConfig::from_vars(vars(&[])).unwrap_err();
        match err {
            Error::MissingConfig(keys) => assert_eq!(keys, vec!["APIGUARD_API_URL"]),
            other => panic!("expected MissingConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_mock_mode_skips_validation() {
        let config = GuardConfig::from_vars(vars(&[("APIGUARD_USE_MOCK_DATA", "true")])).unwrap();
        assert!(config.use_mock_data);
        assert!(config.api_url.is_none());
    }

    #[test]
    fn test_full_environment() {
        let config = GuardConfig::from_vars(vars(&[
            ("APIGUARD_API_URL", "https://api.example.com"),
            ("APIGUARD_ENV", "production"),
            ("APIGUARD_MAX_RETRIES", "5"),
            ("APIGUARD_BACKOFF_MS", "0,100,200"),
            ("APIGUARD_TIMEOUT_SECS", "10"),
            ("APIGUARD_UNAUTHENTICATED_ROUTE", "/login"),
        ]))
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(
            config.retry.backoff_schedule.delay_for(7),
            Duration::from_millis(200)
        );
        assert_eq!(config.timeouts.for_class(TimeoutClass::Default), Duration::from_secs(10));
        assert_eq!(config.unauthenticated_route, "/login");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let base = ("APIGUARD_API_URL", "https://api.example.com");

        assert!(matches!(
            GuardConfig::from_vars(vars(&[base, ("APIGUARD_MAX_RETRIES", "lots")])),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            GuardConfig::from_vars(vars(&[base, ("APIGUARD_BACKOFF_MS", "")])),
            Err(Error::Retry(_))
        ));
        assert!(matches!(
            GuardConfig::from_vars(vars(&[base, ("APIGUARD_ENV", "staging")])),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            GuardConfig::from_vars(vars(&[("APIGUARD_API_URL", "not a url")])),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_from_toml() {
        let config = GuardConfig::from_toml_str(
            r#"
            api_url = "https://api.example.com"
            unauthenticated_route = "/login"

            [timeouts]
            upload = 300

            [retry]
            max_retries = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.timeouts.upload, Duration::from_secs(300));
        assert_eq!(config.timeouts.default, Duration::from_secs(30));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apiguard.toml");
        std::fs::write(&path, "use_mock_data = true\nnotification_buffer = 8\n").unwrap();

        let config = GuardConfig::from_file(&path).unwrap();
        assert!(config.use_mock_data);
        assert_eq!(config.notification_buffer, 8);

        let missing = GuardConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(Error::Io(_))));
    }

    #[test]
    fn test_relative_route_rejected() {
        let mut config = GuardConfig::mock();
        config.unauthenticated_route = "login".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
