//! Structured logging helpers.
//!
//! Every request and every surfaced failure is logged through this module so
//! that credentials never reach the log: headers pass through
//! [`sanitize_headers`] first.

use crate::config::Environment;
use apiguard_core::{Failure, FailureKind};
use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Placeholder written in place of sensitive header values.
pub const REDACTED: &str = "[REDACTED]";

const SENSITIVE_HEADERS: [&str; 3] = ["authorization", "cookie", "x-api-key"];

/// Copy of `headers` with credentials replaced by [`REDACTED`].
pub fn sanitize_headers(headers: &HeaderMap) -> HeaderMap {
    let mut sanitized = headers.clone();
    for name in SENSITIVE_HEADERS {
        if sanitized.contains_key(name) {
            sanitized.insert(HeaderName::from_static(name), HeaderValue::from_static(REDACTED));
        }
    }
    sanitized
}

/// Outgoing request, for debug logging.
#[derive(Debug, Clone)]
pub struct RequestLog<'a> {
    /// HTTP method.
    pub method: &'a str,
    /// Full request URL.
    pub url: &'a str,
    /// Headers as sent; sanitized before logging.
    pub headers: &'a HeaderMap,
}

impl RequestLog<'_> {
    /// Log the request at debug level.
    pub fn log(&self) {
        let headers = sanitize_headers(self.headers);
        debug!(
            method = %self.method,
            url = %self.url,
            headers = ?headers,
            "Sending API request"
        );
    }
}

/// A failure that is about to be surfaced to the user.
#[derive(Debug, Clone, Copy)]
pub struct FailureLog<'a> {
    /// The failure.
    pub failure: &'a Failure,
    /// Its classification.
    pub kind: FailureKind,
}

impl<'a> FailureLog<'a> {
    /// Describe a classified failure.
    pub fn new(failure: &'a Failure, kind: FailureKind) -> Self {
        Self { failure, kind }
    }

    /// Log at error level with status, kind, message and request context.
    pub fn log(&self) {
        let request = self.failure.request();
        error!(
            status = self.failure.status(),
            transport = self.failure.transport_code().map(|code| code.as_str()),
            kind = %self.kind,
            message = %self.failure.message(),
            url = request.url.as_deref(),
            method = request.method.as_deref(),
            "API call failed"
        );
    }
}

/// Measures how long a request took.
#[derive(Debug, Clone, Copy)]
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Log a failed response in development builds.
pub fn log_response_failure(environment: Environment, failure: &Failure, elapsed: Duration) {
    if !environment.is_development() {
        return;
    }
    let request = failure.request();
    warn!(
        url = request.url.as_deref(),
        method = request.method.as_deref(),
        status = failure.status(),
        message = %failure.message(),
        elapsed_ms = elapsed.as_millis() as u64,
        "API error"
    );
}

/// Subscriber settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogConfig {
    /// Picks the default verbosity.
    pub environment: Environment,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub fn default_directive(&self) -> &'static str {
        match self.environment {
            Environment::Development => "debug",
            Environment::Production => "info",
        }
    }
}

/// Install a global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over the environment's default level.
/// Fails if a global subscriber is already installed.
#[cfg(feature = "trace")]
pub fn init_tracing(config: &LogConfig) -> crate::Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| crate::Error::Other(anyhow::anyhow!(e)))?;

    tracing::info!(environment = ?config.environment, "Logging initialized");
    Ok(())
}
