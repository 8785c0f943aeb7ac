//! Normalized failure model.
//!
//! Every error crossing the transport boundary is turned into a [`Failure`]
//! exactly once. The classifier and executor only ever see this shape.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transport-level failure tag for errors that never produced an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportCode {
    /// The remote host could not be reached (DNS, refused connection, offline).
    NetworkUnreachable,
    /// The transport gave up waiting for a response.
    TimedOut,
    /// An established connection was reset by the peer.
    ConnectionReset,
    /// The request was aborted locally.
    Aborted,
    /// Any other transport error.
    Other,
}

impl TransportCode {
    /// Wire tag for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkUnreachable => "NETWORK_UNREACHABLE",
            Self::TimedOut => "TIMED_OUT",
            Self::ConnectionReset => "CONNECTION_RESET",
            Self::Aborted => "ABORTED",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for TransportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportCode {
    type Err = std::convert::Infallible;

    /// Parses both our own tags and the common client-library tags
    /// (`ERR_NETWORK`, `ECONNABORTED`, ...). Unrecognized tags become `Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = match s.trim().to_ascii_uppercase().as_str() {
            "NETWORK_UNREACHABLE" | "ERR_NETWORK" | "ENETUNREACH" | "ECONNREFUSED"
            | "ENOTFOUND" => Self::NetworkUnreachable,
            "TIMED_OUT" | "ETIMEDOUT" | "ECONNABORTED" => Self::TimedOut,
            "CONNECTION_RESET" | "ECONNRESET" => Self::ConnectionReset,
            "ABORTED" | "ERR_CANCELED" => Self::Aborted,
            _ => Self::Other,
        };
        Ok(code)
    }
}

/// The request a failure belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Request URL, if known.
    pub url: Option<String>,
    /// HTTP method, if known.
    pub method: Option<String>,
}

impl RequestContext {
    /// Create a context from a method and URL.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            method: Some(method.into()),
        }
    }
}

/// A normalized call failure.
///
/// Fields are private so a failure cannot be altered after construction;
/// the retry executor hands the caller exactly what the operation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    status: Option<u16>,
    transport: Option<TransportCode>,
    message: String,
    #[serde(default)]
    request: RequestContext,
}

impl Failure {
    /// A failure carrying an HTTP status.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            transport: None,
            message: message.into(),
            request: RequestContext::default(),
        }
    }

    /// A failure that never reached an HTTP response.
    pub fn transport(code: TransportCode, message: impl Into<String>) -> Self {
        Self {
            status: None,
            transport: Some(code),
            message: message.into(),
            request: RequestContext::default(),
        }
    }

    /// A failure with neither status nor transport code.
    ///
    /// Errors that do not originate from the transport end up here and
    /// classify as `Unknown`.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            status: None,
            transport: None,
            message: message.into(),
            request: RequestContext::default(),
        }
    }

    /// Attach the request context. Only meant for use while the failure is
    /// being built at the boundary.
    pub fn with_request(mut self, request: RequestContext) -> Self {
        self.request = request;
        self
    }

    /// HTTP status code, if the server answered.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Transport code, if the failure happened below HTTP.
    pub fn transport_code(&self) -> Option<TransportCode> {
        self.transport
    }

    /// Human-readable message (server-supplied when available).
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Request the failure belongs to.
    pub fn request(&self) -> &RequestContext {
        &self.request
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.transport) {
            (Some(status), _) => write!(f, "HTTP {}: {}", status, self.message),
            (None, Some(code)) => write!(f, "transport {}: {}", code, self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Failure {}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::ConnectionRefused | ErrorKind::NotConnected => {
                Self::transport(TransportCode::NetworkUnreachable, err.to_string())
            }
            ErrorKind::TimedOut => Self::transport(TransportCode::TimedOut, err.to_string()),
            ErrorKind::ConnectionReset => {
                Self::transport(TransportCode::ConnectionReset, err.to_string())
            }
            ErrorKind::ConnectionAborted => {
                Self::transport(TransportCode::Aborted, err.to_string())
            }
            _ => Self::unknown(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Failure>() {
            Ok(failure) => failure,
            Err(err) => Self::unknown(format!("{:#}", err)),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for Failure {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        match err.downcast::<Failure>() {
            Ok(failure) => *failure,
            Err(err) => Self::unknown(err.to_string()),
        }
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Self::unknown(message)
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Self::unknown(message)
    }
}
