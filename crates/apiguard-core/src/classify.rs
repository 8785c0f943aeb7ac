//! Classify failures into kinds and retry verdicts.
//!
//! Status code is the primary key; the transport code is only consulted
//! when the server never answered.

use crate::failure::{Failure, TransportCode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed classification of a failure's cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 400.
    BadRequest,
    /// 401, the session is no longer authenticated.
    Unauthorized,
    /// 403, authenticated but lacking privilege.
    Forbidden,
    /// 404.
    NotFound,
    /// 408 or 504.
    Timeout,
    /// 5xx other than 504.
    ServerError,
    /// The server was never reached.
    NetworkError,
    /// Everything else, including unlisted 4xx.
    Unknown,
}

impl FailureKind {
    /// Whether failures of this kind are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureKind::Timeout | FailureKind::ServerError | FailureKind::NetworkError
        )
    }

    /// Stable snake_case name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::BadRequest => "bad_request",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::Forbidden => "forbidden",
            FailureKind::NotFound => "not_found",
            FailureKind::Timeout => "timeout",
            FailureKind::ServerError => "server_error",
            FailureKind::NetworkError => "network_error",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classifier's recommendation for one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryVerdict {
    /// Whether the executor may try again.
    pub retryable: bool,
    /// Why.
    pub reason: FailureKind,
}

impl From<FailureKind> for RetryVerdict {
    fn from(kind: FailureKind) -> Self {
        Self {
            retryable: kind.is_retryable(),
            reason: kind,
        }
    }
}

/// Derive the kind from a status code and transport code.
///
/// Total over its inputs: every combination maps to exactly one kind.
pub fn kind_of(status: Option<u16>, transport: Option<TransportCode>) -> FailureKind {
    match status {
        Some(400) => FailureKind::BadRequest,
        Some(401) => FailureKind::Unauthorized,
        Some(403) => FailureKind::Forbidden,
        Some(404) => FailureKind::NotFound,
        Some(408) | Some(504) => FailureKind::Timeout,
        Some(400..=499) => FailureKind::Unknown,
        Some(500..=599) => FailureKind::ServerError,
        Some(_) => FailureKind::Unknown,
        None => match transport {
            Some(TransportCode::NetworkUnreachable) => FailureKind::NetworkError,
            _ => FailureKind::Unknown,
        },
    }
}

/// Classify a failure. Pure; never alters or consumes the failure.
pub fn classify(failure: &Failure) -> RetryVerdict {
    kind_of(failure.status(), failure.transport_code()).into()
}
