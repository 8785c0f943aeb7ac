//! Adapter between `reqwest` and the failure model.
//!
//! [`failure_from_reqwest`] and [`failure_from_response`] turn whatever the
//! HTTP client reports into a [`Failure`] at the boundary. [`ApiClient`] is a
//! thin JSON client built on them that also injects the bearer token.

use crate::config::{ApiTimeouts, Environment, GuardConfig, TimeoutClass};
use crate::credentials::{CredentialKey, CredentialStore};
use crate::error::{Error, Result};
use crate::observability::{RequestLog, RequestTimer, log_response_failure};
use apiguard_core::{Failure, RequestContext, TransportCode};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use http::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Normalize a client-side error into a [`Failure`].
///
/// An error that carries a response status keeps it. Otherwise timeouts map
/// to [`TransportCode::TimedOut`], connection failures to
/// [`TransportCode::NetworkUnreachable`] and everything else to
/// [`TransportCode::Other`].
pub fn failure_from_reqwest(err: &reqwest::Error, request: RequestContext) -> Failure {
    let failure = if let Some(status) = err.status() {
        Failure::http(status.as_u16(), err.to_string())
    } else if err.is_timeout() {
        Failure::transport(TransportCode::TimedOut, err.to_string())
    } else if err.is_connect() {
        Failure::transport(TransportCode::NetworkUnreachable, err.to_string())
    } else {
        Failure::transport(TransportCode::Other, err.to_string())
    };
    failure.with_request(request)
}

/// Build a [`Failure`] from an error response.
///
/// The message is taken from a JSON `error` field (a string, or an object
/// with a `message`), then a top-level `message` field, then the raw body,
/// then the status's reason phrase.
pub fn failure_from_response(status: StatusCode, body: &str, request: RequestContext) -> Failure {
    let message = server_message(body)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    Failure::http(status.as_u16(), message).with_request(request)
}

/// Message the server put in a JSON error body, if any.
pub fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = match value.get("error") {
        Some(Value::String(text)) => Some(text.as_str()),
        Some(Value::Object(obj)) => obj.get("message").and_then(Value::as_str),
        _ => None,
    }
    .or_else(|| value.get("message").and_then(Value::as_str))?;

    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

/// JSON client for the remote API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
    timeouts: ApiTimeouts,
    environment: Environment,
}

impl ApiClient {
    /// Create a client from configuration.
    ///
    /// Fails with [`Error::MissingConfig`] when no API URL is configured.
    pub fn new(config: &GuardConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let base_url = config
            .base_url()?
            .ok_or_else(|| Error::MissingConfig(vec!["APIGUARD_API_URL".to_string()]))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(config.timeouts.default)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            credentials,
            timeouts: config.timeouts,
            environment: config.environment,
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET path`.
    pub async fn get(&self, path: &str) -> std::result::Result<Value, Failure> {
        self.request(Method::GET, path, None, TimeoutClass::Default)
            .await
    }

    /// `POST path` with a JSON body.
    pub async fn post(&self, path: &str, body: &Value) -> std::result::Result<Value, Failure> {
        self.request(Method::POST, path, Some(body), TimeoutClass::Default)
            .await
    }

    /// `PUT path` with a JSON body.
    pub async fn put(&self, path: &str, body: &Value) -> std::result::Result<Value, Failure> {
        self.request(Method::PUT, path, Some(body), TimeoutClass::Default)
            .await
    }

    /// `DELETE path`.
    pub async fn delete(&self, path: &str) -> std::result::Result<Value, Failure> {
        self.request(Method::DELETE, path, None, TimeoutClass::Default)
            .await
    }

    /// `GET path`, deserialized into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, Failure> {
        let value = self.get(path).await?;
        serde_json::from_value(value).map_err(|e| {
            Failure::unknown(format!("unexpected response shape: {e}"))
                .with_request(RequestContext::new("GET", self.url_for(path)))
        })
    }

    /// `GET /health`.
    pub async fn health(&self) -> std::result::Result<Value, Failure> {
        self.get("/health").await
    }

    /// Send a request with an explicit timeout class.
    ///
    /// Success bodies are parsed as JSON; an empty body yields `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        class: TimeoutClass,
    ) -> std::result::Result<Value, Failure> {
        let url = self.url_for(path);
        let context = RequestContext::new(method.as_str(), url.clone());

        let headers = self.auth_headers();
        RequestLog {
            method: method.as_str(),
            url: &url,
            headers: &headers,
        }
        .log();

        let mut builder = self
            .http
            .request(method, url.as_str())
            .headers(headers)
            .timeout(self.timeouts.for_class(class));
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let timer = RequestTimer::start();
        let response = builder
            .send()
            .await
            .map_err(|e| self.reported(failure_from_reqwest(&e, context.clone()), &timer))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.reported(failure_from_reqwest(&e, context.clone()), &timer))?;

        if !status.is_success() {
            return Err(self.reported(failure_from_response(status, &text, context), &timer));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            Failure::unknown(format!("invalid JSON response: {e}")).with_request(context)
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.credentials.get(CredentialKey::AccessToken) {
            match HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("Access token is not a valid header value, sending without it"),
            }
        }
        headers
    }

    fn reported(&self, failure: Failure, timer: &RequestTimer) -> Failure {
        log_response_failure(self.environment, &failure, timer.elapsed());
        failure
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeouts", &self.timeouts)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}
