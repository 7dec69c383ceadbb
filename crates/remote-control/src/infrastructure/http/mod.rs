//! HTTP implementation of the remote control API.
//!
//! [`HttpRemoteClient`] turns a [`RequestSpec`] into a real exchange against
//! the bound base URL and normalizes the answer:
//!
//! - 2xx with a parseable [`ApiResponse`] → [`Ack`] (ok iff `success: true`);
//! - non-2xx status → `Ack { ok: false, .. }` — the exchange *completed*,
//!   the server rejected it;
//! - 2xx with an unparseable body → [`ApiError::Malformed`];
//! - deadline expiry → [`ApiError::Timeout`]; everything else that prevents
//!   a response → [`ApiError::Transport`].
//!
//! The client is stateless across calls: the only thing it holds besides the
//! shared connection pool is the base URL it was bound to at connect time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use remote_core::{Ack, ApiError, ApiResponse, Command, Method, RequestSpec};

use crate::application::connection::{RemoteApi, RemoteApiFactory};

/// Joins a request path onto the session base URL.
///
/// The base URL always carries a trailing slash and spec paths never carry a
/// leading one, so plain concatenation is correct.
fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{base_url}{path}")
}

/// Classifies a reqwest failure into the two non-body error kinds.
fn classify(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(e.to_string())
    }
}

/// A [`RemoteApi`] bound to one base URL, issuing JSON/HTTP exchanges.
pub struct HttpRemoteClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpRemoteClient {
    /// Binds a client to `base_url`, sharing the given connection pool.
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    async fn exchange(&self, spec: RequestSpec) -> Result<Ack, ApiError> {
        let url = endpoint_url(&self.base_url, spec.path);
        debug!("HTTP exchange: {:?} {url}", spec.method);

        let request = match spec.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
        };
        let request = match &spec.body {
            Some(body) => request.json(body),
            None => request,
        };

        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            // A completed exchange the server answered with an error status.
            return Ok(Ack::rejected(format!("HTTP {status}")));
        }

        let body: ApiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Malformed(e.to_string())
            }
        })?;
        Ok(Ack::from(body))
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteClient {
    async fn execute(&self, command: Command) -> Result<Ack, ApiError> {
        self.exchange(command.request_spec()).await
    }

    async fn probe(&self) -> Result<Ack, ApiError> {
        self.exchange(Command::GetStatus.request_spec()).await
    }
}

/// Factory producing [`HttpRemoteClient`]s that share one connection pool
/// and one per-exchange timeout.
pub struct HttpClientFactory {
    http: reqwest::Client,
}

impl HttpClientFactory {
    /// Builds the shared HTTP client with the given per-exchange timeout.
    ///
    /// # Errors
    ///
    /// Returns the underlying builder error if the TLS backend cannot be
    /// initialised.
    pub fn new(request_timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self { http })
    }
}

impl RemoteApiFactory for HttpClientFactory {
    fn bind(&self, base_url: &str) -> Arc<dyn RemoteApi> {
        Arc::new(HttpRemoteClient::new(base_url, self.http.clone()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
