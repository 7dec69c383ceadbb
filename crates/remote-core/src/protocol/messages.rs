//! The HTTP/JSON wire contract spoken by the remote display server.
//!
//! Every endpoint returns the same [`ApiResponse`] shape.  POST endpoints
//! that take parameters accept a small JSON body ([`NavigateRequest`],
//! [`TextRequest`], [`UrlRequest`]).
//!
//! The mapping from a [`Command`] to its HTTP exchange is a pure value,
//! [`RequestSpec`], so this crate stays free of any HTTP library: the
//! infrastructure layer turns a `RequestSpec` into a real request, and turns
//! the server's answer back into the normalized outcome defined here.
//!
//! # Outcome model
//!
//! An exchange has exactly two levels of failure:
//!
//! - [`Ack`] — the exchange *completed*: a response arrived and parsed.
//!   `Ack { ok: false, .. }` means the server rejected the operation
//!   (application-level failure), which callers treat as "operation failed"
//!   but is not a transport problem.
//! - [`ApiError`] — the exchange itself could not complete (connection
//!   refused, deadline exceeded) or the body was not the expected shape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::command::Command;

/// Default TCP port the remote control server listens on.
pub const DEFAULT_REMOTE_PORT: u16 = 5000;

// ── Response shape ────────────────────────────────────────────────────────────

/// The shared response body returned by every endpoint.
///
/// Only `success` is always present; the other fields depend on the endpoint
/// (`chromium_running` and `server` are reported by `/api/status`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chromium_running: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

// ── Request bodies ────────────────────────────────────────────────────────────

/// Body of `POST /api/navigate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateRequest {
    /// One of `up`, `down`, `left`, `right`, `enter`, `back`.
    pub direction: String,
}

/// Body of `POST /api/text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// Body of `POST /api/url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

/// A request body, serialized as the bare inner object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    Navigate(NavigateRequest),
    Text(TextRequest),
    Url(UrlRequest),
}

// ── Request specs ─────────────────────────────────────────────────────────────

/// HTTP method of an endpoint.  Local enum so this crate does not depend on
/// an HTTP library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// The complete wire description of one command: method, path relative to the
/// session base URL, and optional JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: &'static str,
    pub body: Option<RequestBody>,
}

impl Command {
    /// Returns the HTTP exchange this command maps to.
    pub fn request_spec(&self) -> RequestSpec {
        match self {
            Command::OpenBrowser => RequestSpec {
                method: Method::Post,
                path: "api/open",
                body: None,
            },
            Command::CloseBrowser => RequestSpec {
                method: Method::Post,
                path: "api/close",
                body: None,
            },
            Command::Navigate(direction) => RequestSpec {
                method: Method::Post,
                path: "api/navigate",
                body: Some(RequestBody::Navigate(NavigateRequest {
                    direction: direction.as_str().to_string(),
                })),
            },
            Command::InputText(text) => RequestSpec {
                method: Method::Post,
                path: "api/text",
                body: Some(RequestBody::Text(TextRequest { text: text.clone() })),
            },
            Command::OpenUrl(url) => RequestSpec {
                method: Method::Post,
                path: "api/url",
                body: Some(RequestBody::Url(UrlRequest { url: url.clone() })),
            },
            Command::Click => RequestSpec {
                method: Method::Post,
                path: "api/click",
                body: None,
            },
            Command::GetStatus => RequestSpec {
                method: Method::Get,
                path: "api/status",
                body: None,
            },
        }
    }
}

// ── Normalized outcomes ───────────────────────────────────────────────────────

/// Normalized result of a completed exchange.
///
/// `ok` is true only when the server answered 2xx *and* reported
/// `success: true`; any other completed combination yields `ok: false` with
/// the server's message (or the HTTP status) as `detail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub ok: bool,
    pub detail: Option<String>,
}

impl Ack {
    /// An acknowledgement for a rejected operation with the given detail.
    pub fn rejected(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: Some(detail.into()),
        }
    }
}

impl From<ApiResponse> for Ack {
    fn from(resp: ApiResponse) -> Self {
        Self {
            ok: resp.success,
            detail: resp.message,
        }
    }
}

/// Error type for an exchange that did not complete.
///
/// The controller treats all three kinds identically (the operation failed);
/// the kind is preserved for diagnostics and log lines.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Connection refused, DNS failure, network unreachable.
    #[error("transport error: {0}")]
    Transport(String),
    /// The exchange exceeded its deadline.
    #[error("request timed out")]
    Timeout,
    /// The response body does not match the expected [`ApiResponse`] shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::command::Direction;

    #[test]
    fn test_api_response_parses_with_all_fields() {
        let json = r#"{"success":true,"message":"ok","chromium_running":true,"server":"pi"}"#;
        let resp: ApiResponse = serde_json::from_str(json).unwrap();
        assert!(resp.success);
        assert_eq!(resp.message.as_deref(), Some("ok"));
        assert_eq!(resp.chromium_running, Some(true));
        assert_eq!(resp.server.as_deref(), Some("pi"));
    }

    #[test]
    fn test_api_response_parses_with_only_success() {
        let resp: ApiResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.message, None);
        assert_eq!(resp.chromium_running, None);
    }

    #[test]
    fn test_api_response_rejects_missing_success() {
        assert!(serde_json::from_str::<ApiResponse>(r#"{"message":"hi"}"#).is_err());
    }

    #[test]
    fn test_request_spec_table_matches_contract() {
        // One assertion per row of the server's endpoint table.
        let cases = [
            (Command::OpenBrowser, Method::Post, "api/open", false),
            (Command::CloseBrowser, Method::Post, "api/close", false),
            (
                Command::Navigate(Direction::Up),
                Method::Post,
                "api/navigate",
                true,
            ),
            (
                Command::InputText("hi".into()),
                Method::Post,
                "api/text",
                true,
            ),
            (
                Command::OpenUrl("https://example.com".into()),
                Method::Post,
                "api/url",
                true,
            ),
            (Command::Click, Method::Post, "api/click", false),
            (Command::GetStatus, Method::Get, "api/status", false),
        ];
        for (command, method, path, has_body) in cases {
            let spec = command.request_spec();
            assert_eq!(spec.method, method, "{command}");
            assert_eq!(spec.path, path, "{command}");
            assert_eq!(spec.body.is_some(), has_body, "{command}");
        }
    }

    #[test]
    fn test_navigate_body_serializes_direction_name() {
        let spec = Command::Navigate(Direction::Back).request_spec();
        let body = serde_json::to_string(&spec.body.unwrap()).unwrap();
        assert_eq!(body, r#"{"direction":"back"}"#);
    }

    #[test]
    fn test_text_body_serializes_bare_object() {
        let spec = Command::InputText("hello tv".into()).request_spec();
        let body = serde_json::to_string(&spec.body.unwrap()).unwrap();
        assert_eq!(body, r#"{"text":"hello tv"}"#);
    }

    #[test]
    fn test_url_body_serializes_bare_object() {
        let spec = Command::OpenUrl("https://example.com".into()).request_spec();
        let body = serde_json::to_string(&spec.body.unwrap()).unwrap();
        assert_eq!(body, r#"{"url":"https://example.com"}"#);
    }

    #[test]
    fn test_ack_from_successful_response() {
        let ack = Ack::from(ApiResponse {
            success: true,
            message: Some("browser opened".into()),
            chromium_running: Some(true),
            server: None,
        });
        assert!(ack.ok);
        assert_eq!(ack.detail.as_deref(), Some("browser opened"));
    }

    #[test]
    fn test_ack_from_rejected_response_is_not_ok() {
        let ack = Ack::from(ApiResponse {
            success: false,
            message: Some("chromium not running".into()),
            chromium_running: Some(false),
            server: None,
        });
        assert!(!ack.ok);
        assert_eq!(ack.detail.as_deref(), Some("chromium not running"));
    }

    #[test]
    fn test_api_error_display_preserves_kind() {
        assert_eq!(
            ApiError::Transport("connection refused".into()).to_string(),
            "transport error: connection refused"
        );
        assert_eq!(ApiError::Timeout.to_string(), "request timed out");
    }
}
