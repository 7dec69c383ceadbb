//! UI bridge: exposes controller operations to the presentation layer.
//!
//! The UI (native shell, web view, or the headless binary) talks to the
//! controller exclusively through the functions here: one action per remote
//! command plus connect/disconnect/status.  This is the only module that
//! references both the application layer and presentation concerns.
//!
//! # DTOs and the `CommandResult<T>` envelope
//!
//! Controller types (state enum, `Ack`) are not serialized directly; the
//! DTO structs here are plain serializable snapshots.  Every action returns
//! the same envelope shape:
//!
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..." }
//! ```
//!
//! so the presentation side uses a single error-handling pattern for all
//! actions.  Note the envelope's `success` means "the action was accepted
//! and the exchange completed" — a completed exchange the server rejected
//! still carries `data.ok == false`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use remote_core::{Ack, Command, Direction};

use crate::application::connection::{ConnectionController, ConnectionState};

// ── Shared application state ──────────────────────────────────────────────────

/// Application state handed to every UI action.
pub struct AppState {
    /// The single connection controller owning session and poll state.
    pub controller: Arc<ConnectionController>,
}

impl AppState {
    pub fn new(controller: Arc<ConnectionController>) -> Arc<Self> {
        Arc::new(Self { controller })
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// Snapshot of the connection as shown in the UI status line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionStatusDto {
    /// One of `disconnected`, `connecting`, `connected`, `failed`.
    pub state: String,
    /// Host of the live session, when one exists.
    pub address: Option<String>,
    /// Most recent failure summary, for display next to the status.
    pub last_error: Option<String>,
    /// True while the liveness poll is running (iff `state == "connected"`).
    pub polling: bool,
}

/// Serializable form of a completed exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AckDto {
    pub ok: bool,
    pub detail: Option<String>,
}

impl From<Ack> for AckDto {
    fn from(ack: Ack) -> Self {
        Self {
            ok: ack.ok,
            detail: ack.detail,
        }
    }
}

/// Uniform envelope returned by every UI action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ── UI actions ────────────────────────────────────────────────────────────────

/// Reads the current connection snapshot.
pub async fn connection_status(state: &AppState) -> ConnectionStatusDto {
    let controller = &state.controller;
    ConnectionStatusDto {
        state: controller.state().await.as_str().to_string(),
        address: controller.session_address().await,
        last_error: controller.last_error().await,
        polling: controller.is_polling().await,
    }
}

/// Starts a connect attempt; the outcome arrives as a `ConnectionEvent`.
pub async fn connect(state: &AppState, address: &str) -> CommandResult<ConnectionStatusDto> {
    match state.controller.connect(address).await {
        Ok(()) => CommandResult::ok(connection_status(state).await),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Tears the current session down.
pub async fn disconnect(state: &AppState) -> CommandResult<ConnectionStatusDto> {
    state.controller.disconnect().await;
    CommandResult::ok(connection_status(state).await)
}

async fn dispatch(state: &AppState, command: Command) -> CommandResult<AckDto> {
    match state.controller.send(command).await {
        Ok(ack) => CommandResult::ok(ack.into()),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Launches the Chromium kiosk on the display device.
pub async fn open_browser(state: &AppState) -> CommandResult<AckDto> {
    dispatch(state, Command::OpenBrowser).await
}

/// Terminates the Chromium kiosk.
pub async fn close_browser(state: &AppState) -> CommandResult<AckDto> {
    dispatch(state, Command::CloseBrowser).await
}

/// Moves the focus highlight; `direction` is one of the wire names.
pub async fn navigate(state: &AppState, direction: &str) -> CommandResult<AckDto> {
    match direction.parse::<Direction>() {
        Ok(dir) => dispatch(state, Command::Navigate(dir)).await,
        Err(e) => CommandResult::err(e),
    }
}

/// Types text into the focused element.
///
/// Empty text is refused locally, matching the original remote UI, which
/// does not send an empty text field.
pub async fn input_text(state: &AppState, text: &str) -> CommandResult<AckDto> {
    if text.is_empty() {
        return CommandResult::err("text must not be empty");
    }
    dispatch(state, Command::InputText(text.to_string())).await
}

/// Navigates the browser to the given URL.
pub async fn open_url(state: &AppState, url: &str) -> CommandResult<AckDto> {
    dispatch(state, Command::OpenUrl(url.to_string())).await
}

/// Clicks the focused element.
pub async fn click(state: &AppState) -> CommandResult<AckDto> {
    dispatch(state, Command::Click).await
}

/// Queries server and browser status as a one-off command.
pub async fn get_status(state: &AppState) -> CommandResult<AckDto> {
    dispatch(state, Command::GetStatus).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::connection::{
        ControllerConfig, RemoteApi, RemoteApiFactory,
    };
    use async_trait::async_trait;
    use remote_core::ApiError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingApi {
        execute_calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteApi for CountingApi {
        async fn execute(&self, _command: Command) -> Result<Ack, ApiError> {
            self.execute_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Ack {
                ok: true,
                detail: None,
            })
        }

        async fn probe(&self) -> Result<Ack, ApiError> {
            Ok(Ack {
                ok: true,
                detail: None,
            })
        }
    }

    struct CountingFactory {
        api: Arc<CountingApi>,
    }

    impl RemoteApiFactory for CountingFactory {
        fn bind(&self, _base_url: &str) -> Arc<dyn RemoteApi> {
            Arc::clone(&self.api) as Arc<dyn RemoteApi>
        }
    }

    fn make_state() -> (Arc<AppState>, Arc<CountingApi>) {
        let api = Arc::new(CountingApi {
            execute_calls: AtomicUsize::new(0),
        });
        let factory = Arc::new(CountingFactory {
            api: Arc::clone(&api),
        });
        let (controller, _rx) =
            ConnectionController::new(factory, ControllerConfig::default());
        (AppState::new(controller), api)
    }

    #[tokio::test]
    async fn test_status_snapshot_of_fresh_state() {
        let (state, _api) = make_state();
        let dto = connection_status(&state).await;
        assert_eq!(dto.state, "disconnected");
        assert_eq!(dto.address, None);
        assert!(!dto.polling);
    }

    #[tokio::test]
    async fn test_connect_with_empty_address_yields_error_envelope() {
        let (state, _api) = make_state();
        let result = connect(&state, "").await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("invalid address"));
    }

    #[tokio::test]
    async fn test_command_while_disconnected_yields_error_envelope() {
        let (state, api) = make_state();
        let result = click(&state).await;
        assert!(!result.success);
        assert_eq!(api.execute_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_text_is_refused_without_network_call() {
        let (state, api) = make_state();
        let result = input_text(&state, "").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("text must not be empty"));
        assert_eq!(api.execute_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_navigate_rejects_unknown_direction() {
        let (state, api) = make_state();
        let result = navigate(&state, "sideways").await;
        assert!(!result.success);
        assert_eq!(api.execute_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_envelope_serializes_with_null_fields() {
        let ok: CommandResult<AckDto> = CommandResult::ok(AckDto {
            ok: true,
            detail: None,
        });
        let json = serde_json::to_string(&ok).unwrap();
        assert_eq!(
            json,
            r#"{"success":true,"data":{"ok":true,"detail":null},"error":null}"#
        );

        let err: CommandResult<AckDto> = CommandResult::err("boom");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"success":false,"data":null,"error":"boom"}"#);
    }
}
