//! ConnectionController: the connection lifecycle and liveness state machine.
//!
//! The controller owns everything about the relationship with the remote
//! display: the current [`ConnectionState`], the live [`Session`], and the
//! [`PollHandle`] driving periodic liveness probes.  No other component
//! mutates any of them.
//!
//! # Connection lifecycle
//!
//! ```text
//!               connect(addr)                probe ok
//! Disconnected ───────────────► Connecting ───────────► Connected
//!      ▲                            │                    │  │
//!      │                probe fails │                    │  │ liveness probe
//!      │                            ▼                    │  │ fails
//!      │        connect(addr)    Failed                  │  │
//!      │◄────────────────────────────                    │  │
//!      │                  disconnect()                   │  │
//!      │◄────────────────────────────────────────────────┘  │
//!      │          "connection lost"                         │
//!      └────────────────────────────────────────────────────┘
//! ```
//!
//! The machine is cyclic by design: there is no terminal state, and `connect`
//! is legal from every state except `Connecting` (a second connect while one
//! is in flight is rejected rather than racing two sessions).
//!
//! # One transition path for every completion
//!
//! Every asynchronous completion — the connect handshake probe, each periodic
//! liveness probe — funnels through a single generation-checked completion
//! handler instead of ad-hoc per-call callbacks.  Each in-flight operation is
//! tagged with the session generation that issued it; a completion whose tag
//! no longer matches is discarded without touching state, which makes
//! out-of-order and post-cancellation completions harmless.
//!
//! # Failure policy
//!
//! No failure is retried and none is fatal: every failure surfaces as a
//! [`ConnectionEvent`] and leaves the controller in a stable state.  A probe
//! failure during `Connecting` means "never connected" (`Failed`); a probe
//! failure during `Connected` means "lost an existing connection"
//! (`Disconnected`, reported as [`ConnectionEvent::ConnectionLost`]).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use remote_core::{
    Ack, Address, AddressError, ApiError, Command, GenerationCounter, DEFAULT_REMOTE_PORT,
};

/// Fixed interval between consecutive liveness probes while `Connected`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Per-exchange deadline; expiry surfaces as [`ApiError::Timeout`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Error type for controller intents.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The supplied address failed validation; no session was created and no
    /// network call was made.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
    /// A connect attempt is already in flight; the new request is rejected
    /// rather than racing two sessions.
    #[error("a connect attempt is already in progress")]
    ConnectInProgress,
    /// A command was issued outside the `Connected` state.
    #[error("not connected to a remote display")]
    NotConnected,
    /// The command's exchange failed; the kind is preserved for diagnostics.
    #[error(transparent)]
    Request(#[from] ApiError),
}

/// Current state of the connection to the remote display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session.  Initial state, and the state after any teardown.
    Disconnected,
    /// A session exists and the handshake probe is in flight.
    Connecting,
    /// The handshake probe succeeded; liveness polling is active.
    Connected,
    /// The handshake probe failed; the session was discarded.
    Failed,
}

impl ConnectionState {
    /// Stable lowercase name used in DTOs and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        }
    }
}

/// Events emitted by the controller to the UI layer.
///
/// Failures are always reported, never silently swallowed; the two teardown
/// reports are deliberately distinct so the UI can word them differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connect attempt started for the given host.
    Connecting { address: String },
    /// The handshake probe succeeded.
    Connected { address: String },
    /// The handshake probe failed; state is now `Failed`.
    ConnectFailed { reason: String },
    /// The user requested disconnect; state is now `Disconnected`.
    Disconnected,
    /// A liveness probe failed while connected; state is now `Disconnected`.
    /// Distinct from [`ConnectionEvent::Disconnected`] for user messaging.
    ConnectionLost { reason: String },
    /// A dispatched command failed or was rejected by the server.
    CommandFailed { label: &'static str, reason: String },
}

// ── Trait seams ───────────────────────────────────────────────────────────────

/// The remote control API as seen by the controller.
///
/// The infrastructure implementation issues real HTTP exchanges; test
/// implementations return scripted outcomes.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Executes one command against the bound base URL.
    async fn execute(&self, command: Command) -> Result<Ack, ApiError>;

    /// Calls the status endpoint.  Used both for the connect handshake and
    /// for periodic liveness checks.
    async fn probe(&self) -> Result<Ack, ApiError>;
}

/// Binds a [`RemoteApi`] to a base URL at connect time.
///
/// A new binding is created for every session, so the previous session's
/// client can never leak into the next one (no process-wide singleton).
pub trait RemoteApiFactory: Send + Sync {
    fn bind(&self, base_url: &str) -> Arc<dyn RemoteApi>;
}

// ── Internal state ────────────────────────────────────────────────────────────

/// The live session: address, derived base URL, and the API bound to it.
///
/// Exists only while the state is `Connecting`, `Connected`, or the brief
/// window before a failed handshake is recorded.  At most one is live.
struct Session {
    address: Address,
    base_url: String,
    api: Arc<dyn RemoteApi>,
}

/// Ownership token for the recurring liveness probe task.
///
/// Exists iff the state is `Connected`.  Dropping it aborts the task, so the
/// poll can never outlive the state that started it.
struct PollHandle {
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    fn new(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// Stops the probe task immediately; no further probes fire.
    fn cancel(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Releases the token without aborting.  Used when the probe task is
    /// exiting on its own and is the caller of the teardown.
    fn detach(mut self) {
        self.task.take();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Mutable controller state, owned exclusively behind one lock.
struct Inner {
    state: ConnectionState,
    session: Option<Session>,
    poll: Option<PollHandle>,
    generation: GenerationCounter,
    last_error: Option<String>,
}

/// Timing and addressing constants for the controller.
///
/// These are configuration values, not user-adjustable at runtime.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// TCP port of the remote control server.
    pub port: u16,
    /// Interval between consecutive liveness probes while `Connected`.
    pub poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_REMOTE_PORT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

// ── The controller ────────────────────────────────────────────────────────────

/// Owns connection state, the live session, and the liveness poll, and maps
/// UI intents and asynchronous completions into state transitions.
pub struct ConnectionController {
    inner: Mutex<Inner>,
    factory: Arc<dyn RemoteApiFactory>,
    events: mpsc::Sender<ConnectionEvent>,
    config: ControllerConfig,
}

impl ConnectionController {
    /// Creates a controller and returns it together with the event receiver
    /// the UI layer consumes.
    pub fn new(
        factory: Arc<dyn RemoteApiFactory>,
        config: ControllerConfig,
    ) -> (Arc<Self>, mpsc::Receiver<ConnectionEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let controller = Arc::new(Self {
            inner: Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                session: None,
                poll: None,
                generation: GenerationCounter::new(),
                last_error: None,
            }),
            factory,
            events: tx,
            config,
        });
        (controller, rx)
    }

    // ── Intents ───────────────────────────────────────────────────────────────

    /// Starts a connect attempt against the given raw host string.
    ///
    /// Validation happens before any session exists; an invalid address
    /// changes nothing.  A previous session (connected or failed) is
    /// discarded and its in-flight operations become stale.  Returns as soon
    /// as the handshake probe is in flight; the outcome arrives as a
    /// [`ConnectionEvent`].
    ///
    /// # Errors
    ///
    /// [`ControllerError::InvalidAddress`] for empty/malformed input,
    /// [`ControllerError::ConnectInProgress`] while already `Connecting`.
    pub async fn connect(self: &Arc<Self>, address: &str) -> Result<(), ControllerError> {
        let address = Address::parse(address)?;

        let (api, generation) = {
            let mut inner = self.inner.lock().await;
            if inner.state == ConnectionState::Connecting {
                return Err(ControllerError::ConnectInProgress);
            }

            // Leaving `Connected` through reconnect: stop polling before the
            // old session is replaced.
            if let Some(poll) = inner.poll.take() {
                poll.cancel();
            }

            let generation = inner.generation.advance();
            let base_url = address.base_url(self.config.port);
            let api = self.factory.bind(&base_url);
            inner.session = Some(Session {
                address: address.clone(),
                base_url,
                api: Arc::clone(&api),
            });
            inner.state = ConnectionState::Connecting;
            inner.last_error = None;
            (api, generation)
        };

        info!("connecting to {address}");
        self.emit(ConnectionEvent::Connecting {
            address: address.to_string(),
        })
        .await;

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = api.probe().await;
            this.complete_handshake(generation, outcome).await;
        });
        Ok(())
    }

    /// Tears the current session down at the user's request.
    ///
    /// Legal from every state; a no-op when already `Disconnected`.  The
    /// liveness poll is cancelled immediately and any in-flight operation of
    /// the old session becomes stale.
    pub async fn disconnect(&self) {
        let event = {
            let mut inner = self.inner.lock().await;
            if inner.state == ConnectionState::Disconnected {
                return;
            }
            inner.generation.advance();
            if let Some(poll) = inner.poll.take() {
                poll.cancel();
            }
            inner.session = None;
            inner.state = ConnectionState::Disconnected;
            ConnectionEvent::Disconnected
        };
        info!("disconnected by user");
        self.emit(event).await;
    }

    /// Dispatches one command to the connected remote display.
    ///
    /// The completed [`Ack`] is returned to the caller even when the server
    /// rejected the operation (`ok: false`); the connection state is never
    /// changed by a command outcome.
    ///
    /// # Errors
    ///
    /// [`ControllerError::NotConnected`] outside the `Connected` state (no
    /// network call is made), or [`ControllerError::Request`] when the
    /// exchange itself failed.
    pub async fn send(&self, command: Command) -> Result<Ack, ControllerError> {
        let (api, generation) = {
            let inner = self.inner.lock().await;
            let session = match (&inner.state, &inner.session) {
                (ConnectionState::Connected, Some(session)) => session,
                _ => return Err(ControllerError::NotConnected),
            };
            (Arc::clone(&session.api), inner.generation.current())
        };

        debug!("dispatching command: {command}");
        match api.execute(command.clone()).await {
            Ok(ack) => {
                if !ack.ok {
                    let reason = ack
                        .detail
                        .clone()
                        .unwrap_or_else(|| "server reported failure".to_string());
                    self.emit(ConnectionEvent::CommandFailed {
                        label: command.label(),
                        reason,
                    })
                    .await;
                }
                Ok(ack)
            }
            Err(e) => {
                let reason = e.to_string();
                {
                    // Record diagnostics only if the issuing session is still
                    // the live one.
                    let mut inner = self.inner.lock().await;
                    if inner.generation.is_current(generation) {
                        inner.last_error = Some(reason.clone());
                    }
                }
                warn!("command '{}' failed: {reason}", command.label());
                self.emit(ConnectionEvent::CommandFailed {
                    label: command.label(),
                    reason,
                })
                .await;
                Err(ControllerError::Request(e))
            }
        }
    }

    // ── Observers ─────────────────────────────────────────────────────────────

    /// Returns the current connection state.
    pub async fn state(&self) -> ConnectionState {
        self.inner.lock().await.state
    }

    /// Returns the host of the live session, if one exists.
    pub async fn session_address(&self) -> Option<String> {
        let inner = self.inner.lock().await;
        inner.session.as_ref().map(|s| s.address.to_string())
    }

    /// Returns the base URL of the live session, if one exists.
    pub async fn session_base_url(&self) -> Option<String> {
        let inner = self.inner.lock().await;
        inner.session.as_ref().map(|s| s.base_url.clone())
    }

    /// Returns the most recent failure summary, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.inner.lock().await.last_error.clone()
    }

    /// Returns true while the liveness poll is active.
    ///
    /// Invariant: this is true iff [`state`](Self::state) is `Connected`.
    pub async fn is_polling(&self) -> bool {
        self.inner.lock().await.poll.is_some()
    }

    // ── Completion handling ───────────────────────────────────────────────────

    /// Applies the outcome of the connect handshake probe.
    ///
    /// A stale tag (the session was cancelled or replaced while the probe was
    /// in flight) is discarded without any state change.
    async fn complete_handshake(self: &Arc<Self>, generation: u64, outcome: Result<Ack, ApiError>) {
        let event = {
            let mut inner = self.inner.lock().await;
            if !inner.generation.is_current(generation) {
                debug!("ignoring stale handshake probe (generation {generation})");
                return;
            }
            if inner.state != ConnectionState::Connecting {
                debug!("handshake probe resolved outside Connecting; ignoring");
                return;
            }

            match probe_failure(&outcome) {
                None => {
                    let Some(session) = inner.session.as_ref() else {
                        // Unreachable while the generation matches; recover
                        // to a stable state instead of panicking.
                        warn!("handshake succeeded without a session; resetting");
                        inner.state = ConnectionState::Disconnected;
                        return;
                    };
                    let address = session.address.to_string();
                    let api = Arc::clone(&session.api);
                    inner.state = ConnectionState::Connected;
                    inner.poll = Some(self.start_poll(api, generation));
                    info!("connected to {address}");
                    ConnectionEvent::Connected { address }
                }
                Some(reason) => {
                    inner.session = None;
                    inner.state = ConnectionState::Failed;
                    inner.last_error = Some(reason.clone());
                    warn!("connect failed: {reason}");
                    ConnectionEvent::ConnectFailed { reason }
                }
            }
        };
        self.emit(event).await;
    }

    /// Applies the outcome of one periodic liveness probe.
    ///
    /// Returns true when polling should continue.  Any failure (or a stale
    /// tag) stops the poll; a failure on the live session tears the
    /// connection down and reports it as lost.
    async fn complete_liveness(&self, generation: u64, outcome: Result<Ack, ApiError>) -> bool {
        let event = {
            let mut inner = self.inner.lock().await;
            if !inner.generation.is_current(generation) {
                debug!("ignoring stale liveness probe (generation {generation})");
                return false;
            }

            let Some(reason) = probe_failure(&outcome) else {
                debug!("liveness probe ok");
                return true;
            };

            // One failed probe is enough: tear the session down.  The poll
            // task is the caller here, so release its token without aborting
            // and let it exit through the `false` return.
            warn!("connection lost: {reason}");
            inner.generation.advance();
            if let Some(poll) = inner.poll.take() {
                poll.detach();
            }
            inner.session = None;
            inner.state = ConnectionState::Disconnected;
            inner.last_error = Some(reason.clone());
            ConnectionEvent::ConnectionLost { reason }
        };
        self.emit(event).await;
        false
    }

    /// Spawns the recurring liveness probe task for the given session.
    fn start_poll(self: &Arc<Self>, api: Arc<dyn RemoteApi>, generation: u64) -> PollHandle {
        let this = Arc::clone(self);
        let interval = self.config.poll_interval;
        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let outcome = api.probe().await;
                if !this.complete_liveness(generation, outcome).await {
                    break;
                }
            }
        });
        PollHandle::new(task)
    }

    async fn emit(&self, event: ConnectionEvent) {
        // A dropped UI receiver is not an error.
        let _ = self.events.send(event).await;
    }
}

/// Maps a probe outcome to a failure reason, or `None` on success.
///
/// Success is transport-success AND `ok: true`; everything else fails
/// uniformly, with the kind preserved in the reason text.
fn probe_failure(outcome: &Result<Ack, ApiError>) -> Option<String> {
    match outcome {
        Ok(ack) if ack.ok => None,
        Ok(ack) => Some(
            ack.detail
                .clone()
                .unwrap_or_else(|| "server reported failure".to_string()),
        ),
        Err(e) => Some(e.to_string()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ── Test doubles ──────────────────────────────────────────────────────────

    /// Records calls and answers every probe/execute with a fixed outcome.
    struct FixedApi {
        probe_outcome: Result<Ack, ApiError>,
        probe_calls: AtomicUsize,
        execute_calls: AtomicUsize,
    }

    impl FixedApi {
        fn ok() -> Self {
            Self {
                probe_outcome: Ok(Ack {
                    ok: true,
                    detail: None,
                }),
                probe_calls: AtomicUsize::new(0),
                execute_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RemoteApi for FixedApi {
        async fn execute(&self, _command: Command) -> Result<Ack, ApiError> {
            self.execute_calls.fetch_add(1, Ordering::SeqCst);
            self.probe_outcome.clone()
        }

        async fn probe(&self) -> Result<Ack, ApiError> {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            self.probe_outcome.clone()
        }
    }

    struct FixedFactory {
        api: Arc<FixedApi>,
        bound_urls: std::sync::Mutex<Vec<String>>,
    }

    impl FixedFactory {
        fn new(api: FixedApi) -> Arc<Self> {
            Arc::new(Self {
                api: Arc::new(api),
                bound_urls: std::sync::Mutex::new(Vec::new()),
            })
        }
    }

    impl RemoteApiFactory for FixedFactory {
        fn bind(&self, base_url: &str) -> Arc<dyn RemoteApi> {
            self.bound_urls.lock().unwrap().push(base_url.to_string());
            Arc::clone(&self.api) as Arc<dyn RemoteApi>
        }
    }

    // ── Intent validation ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_controller_starts_disconnected_without_poll() {
        let factory = FixedFactory::new(FixedApi::ok());
        let (controller, _rx) = ConnectionController::new(factory, ControllerConfig::default());

        assert_eq!(controller.state().await, ConnectionState::Disconnected);
        assert!(!controller.is_polling().await);
        assert_eq!(controller.session_address().await, None);
    }

    #[tokio::test]
    async fn test_connect_empty_address_is_rejected_without_session() {
        let factory = FixedFactory::new(FixedApi::ok());
        let (controller, _rx) =
            ConnectionController::new(Arc::clone(&factory) as _, ControllerConfig::default());

        let result = controller.connect("").await;
        assert!(matches!(result, Err(ControllerError::InvalidAddress(_))));

        // No session, no state change, no network binding at all.
        assert_eq!(controller.state().await, ConnectionState::Disconnected);
        assert!(factory.bound_urls.lock().unwrap().is_empty());
        assert_eq!(factory.api.probe_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_send_while_disconnected_makes_no_network_call() {
        let factory = FixedFactory::new(FixedApi::ok());
        let (controller, _rx) =
            ConnectionController::new(Arc::clone(&factory) as _, ControllerConfig::default());

        let result = controller.send(Command::Click).await;
        assert!(matches!(result, Err(ControllerError::NotConnected)));
        assert_eq!(factory.api.execute_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disconnect_when_already_disconnected_is_silent() {
        let factory = FixedFactory::new(FixedApi::ok());
        let (controller, mut rx) = ConnectionController::new(factory, ControllerConfig::default());

        controller.disconnect().await;
        assert!(rx.try_recv().is_err(), "no event for a no-op disconnect");
    }

    #[tokio::test]
    async fn test_connect_binds_base_url_with_fixed_port_and_scheme() {
        let factory = FixedFactory::new(FixedApi::ok());
        let (controller, mut rx) =
            ConnectionController::new(Arc::clone(&factory) as _, ControllerConfig::default());

        controller.connect("10.0.0.5").await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(ConnectionEvent::Connecting {
                address: "10.0.0.5".to_string()
            })
        );
        assert_eq!(
            controller.session_base_url().await.as_deref(),
            Some("http://10.0.0.5:5000/")
        );
    }

    #[tokio::test]
    async fn test_state_names_are_stable() {
        assert_eq!(ConnectionState::Disconnected.as_str(), "disconnected");
        assert_eq!(ConnectionState::Connecting.as_str(), "connecting");
        assert_eq!(ConnectionState::Connected.as_str(), "connected");
        assert_eq!(ConnectionState::Failed.as_str(), "failed");
    }
}
