//! # remote-core
//!
//! Shared library for the TV remote control client containing the domain
//! entities and the HTTP/JSON wire contract spoken by the remote display
//! server.
//!
//! This crate is used by the client application (`remote-control`).
//! It has zero dependencies on sockets, HTTP libraries, or the async runtime.
//!
//! # Architecture overview
//!
//! The TV remote drives a single display device (a Raspberry Pi running a
//! Chromium kiosk) over a small JSON/HTTP API.  This crate defines:
//!
//! - **`domain`** – Pure business logic with no I/O dependencies: the closed
//!   set of remote [`Command`]s, navigation [`Direction`]s, and the validated
//!   server [`Address`].
//!
//! - **`protocol`** – How a command becomes an HTTP exchange.  Every command
//!   maps 1:1 to a [`RequestSpec`] (method + path + optional JSON body), and
//!   every response shares the [`ApiResponse`] shape.  The normalized outcome
//!   of an exchange is either an [`Ack`] (the exchange completed, successful
//!   or not) or an [`ApiError`] (the exchange itself failed).
//!
//! The connection state machine that consumes these types lives in the
//! application crate, not here.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `remote_core::Command` instead of `remote_core::domain::command::Command`.
pub use domain::command::{Address, AddressError, Command, Direction};
pub use protocol::generation::GenerationCounter;
pub use protocol::messages::{
    Ack, ApiError, ApiResponse, Method, RequestBody, RequestSpec, DEFAULT_REMOTE_PORT,
};
