//! Domain entities for the TV remote control client.
//!
//! This module contains pure business logic with no infrastructure
//! dependencies.  It can be compiled and tested on any platform without any
//! external setup: no HTTP client, no async runtime, no OS APIs.
//!
//! The outer layers (the connection controller, the reqwest client, the UI
//! bridge) depend on these types; the domain never depends on them.

/// Remote commands, navigation directions, and the validated server address.
///
/// See [`command::Command`] for the main type.
pub mod command;
