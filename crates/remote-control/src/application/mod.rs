//! Application layer: use cases built on traits and domain types only.
//!
//! The connection controller here depends on the [`connection::RemoteApi`]
//! trait, never on a concrete HTTP client.  The reqwest implementation is
//! injected from the infrastructure layer at construction time, which keeps
//! the whole state machine unit-testable with scripted doubles.

pub mod connection;
