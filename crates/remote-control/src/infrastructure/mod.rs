//! Infrastructure services for the client application.
//!
//! Everything that touches the outside world lives here: the reqwest-backed
//! remote API, TOML config persistence, and the UI-facing bridge.  The
//! application layer sees only the traits these modules implement.

pub mod http;
pub mod storage;
pub mod ui_bridge;
