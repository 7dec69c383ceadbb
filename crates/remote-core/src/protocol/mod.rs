//! Protocol module containing the HTTP/JSON wire contract and the session
//! generation counter.

pub mod generation;
pub mod messages;

pub use generation::GenerationCounter;
pub use messages::*;
