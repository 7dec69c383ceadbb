//! Thread-safe generation counter for tagging in-flight operations.
//!
//! Every session the client establishes gets a fresh *generation* number,
//! and every asynchronous operation issued for that session (the connect
//! probe, periodic liveness probes, commands) is tagged with it.  When a
//! completion arrives, its tag is compared against the current generation:
//!
//! - **Match** – the completion belongs to the live session and is applied.
//! - **Mismatch** – the session it belonged to has been torn down
//!   (disconnect or reconnect happened in the meantime); the completion is
//!   discarded without touching state.
//!
//! This is what makes out-of-order completions safe: a stray probe response
//! arriving after the user cancelled can never resurrect a dead session.
//!
//! # Thread safety
//!
//! The counter uses `AtomicU64` internally, so it can be read from spawned
//! tasks without holding the controller lock.  `Ordering::Relaxed` is
//! sufficient: the counter only identifies sessions, it does not synchronise
//! memory between tasks.

use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter identifying the current session.
///
/// [`advance`](GenerationCounter::advance) returns the new generation;
/// [`current`](GenerationCounter::current) reads it without changing it.
/// The counter wraps around at `u64::MAX` without panicking.
///
/// # Examples
///
/// ```rust
/// use remote_core::GenerationCounter;
///
/// let counter = GenerationCounter::new();
/// let gen = counter.advance();
/// assert_eq!(counter.current(), gen);
/// assert!(counter.advance() > gen);
/// ```
#[derive(Debug, Default)]
pub struct GenerationCounter {
    inner: AtomicU64,
}

impl GenerationCounter {
    /// Creates a new counter.  The first [`advance`](Self::advance) returns 1,
    /// so generation 0 means "no session has ever been started".
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(0),
        }
    }

    /// Invalidates all outstanding tags and returns the new generation.
    ///
    /// Called on every connect, disconnect, and teardown: any completion
    /// tagged with an earlier value is stale from this point on.
    pub fn advance(&self) -> u64 {
        // `fetch_add` returns the value *before* the addition; the new
        // generation is one past it.  Wrapping is harmless: equality with an
        // old tag after 2^64 sessions is not a realistic concern.
        self.inner.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Returns the current generation without advancing.
    pub fn current(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }

    /// Returns true when `tag` identifies the live session.
    pub fn is_current(&self, tag: u64) -> bool {
        self.current() == tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fresh_counter_has_no_live_session() {
        let counter = GenerationCounter::new();
        assert_eq!(counter.current(), 0);
    }

    #[test]
    fn test_advance_returns_new_current_value() {
        let counter = GenerationCounter::new();
        let gen = counter.advance();
        assert_eq!(gen, 1);
        assert_eq!(counter.current(), 1);
    }

    #[test]
    fn test_advance_invalidates_previous_tag() {
        let counter = GenerationCounter::new();
        let first = counter.advance();
        assert!(counter.is_current(first));

        let second = counter.advance();
        assert!(!counter.is_current(first), "old tag must be stale");
        assert!(counter.is_current(second));
    }

    #[test]
    fn test_counter_wraps_without_panicking() {
        let counter = GenerationCounter {
            inner: AtomicU64::new(u64::MAX),
        };
        assert_eq!(counter.advance(), 0);
    }

    #[test]
    fn test_advance_is_unique_across_threads() {
        let counter = Arc::new(GenerationCounter::new());
        let thread_count = 8;
        let advances_per_thread = 1000;

        let handles: Vec<_> = (0..thread_count)
            .map(|_| {
                let c = Arc::clone(&counter);
                thread::spawn(move || {
                    (0..advances_per_thread)
                        .map(|_| c.advance())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all_values: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect();

        all_values.sort_unstable();
        all_values.dedup();
        assert_eq!(
            all_values.len(),
            thread_count * advances_per_thread,
            "every generation must be unique across threads"
        );
    }
}
