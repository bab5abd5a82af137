//! Sequence numbers for DeckTutor request signing.
//!
//! Every authenticated request carries a sequence number that is mixed into
//! its signature. The server rejects stale values, so the counter must only
//! ever move forward.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Trait for providing sequence numbers for authenticated requests.
pub trait SequenceProvider: Send + Sync {
    /// Advance the counter and return the new value.
    ///
    /// Each call returns exactly one more than the previous call.
    fn next_sequence(&self) -> u64;
}

/// A sequence counter seeded once from the clock and advanced by one per call.
#[derive(Debug)]
pub struct IncreasingSequence {
    counter: AtomicU64,
}

impl IncreasingSequence {
    /// Create a counter seeded with the current UNIX time in seconds.
    pub fn new() -> Self {
        Self::starting_at(Self::current_time_secs())
    }

    /// Create a counter whose first value will be `seed + 1`.
    pub fn starting_at(seed: u64) -> Self {
        Self {
            counter: AtomicU64::new(seed),
        }
    }

    /// The last value handed out (or the seed if none was).
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    fn current_time_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

impl Default for IncreasingSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceProvider for IncreasingSequence {
    fn next_sequence(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}
