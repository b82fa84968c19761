//! Environment abstraction for deterministic testing.
//!
//! Decouples protocol logic from system resources (wall clock, randomness).
//! Production code uses the real clock and OS entropy; the simulation harness
//! uses a manual clock and a seeded RNG so that icon assignment, room ids and
//! timestamps are reproducible.

use chrono::{DateTime, Utc};

/// Abstract environment providing time and randomness.
///
/// # Invariants
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` fills the whole buffer
/// - Methods are infallible except in exceptional circumstances (e.g. OS
///   entropy exhaustion, incorrect simulation setup)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time.
    ///
    /// Used for server-assigned chat timestamps and last-activity tracking.
    /// Not required to be monotonic.
    fn wall_clock(&self) -> DateTime<Utc>;

    /// Fills the provided buffer with random bytes.
    ///
    /// Given the same seed, simulation implementations MUST produce the same
    /// sequence of bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    ///
    /// Convenience for connection ids and index selection.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Uniformly random index in `0..len`.
    ///
    /// Uses rejection sampling so that every index is equally likely
    /// regardless of `len`. Returns 0 when `len` is 0.
    fn random_index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }

        let bound = len as u64;
        // Values below `threshold` would bias the low indices.
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let candidate = self.random_u64();
            if candidate >= threshold {
                return (candidate % bound) as usize;
            }
        }
    }
}
