//! Production Environment implementation using system time and RNG.
//!
//! Real wall-clock time and OS randomness: production behavior is
//! non-deterministic. Tests use the seeded environment from the harness.

use chrono::{DateTime, Utc};
use zenchat_core::Environment;

/// Production environment using the system clock and OS RNG.
///
/// # Panics
///
/// Panics if the OS RNG fails. Connection IDs must be unpredictable and
/// unique, and there is no meaningful way to continue without entropy.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::disallowed_methods)]
    fn wall_clock(&self) -> DateTime<Utc> {
        Utc::now()
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}
