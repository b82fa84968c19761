//! Deterministic environment for simulation.
//!
//! Seeded ChaCha RNG plus a manual wall clock. Two `SimEnv`s built from the
//! same seed produce the same connection IDs, icons and room IDs, and time
//! only moves when a test calls [`SimEnv::advance`].

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use chrono::{DateTime, TimeZone, Utc};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use zenchat_core::Environment;

/// Seed used by [`SimEnv::new`].
pub const DEFAULT_SEED: u64 = 0x5EED;

/// Simulation environment. Clones share the RNG and the clock.
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
    clock: Arc<Mutex<DateTime<Utc>>>,
}

impl SimEnv {
    /// Environment seeded with [`DEFAULT_SEED`].
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Environment seeded with `seed`, clock at 2024-01-01T00:00:00Z.
    pub fn with_seed(seed: u64) -> Self {
        let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();
        Self {
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            clock: Arc::new(Mutex::new(epoch)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let step = chrono::Duration::from_std(by).unwrap_or(chrono::TimeDelta::MAX);
        let mut clock = lock(&self.clock);
        *clock = clock.checked_add_signed(step).unwrap_or(*clock);
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv").field("clock", &*lock(&self.clock)).finish_non_exhaustive()
    }
}

impl Environment for SimEnv {
    fn wall_clock(&self) -> DateTime<Utc> {
        *lock(&self.clock)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        lock(&self.rng).fill_bytes(buffer);
    }
}

/// Poisoning only happens after a panic in another test thread, and the
/// guarded values stay valid regardless.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
