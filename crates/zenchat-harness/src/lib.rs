//! Deterministic simulation harness for ZenChat relay testing.
//!
//! - [`SimEnv`]: seeded RNG and manual clock
//! - [`SimHub`]: socket-free relay with inspectable inboxes, for scenario
//!   and property tests
//! - [`run_sim_server`]: the production connection path on turmoil's
//!   simulated network

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_env;
pub mod sim_hub;
pub mod sim_server;

pub use sim_env::{DEFAULT_SEED, SimEnv};
pub use sim_hub::SimHub;
pub use sim_server::run_sim_server;
