//! ZenChat core.
//!
//! Pieces shared by the relay, the client-side view model and the simulation
//! harness:
//!
//! - [`Environment`]: wall clock and randomness, injected so that protocol
//!   logic is deterministic under test
//! - [`Connection`]: the transport-level lifecycle state machine
//!   (`Connecting` → `Open` → `Closed`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod connection;
pub mod env;
pub mod error;

pub use connection::{Connection, ConnectionState};
pub use env::Environment;
pub use error::ConnectionError;
