//! Transport-level connection lifecycle.
//!
//! Pure state machine, no I/O. The runtime reports transport milestones and
//! the driver consults the state before routing frames.
//!
//! # State Machine
//!
//! ```text
//! ┌────────────┐  handshake done  ┌──────┐
//! │ Connecting │─────────────────>│ Open │
//! └────────────┘                  └──────┘
//!       │                             │
//!       │ handshake error             │ close / transport error
//!       ↓                             ↓
//!  ┌────────┐                    ┌────────┐
//!  │ Closed │                    │ Closed │
//!  └────────┘                    └────────┘
//! ```
//!
//! `Closed` is terminal. Closing twice is a no-op so that a close frame
//! followed by a transport error does not trigger cleanup twice.

use crate::error::ConnectionError;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport accepted, WebSocket handshake in progress
    Connecting,
    /// Handshake complete, frames may flow
    Open,
    /// Closed (graceful or error)
    Closed,
}

/// Lifecycle of a single transport connection.
#[derive(Debug, Clone)]
pub struct Connection {
    state: ConnectionState,
    frames_received: u64,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection {
    /// Create a new connection in [`ConnectionState::Connecting`].
    pub fn new() -> Self {
        Self { state: ConnectionState::Connecting, frames_received: 0 }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Frames may be routed.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Number of frames accepted while open.
    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Handshake completed.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if not in `Connecting`
    pub fn open(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Connecting {
            return Err(ConnectionError::InvalidState { state: self.state, operation: "open" });
        }
        self.state = ConnectionState::Open;
        Ok(())
    }

    /// Record an inbound frame.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if the connection is not open
    pub fn record_frame(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Open {
            return Err(ConnectionError::InvalidState {
                state: self.state,
                operation: "receive frame",
            });
        }
        self.frames_received += 1;
        Ok(())
    }

    /// Transition to `Closed`.
    ///
    /// Returns the state the connection was in, or `None` if it was already
    /// closed.
    pub fn close(&mut self) -> Option<ConnectionState> {
        if self.state == ConnectionState::Closed {
            return None;
        }
        let previous = self.state;
        self.state = ConnectionState::Closed;
        Some(previous)
    }
}
