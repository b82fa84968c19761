//! Driver error types.
//!
//! Only runtime bookkeeping bugs surface as errors. Bad client input
//! (malformed JSON, actions before `join`) is a per-frame condition that the
//! driver reports as a `Log` action and otherwise ignores.

use std::fmt;

use zenchat_core::ConnectionError;

/// Errors from [`ServerDriver`](crate::ServerDriver) event processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Connection not known to the driver.
    ///
    /// The runtime reported a milestone for a connection it never announced
    /// with `ConnectionAccepted`. Runtime bug.
    ConnectionNotFound(u64),

    /// Connection ID already in use.
    ///
    /// Connection IDs come from the environment RNG and must be unique for
    /// the lifetime of the process. A collision means broken randomness.
    ConnectionAlreadyExists(u64),

    /// Lifecycle transition rejected.
    ///
    /// For example a second `ConnectionOpened` for the same connection.
    Lifecycle {
        /// Connection that was affected
        session_id: u64,
        /// Underlying state machine error
        source: ConnectionError,
    },
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionNotFound(id) => write!(f, "connection not found: {id}"),
            Self::ConnectionAlreadyExists(id) => write!(f, "connection already exists: {id}"),
            Self::Lifecycle { session_id, source } => {
                write!(f, "connection {session_id}: {source}")
            },
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Lifecycle { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use zenchat_core::ConnectionState;

    use super::*;

    #[test]
    fn driver_error_display() {
        assert_eq!(DriverError::ConnectionNotFound(42).to_string(), "connection not found: 42");
        assert_eq!(
            DriverError::ConnectionAlreadyExists(7).to_string(),
            "connection already exists: 7"
        );
    }

    #[test]
    fn lifecycle_error_has_source() {
        let err = DriverError::Lifecycle {
            session_id: 3,
            source: ConnectionError::InvalidState {
                state: ConnectionState::Open,
                operation: "open",
            },
        };

        assert_eq!(
            err.to_string(),
            "connection 3: invalid state transition: cannot open from Open"
        );
        assert!(err.source().is_some());
    }
}
