//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding or encoding wire frames.
///
/// Decoding errors are always the peer's fault (malformed JSON, unknown
/// `type`, missing or mistyped fields). They are never fatal for the
/// connection: the relay logs and drops the frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is not valid JSON or does not match any known message shape
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Frame decoded but a required field is empty
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Wire name of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: &'static str,
    },

    /// Outbound message could not be serialized
    #[error("failed to encode frame: {0}")]
    Encode(String),
}
