//! ZenChat wire protocol.
//!
//! Every frame on the wire is a WebSocket text frame holding one JSON object
//! of the shape `{"type": string, "payload": object}`. Inbound frames decode
//! into [`ClientMessage`], outbound frames are produced from
//! [`ServerMessage`].
//!
//! The relay never interprets payloads beyond what routing needs: chat text,
//! emoji and reaction actions are carried through verbatim.
//!
//! # Invariants
//!
//! - The `type` tag uniquely identifies the payload shape (enforced by the
//!   adjacently tagged serde representation and exhaustive matches).
//! - Field names on the wire are camelCase (`roomId`, `isTyping`,
//!   `userCount`, `lastSeen`, `messageId`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod message;
mod presence;

pub use error::{ProtocolError, Result};
pub use message::{
    ChatBroadcast, ChatRequest, ClientMessage, JoinRequest, MemberSummary, ReactionAction,
    ReactionBroadcast, ReactionRequest, ServerMessage, StatusRequest, SystemNotice,
    TypingBroadcast, TypingRequest,
};
pub use presence::PresenceStatus;
