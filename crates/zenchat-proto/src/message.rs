//! Inbound and outbound message shapes.
//!
//! Both directions use serde's adjacently tagged representation so that a
//! variant serializes as `{"type": "<variant>", "payload": {...}}`. The set
//! of inbound and outbound variants is closed: an unknown `type` is a
//! protocol error, never a silently ignored frame.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    PresenceStatus,
    error::{ProtocolError, Result},
};

/// Frames sent by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Enter (or switch to) a room
    Join(JoinRequest),
    /// Post chat text to the current room
    Chat(ChatRequest),
    /// Start or stop the typing indicator
    Typing(TypingRequest),
    /// React to a message with an emoji
    Reaction(ReactionRequest),
    /// Change presence status
    Status(StatusRequest),
}

/// Payload of a `join` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Room to join; rooms are created implicitly by naming them
    pub room_id: String,
    /// Display name for this session
    pub name: String,
}

/// Payload of an inbound `chat` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Chat text, relayed verbatim (empty text is allowed)
    pub message: String,
}

/// Payload of an inbound `typing` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingRequest {
    /// Whether the sender is currently typing
    pub is_typing: bool,
}

/// Payload of an inbound `reaction` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    /// Identifier of the message being reacted to
    pub message_id: String,
    /// Emoji, relayed verbatim
    pub emoji: String,
    /// Requested action; `toggle` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl ReactionRequest {
    /// Action to relay, falling back to [`ReactionAction::Toggle`].
    pub fn action_or_default(&self) -> &str {
        self.action.as_deref().unwrap_or(ReactionAction::Toggle.as_str())
    }
}

/// Payload of an inbound `status` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    /// New presence status
    pub status: PresenceStatus,
}

/// Reaction actions understood by receivers.
///
/// The relay forwards the action string untouched, so receivers may see
/// values outside this set and must ignore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionAction {
    /// Add the reactor if absent, remove otherwise
    Toggle,
    /// Add the reactor (no-op if present)
    Add,
    /// Remove the reactor (no-op if absent)
    Remove,
}

impl ReactionAction {
    /// Parse a wire action. `None` for unknown actions.
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "toggle" => Some(Self::Toggle),
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }

    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

impl ClientMessage {
    /// Build a `join` frame.
    pub fn join(room_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Join(JoinRequest { room_id: room_id.into(), name: name.into() })
    }

    /// Build a `chat` frame.
    pub fn chat(message: impl Into<String>) -> Self {
        Self::Chat(ChatRequest { message: message.into() })
    }

    /// Build a `typing` frame.
    pub fn typing(is_typing: bool) -> Self {
        Self::Typing(TypingRequest { is_typing })
    }

    /// Build a `reaction` frame. `action` of `None` means toggle.
    pub fn reaction(
        message_id: impl Into<String>,
        emoji: impl Into<String>,
        action: Option<ReactionAction>,
    ) -> Self {
        Self::Reaction(ReactionRequest {
            message_id: message_id.into(),
            emoji: emoji.into(),
            action: action.map(|a| a.as_str().to_string()),
        })
    }

    /// Build a `status` frame.
    pub fn status(status: PresenceStatus) -> Self {
        Self::Status(StatusRequest { status })
    }

    /// Wire `type` of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Chat(_) => "chat",
            Self::Typing(_) => "typing",
            Self::Reaction(_) => "reaction",
            Self::Status(_) => "status",
        }
    }

    /// Decode and validate one inbound text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Malformed` if the text is not JSON, the `type` is
    ///   unknown, or a required field is missing or mistyped
    /// - `ProtocolError::InvalidField` if a `join` names a blank room or
    ///   display name
    pub fn decode(text: &str) -> Result<Self> {
        let message: Self =
            serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        message.validate()?;
        Ok(message)
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if let Self::Join(join) = self {
            if join.room_id.trim().is_empty() {
                return Err(ProtocolError::InvalidField { field: "roomId", reason: "blank" });
            }
            if join.name.trim().is_empty() {
                return Err(ProtocolError::InvalidField { field: "name", reason: "blank" });
            }
        }
        Ok(())
    }
}

/// Frames sent by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Membership or presence change in the room
    System(SystemNotice),
    /// Chat text from a room member
    Chat(ChatBroadcast),
    /// Typing indicator of another member
    Typing(TypingBroadcast),
    /// Reaction from a room member
    Reaction(ReactionBroadcast),
}

/// Payload of a `system` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemNotice {
    /// Human-readable description of what happened
    pub message: String,
    /// Number of members in the room after the change
    pub user_count: usize,
    /// Room roster in join order
    pub users: Vec<MemberSummary>,
}

/// One entry of a room roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    /// Display name
    pub name: String,
    /// Assigned icon
    pub icon: String,
    /// Presence status (only on presence notices)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PresenceStatus>,
    /// Last activity time (only on presence notices)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

/// Payload of an outbound `chat` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatBroadcast {
    /// Sender display name
    pub name: String,
    /// Chat text
    pub message: String,
    /// Sender icon
    pub icon: String,
    /// Time the relay dispatched the message
    pub timestamp: DateTime<Utc>,
}

/// Payload of an outbound `typing` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingBroadcast {
    /// Display name of the typist
    pub name: String,
    /// Whether they are typing
    pub is_typing: bool,
}

/// Payload of an outbound `reaction` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionBroadcast {
    /// Message being reacted to
    pub message_id: String,
    /// Emoji
    pub emoji: String,
    /// Display name of the reactor
    pub username: String,
    /// Action as sent by the reactor (`toggle` if they sent none)
    pub action: String,
}

impl ServerMessage {
    /// Wire `type` of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::System(_) => "system",
            Self::Chat(_) => "chat",
            Self::Typing(_) => "typing",
            Self::Reaction(_) => "reaction",
        }
    }

    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Decode one outbound text frame (client side).
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn decodes_join() {
        let msg = ClientMessage::decode(r#"{"type":"join","payload":{"roomId":"R1","name":"Alice"}}"#)
            .unwrap();
        assert_eq!(msg, ClientMessage::join("R1", "Alice"));
        assert_eq!(msg.kind(), "join");
    }

    #[test]
    fn decodes_payload_before_type() {
        let msg = ClientMessage::decode(r#"{"payload":{"message":"hi"},"type":"chat"}"#).unwrap();
        assert_eq!(msg, ClientMessage::chat("hi"));
    }

    #[test]
    fn decodes_empty_chat() {
        let msg = ClientMessage::decode(r#"{"type":"chat","payload":{"message":""}}"#).unwrap();
        assert_eq!(msg, ClientMessage::chat(""));
    }

    #[test]
    fn decodes_typing_and_status() {
        let typing =
            ClientMessage::decode(r#"{"type":"typing","payload":{"isTyping":true}}"#).unwrap();
        assert_eq!(typing, ClientMessage::typing(true));

        let status =
            ClientMessage::decode(r#"{"type":"status","payload":{"status":"busy"}}"#).unwrap();
        assert_eq!(status, ClientMessage::status(PresenceStatus::Busy));
    }

    #[test]
    fn reaction_action_defaults_to_toggle() {
        let msg = ClientMessage::decode(
            r#"{"type":"reaction","payload":{"messageId":"m1","emoji":"👍"}}"#,
        )
        .unwrap();

        let ClientMessage::Reaction(reaction) = msg else {
            panic!("expected reaction");
        };
        assert_eq!(reaction.action, None);
        assert_eq!(reaction.action_or_default(), "toggle");
    }

    #[test]
    fn reaction_keeps_unknown_action() {
        let msg = ClientMessage::decode(
            r#"{"type":"reaction","payload":{"messageId":"m1","emoji":"🎉","action":"shout"}}"#,
        )
        .unwrap();

        let ClientMessage::Reaction(reaction) = msg else {
            panic!("expected reaction");
        };
        assert_eq!(reaction.action_or_default(), "shout");
        assert_eq!(ReactionAction::parse("shout"), None);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(ClientMessage::decode("not json"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(ClientMessage::decode("{}"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(
            ClientMessage::decode(r#"{"type":"dance","payload":{}}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(matches!(
            ClientMessage::decode(r#"{"type":"chat","payload":{}}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            ClientMessage::decode(r#"{"type":"chat"}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            ClientMessage::decode(r#"{"type":"join","payload":{"roomId":"R1"}}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            ClientMessage::decode(r#"{"type":"status","payload":{"status":"asleep"}}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_blank_join_fields() {
        assert_eq!(
            ClientMessage::decode(r#"{"type":"join","payload":{"roomId":"  ","name":"Alice"}}"#),
            Err(ProtocolError::InvalidField { field: "roomId", reason: "blank" })
        );
        assert_eq!(
            ClientMessage::decode(r#"{"type":"join","payload":{"roomId":"R1","name":""}}"#),
            Err(ProtocolError::InvalidField { field: "name", reason: "blank" })
        );
    }

    #[test]
    fn system_notice_uses_wire_field_names() {
        let notice = ServerMessage::System(SystemNotice {
            message: "Alice joined the room".to_string(),
            user_count: 1,
            users: vec![MemberSummary {
                name: "Alice".to_string(),
                icon: "🦊".to_string(),
                status: None,
                last_seen: None,
            }],
        });

        let value: Value = serde_json::from_str(&notice.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "system",
                "payload": {
                    "message": "Alice joined the room",
                    "userCount": 1,
                    "users": [{ "name": "Alice", "icon": "🦊" }]
                }
            })
        );
    }

    #[test]
    fn presence_roster_includes_status_and_last_seen() {
        let seen = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let member = MemberSummary {
            name: "Bob".to_string(),
            icon: "🐼".to_string(),
            status: Some(PresenceStatus::Away),
            last_seen: Some(seen),
        };

        let value = serde_json::to_value(&member).unwrap();
        assert_eq!(value["status"], "away");
        let last_seen = value["lastSeen"].as_str().unwrap();
        assert!(last_seen.starts_with("2024-05-01T12:30:00"));
        assert!(last_seen.ends_with('Z'));
    }

    #[test]
    fn chat_timestamp_is_iso8601() {
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let chat = ServerMessage::Chat(ChatBroadcast {
            name: "Alice".to_string(),
            message: "hi".to_string(),
            icon: "🦊".to_string(),
            timestamp,
        });

        let encoded = chat.encode().unwrap();
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["type"], "chat");
        assert!(value["payload"]["timestamp"].as_str().unwrap().starts_with("2024-05-01T12:30:00"));

        assert_eq!(ServerMessage::decode(&encoded).unwrap(), chat);
    }

    #[test]
    fn typing_and_reaction_use_wire_field_names() {
        let typing = ServerMessage::Typing(TypingBroadcast {
            name: "Bob".to_string(),
            is_typing: false,
        });
        let value: Value = serde_json::from_str(&typing.encode().unwrap()).unwrap();
        assert_eq!(value, json!({"type": "typing", "payload": {"name": "Bob", "isTyping": false}}));

        let reaction = ServerMessage::Reaction(ReactionBroadcast {
            message_id: "m1".to_string(),
            emoji: "👍".to_string(),
            username: "Bob".to_string(),
            action: "toggle".to_string(),
        });
        let value: Value = serde_json::from_str(&reaction.encode().unwrap()).unwrap();
        assert_eq!(value["payload"]["messageId"], "m1");
        assert_eq!(value["payload"]["username"], "Bob");
        assert_eq!(value["payload"]["action"], "toggle");
    }

    proptest::proptest! {
        #[test]
        fn decode_never_panics(text in ".*") {
            let _ = ClientMessage::decode(&text);
        }

        #[test]
        fn chat_text_is_relayed_verbatim(text in ".*") {
            let frame = ClientMessage::chat(text.clone()).encode().unwrap();
            proptest::prop_assert_eq!(ClientMessage::decode(&frame).unwrap(), ClientMessage::chat(text));
        }
    }
}
