//! Receiving-side view of one room.
//!
//! [`RoomView`] folds the server's outbound stream into the state a client
//! renders: member count and roster from the latest `system` notice, a
//! timeline of notices and chats, the set of peers currently typing, and the
//! reaction aggregate.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use zenchat_proto::{ChatBroadcast, MemberSummary, ServerMessage};

use crate::reactions::ReactionBook;

/// Identifier receivers derive for a chat message: `<unix-millis>-<name>`.
///
/// Every member of a room sees the same server timestamp and sender name,
/// so they all compute the same ID and can address reactions to it.
pub fn chat_message_id(timestamp: &DateTime<Utc>, name: &str) -> String {
    format!("{}-{name}", timestamp.timestamp_millis())
}

/// One rendered line of the room timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEntry {
    /// Server notice (join, leave, status change)
    Notice {
        /// Notice text
        text: String,
    },
    /// Chat message
    Chat {
        /// Derived message ID, see [`chat_message_id`]
        id: String,
        /// Sender display name
        name: String,
        /// Sender icon
        icon: String,
        /// Message text
        message: String,
        /// Server-assigned timestamp
        timestamp: DateTime<Utc>,
    },
}

/// Client-side state of the room it has joined.
#[derive(Debug, Clone, Default)]
pub struct RoomView {
    user_count: usize,
    members: Vec<MemberSummary>,
    timeline: Vec<TimelineEntry>,
    typing: BTreeSet<String>,
    reactions: ReactionBook,
}

impl RoomView {
    /// Empty view, before any message has arrived.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one server message into the view.
    pub fn apply(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::System(notice) => {
                self.user_count = notice.user_count;
                self.members.clone_from(&notice.users);
                // Peers that left cannot still be typing.
                let present: BTreeSet<&str> =
                    notice.users.iter().map(|user| user.name.as_str()).collect();
                self.typing.retain(|name| present.contains(name.as_str()));
                self.timeline.push(TimelineEntry::Notice { text: notice.message.clone() });
            },
            ServerMessage::Chat(chat) => {
                self.typing.remove(&chat.name);
                self.timeline.push(chat_entry(chat));
            },
            ServerMessage::Typing(typing) => {
                if typing.is_typing {
                    self.typing.insert(typing.name.clone());
                } else {
                    self.typing.remove(&typing.name);
                }
            },
            ServerMessage::Reaction(reaction) => {
                self.reactions.apply(reaction);
            },
        }
    }

    /// Member count from the latest notice.
    pub fn user_count(&self) -> usize {
        self.user_count
    }

    /// Roster from the latest notice, in join order.
    pub fn members(&self) -> &[MemberSummary] {
        &self.members
    }

    /// Timeline in arrival order.
    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    /// Peers currently typing, sorted by name.
    pub fn typing(&self) -> impl Iterator<Item = &str> {
        self.typing.iter().map(String::as_str)
    }

    /// Whether `name` is currently typing.
    pub fn is_typing(&self, name: &str) -> bool {
        self.typing.contains(name)
    }

    /// Reactions received so far.
    pub fn reactions(&self) -> &ReactionBook {
        &self.reactions
    }

    /// ID of the most recent chat message, if any.
    pub fn last_chat_id(&self) -> Option<&str> {
        self.timeline.iter().rev().find_map(|entry| match entry {
            TimelineEntry::Chat { id, .. } => Some(id.as_str()),
            TimelineEntry::Notice { .. } => None,
        })
    }
}

fn chat_entry(chat: &ChatBroadcast) -> TimelineEntry {
    TimelineEntry::Chat {
        id: chat_message_id(&chat.timestamp, &chat.name),
        name: chat.name.clone(),
        icon: chat.icon.clone(),
        message: chat.message.clone(),
        timestamp: chat.timestamp,
    }
}
