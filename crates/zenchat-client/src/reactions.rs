//! Reaction aggregate.
//!
//! The relay keeps no reaction state; every client rebuilds it from the
//! stream of `reaction` broadcasts. Entries are keyed by message ID, then
//! emoji, and hold the usernames that reacted in the order they reacted.
//! Empty emoji sets and messages without reactions are pruned so that a
//! toggle applied twice leaves the book exactly as it was.

use std::collections::{BTreeMap, HashMap};

use zenchat_proto::{ReactionAction, ReactionBroadcast};

/// Emoji → usernames, for a single message.
pub type EmojiReactions = BTreeMap<String, Vec<String>>;

/// Reactions for every message seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionBook {
    messages: HashMap<String, EmojiReactions>,
}

impl ReactionBook {
    /// Empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one broadcast. Returns whether the book changed.
    ///
    /// Unknown actions are ignored. `add` of a present user and `remove` of
    /// an absent user are no-ops.
    pub fn apply(&mut self, reaction: &ReactionBroadcast) -> bool {
        let Some(action) = ReactionAction::parse(&reaction.action) else {
            return false;
        };

        let present = self.has_reacted(&reaction.message_id, &reaction.emoji, &reaction.username);
        match (action, present) {
            (ReactionAction::Toggle | ReactionAction::Add, false) => {
                self.messages
                    .entry(reaction.message_id.clone())
                    .or_default()
                    .entry(reaction.emoji.clone())
                    .or_default()
                    .push(reaction.username.clone());
                true
            },
            (ReactionAction::Toggle | ReactionAction::Remove, true) => {
                self.remove(&reaction.message_id, &reaction.emoji, &reaction.username);
                true
            },
            (ReactionAction::Add, true) | (ReactionAction::Remove, false) => false,
        }
    }

    fn remove(&mut self, message_id: &str, emoji: &str, username: &str) {
        let Some(emojis) = self.messages.get_mut(message_id) else {
            return;
        };
        if let Some(users) = emojis.get_mut(emoji) {
            users.retain(|u| u != username);
            if users.is_empty() {
                emojis.remove(emoji);
            }
        }
        if emojis.is_empty() {
            self.messages.remove(message_id);
        }
    }

    /// Usernames that reacted to `message_id` with `emoji`, in order.
    pub fn users(&self, message_id: &str, emoji: &str) -> &[String] {
        self.messages
            .get(message_id)
            .and_then(|emojis| emojis.get(emoji))
            .map_or(&[], Vec::as_slice)
    }

    /// Whether `username` reacted to `message_id` with `emoji`.
    pub fn has_reacted(&self, message_id: &str, emoji: &str, username: &str) -> bool {
        self.users(message_id, emoji).iter().any(|u| u == username)
    }

    /// All reactions on a message. `None` if it has none.
    pub fn for_message(&self, message_id: &str) -> Option<&EmojiReactions> {
        self.messages.get(message_id)
    }

    /// No reactions at all.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction(user: &str, emoji: &str, action: &str) -> ReactionBroadcast {
        ReactionBroadcast {
            message_id: "m1".into(),
            emoji: emoji.into(),
            username: user.into(),
            action: action.into(),
        }
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut book = ReactionBook::new();

        assert!(book.apply(&reaction("Alice", "👍", "toggle")));
        assert_eq!(book.users("m1", "👍"), ["Alice".to_string()]);

        assert!(book.apply(&reaction("Alice", "👍", "toggle")));
        assert!(book.users("m1", "👍").is_empty());
        assert!(book.is_empty());
    }

    #[test]
    fn users_kept_in_reaction_order() {
        let mut book = ReactionBook::new();
        book.apply(&reaction("Bob", "🎉", "toggle"));
        book.apply(&reaction("Alice", "🎉", "toggle"));
        book.apply(&reaction("Carol", "🎉", "add"));

        assert_eq!(book.users("m1", "🎉"), ["Bob", "Alice", "Carol"].map(String::from));
    }

    #[test]
    fn add_and_remove_are_idempotent() {
        let mut book = ReactionBook::new();

        assert!(book.apply(&reaction("Alice", "❤️", "add")));
        assert!(!book.apply(&reaction("Alice", "❤️", "add")));
        assert_eq!(book.users("m1", "❤️").len(), 1);

        assert!(book.apply(&reaction("Alice", "❤️", "remove")));
        assert!(!book.apply(&reaction("Alice", "❤️", "remove")));
        assert!(book.is_empty());
    }

    #[test]
    fn unknown_action_ignored() {
        let mut book = ReactionBook::new();

        assert!(!book.apply(&reaction("Alice", "👍", "explode")));
        assert!(book.is_empty());
    }

    #[test]
    fn emojis_are_independent() {
        let mut book = ReactionBook::new();
        book.apply(&reaction("Alice", "👍", "toggle"));
        book.apply(&reaction("Alice", "🎉", "toggle"));
        book.apply(&reaction("Alice", "👍", "toggle"));

        let emojis = book.for_message("m1").unwrap();
        assert_eq!(emojis.len(), 1);
        assert!(book.has_reacted("m1", "🎉", "Alice"));
        assert!(!book.has_reacted("m1", "👍", "Alice"));
    }
}
