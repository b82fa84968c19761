//! Property tests for reaction reconstruction.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use zenchat_client::ReactionBook;
use zenchat_proto::ReactionBroadcast;

const MESSAGES: [&str; 3] = ["m1", "m2", "m3"];
const EMOJIS: [&str; 3] = ["👍", "🎉", "❤️"];
const USERS: [&str; 3] = ["Alice", "Bob", "Carol"];
const ACTIONS: [&str; 4] = ["toggle", "add", "remove", "wiggle"];

fn reaction_strategy() -> impl Strategy<Value = ReactionBroadcast> {
    (0..MESSAGES.len(), 0..EMOJIS.len(), 0..USERS.len(), 0..ACTIONS.len()).prop_map(
        |(m, e, u, a)| ReactionBroadcast {
            message_id: MESSAGES[m].into(),
            emoji: EMOJIS[e].into(),
            username: USERS[u].into(),
            action: ACTIONS[a].into(),
        },
    )
}

/// Book contents as sets, ignoring reaction order.
fn as_sets(book: &ReactionBook) -> BTreeMap<(String, String), BTreeSet<String>> {
    let mut sets = BTreeMap::new();
    for message in MESSAGES {
        for emoji in EMOJIS {
            let users = book.users(message, emoji);
            if !users.is_empty() {
                sets.insert(
                    (message.to_string(), emoji.to_string()),
                    users.iter().cloned().collect(),
                );
            }
        }
    }
    sets
}

proptest! {
    #[test]
    fn double_toggle_restores_set(
        history in prop::collection::vec(reaction_strategy(), 0..40),
        probe in reaction_strategy(),
    ) {
        let mut book = ReactionBook::new();
        for reaction in &history {
            book.apply(reaction);
        }
        let before = as_sets(&book);

        let toggle = ReactionBroadcast { action: "toggle".into(), ..probe };
        book.apply(&toggle);
        book.apply(&toggle);

        prop_assert_eq!(as_sets(&book), before);
    }

    #[test]
    fn no_duplicate_usernames(history in prop::collection::vec(reaction_strategy(), 0..60)) {
        let mut book = ReactionBook::new();
        for reaction in &history {
            book.apply(reaction);
        }

        for message in MESSAGES {
            for emoji in EMOJIS {
                let users = book.users(message, emoji);
                let unique: BTreeSet<_> = users.iter().collect();
                prop_assert_eq!(unique.len(), users.len());
            }
        }
    }

    #[test]
    fn empty_sets_are_pruned(history in prop::collection::vec(reaction_strategy(), 0..60)) {
        let mut book = ReactionBook::new();
        for reaction in &history {
            book.apply(reaction);
        }

        for message in MESSAGES {
            if let Some(emojis) = book.for_message(message) {
                prop_assert!(!emojis.is_empty());
                prop_assert!(emojis.values().all(|users| !users.is_empty()));
            }
        }
    }
}
