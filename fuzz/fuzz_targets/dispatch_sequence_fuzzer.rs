//! Fuzz target for driver event sequences
//!
//! Feeds arbitrary interleavings of connection lifecycle events and client
//! frames into `ServerDriver`.
//!
//! # Invariants
//!
//! - Every broadcast recipient is a live, joined connection
//! - Broadcast recipients never repeat within one action
//! - `system` notices report `userCount == users.len()`
//! - Closed connections never appear in any room
//! - NEVER panic

#![no_main]

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use arbitrary::Arbitrary;
use chrono::{DateTime, TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use zenchat_core::Environment;
use zenchat_proto::{ClientMessage, PresenceStatus, ServerMessage};
use zenchat_server::{DriverConfig, ServerAction, ServerDriver, ServerEvent};

const ROOMS: [&str; 3] = ["R1", "R2", " "];
const NAMES: [&str; 3] = ["Alice", "Bob", ""];

#[derive(Clone)]
struct FuzzEnv(Arc<AtomicU64>);

impl Environment for FuzzEnv {
    fn wall_clock(&self) -> DateTime<Utc> {
        let secs = self.0.load(Ordering::Relaxed) as i64;
        Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap_or_default()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let n = self.0.fetch_add(1, Ordering::Relaxed).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let bytes = n.to_be_bytes();
        for (i, b) in buffer.iter_mut().enumerate() {
            *b = bytes[i % 8];
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Accept { conn: u8 },
    Open { conn: u8 },
    Close { conn: u8 },
    Join { conn: u8, room: u8, name: u8 },
    Chat { conn: u8, text: String },
    Typing { conn: u8, on: bool },
    Reaction { conn: u8, action: Option<String> },
    Status { conn: u8, status: u8 },
    Raw { conn: u8, text: String },
}

fuzz_target!(|input: (bool, Vec<Op>)| {
    let (announce_room_switch, ops) = input;
    let config = DriverConfig { announce_room_switch, ..DriverConfig::default() };
    let mut driver = ServerDriver::new(FuzzEnv(Arc::new(AtomicU64::new(0))), config);
    let mut closed: HashSet<u64> = HashSet::new();

    for op in ops.into_iter().take(256) {
        let event = match op {
            Op::Accept { conn } => ServerEvent::ConnectionAccepted { session_id: id(conn) },
            Op::Open { conn } => ServerEvent::ConnectionOpened { session_id: id(conn) },
            Op::Close { conn } => {
                closed.insert(id(conn));
                ServerEvent::ConnectionClosed { session_id: id(conn), reason: "fuzz".into() }
            }
            Op::Join { conn, room, name } => text(
                conn,
                ClientMessage::join(
                    ROOMS[room as usize % ROOMS.len()],
                    NAMES[name as usize % NAMES.len()],
                ),
            ),
            Op::Chat { conn, text: t } => text(conn, ClientMessage::chat(t)),
            Op::Typing { conn, on } => text(conn, ClientMessage::typing(on)),
            Op::Reaction { conn, action } => {
                let frame = reaction_frame(action);
                ServerEvent::TextReceived { session_id: id(conn), text: frame }
            }
            Op::Status { conn, status } => {
                let status = match status % 3 {
                    0 => PresenceStatus::Online,
                    1 => PresenceStatus::Away,
                    _ => PresenceStatus::Busy,
                };
                text(conn, ClientMessage::status(status))
            }
            Op::Raw { conn, text } => ServerEvent::TextReceived { session_id: id(conn), text },
        };

        if let ServerEvent::ConnectionAccepted { session_id } = &event {
            closed.remove(session_id);
        }

        // Unknown or duplicate connection IDs come back as errors.
        let Ok(actions) = driver.process_event(event) else {
            continue;
        };

        for action in &actions {
            let ServerAction::Broadcast { recipients, message } = action else {
                continue;
            };

            let unique: HashSet<_> = recipients.iter().collect();
            assert_eq!(unique.len(), recipients.len(), "duplicate recipient");

            for recipient in recipients {
                assert!(!closed.contains(recipient), "closed connection is a recipient");
                assert!(driver.session(*recipient).is_some(), "unjoined recipient");
            }

            if let ServerMessage::System(notice) = message {
                assert_eq!(notice.user_count, notice.users.len());
            }
        }

        for room in ROOMS {
            for member in driver.members_of(room) {
                assert!(!closed.contains(&member), "closed connection still in {room}");
            }
        }
    }
});

fn id(conn: u8) -> u64 {
    u64::from(conn % 8)
}

fn text(conn: u8, message: ClientMessage) -> ServerEvent {
    let text = message.encode().unwrap_or_default();
    ServerEvent::TextReceived { session_id: id(conn), text }
}

/// Reaction frame with an arbitrary, possibly unknown, action string.
fn reaction_frame(action: Option<String>) -> String {
    match action {
        Some(action) => format!(
            r#"{{"type":"reaction","payload":{{"messageId":"m","emoji":"x","action":{action:?}}}}}"#
        ),
        None => r#"{"type":"reaction","payload":{"messageId":"m","emoji":"x"}}"#.to_string(),
    }
}
