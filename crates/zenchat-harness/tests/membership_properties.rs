//! Property tests for room membership and fan-out targets.
//!
//! Random operation sequences run against `SimHub` and a trivial reference
//! model (connection → room). After every step the relay's membership must
//! match the model, and every connection's inbox must have grown by exactly
//! the number of messages the model predicts for it.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use zenchat_proto::{ClientMessage, ServerMessage};
use zenchat_harness::{SimEnv, SimHub};

const ROOMS: [&str; 3] = ["R1", "R2", "R3"];
const NAMES: [&str; 4] = ["Alice", "Bob", "Carol", "Dave"];
const MAX_CONNECTIONS: usize = 6;

#[derive(Debug, Clone)]
enum Op {
    Connect,
    Join { conn: usize, room: usize, name: usize },
    Chat { conn: usize },
    Typing { conn: usize, on: bool },
    Reaction { conn: usize },
    Garbage { conn: usize },
    Disconnect { conn: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Connect),
        4 => (0..MAX_CONNECTIONS, 0..ROOMS.len(), 0..NAMES.len())
            .prop_map(|(conn, room, name)| Op::Join { conn, room, name }),
        3 => (0..MAX_CONNECTIONS).prop_map(|conn| Op::Chat { conn }),
        2 => (0..MAX_CONNECTIONS, any::<bool>()).prop_map(|(conn, on)| Op::Typing { conn, on }),
        1 => (0..MAX_CONNECTIONS).prop_map(|conn| Op::Reaction { conn }),
        1 => (0..MAX_CONNECTIONS).prop_map(|conn| Op::Garbage { conn }),
        2 => (0..MAX_CONNECTIONS).prop_map(|conn| Op::Disconnect { conn }),
    ]
}

/// Reference model: live connections and the room each one is in.
#[derive(Default)]
struct Model {
    rooms: BTreeMap<u64, Option<&'static str>>,
    /// Every connection ever opened, in open order
    opened: Vec<u64>,
}

impl Model {
    fn members(&self, room: &str) -> BTreeSet<u64> {
        self.rooms.iter().filter(|(_, r)| **r == Some(room)).map(|(id, _)| *id).collect()
    }

    fn room_of(&self, id: u64) -> Option<&'static str> {
        self.rooms.get(&id).copied().flatten()
    }
}

fn inbox_lengths(hub: &SimHub, model: &Model) -> BTreeMap<u64, usize> {
    model.opened.iter().map(|id| (*id, hub.inbox(*id).len())).collect()
}

fn run(ops: &[Op]) -> Result<(), TestCaseError> {
    let mut hub = SimHub::new(SimEnv::new());
    let mut model = Model::default();

    for op in ops {
        let before = inbox_lengths(&hub, &model);
        let pick = |conn: usize| model.opened.get(conn % model.opened.len().max(1)).copied();
        let mut expected: BTreeMap<u64, usize> = BTreeMap::new();

        match *op {
            Op::Connect => {
                let id = hub.connect().unwrap();
                model.rooms.insert(id, None);
                model.opened.push(id);
            },
            Op::Join { conn, room, name } => {
                let Some(id) = pick(conn) else { continue };
                let live = model.rooms.contains_key(&id);
                hub.send_raw(id, ClientMessage::join(ROOMS[room], NAMES[name]).encode().unwrap())
                    .unwrap_or_default();
                if live {
                    let old = model.room_of(id);
                    model.rooms.insert(id, Some(ROOMS[room]));
                    if let Some(old) = old.filter(|old| *old != ROOMS[room]) {
                        for m in model.members(old) {
                            *expected.entry(m).or_default() += 1;
                        }
                    }
                    for m in model.members(ROOMS[room]) {
                        *expected.entry(m).or_default() += 1;
                    }
                }
            },
            Op::Chat { conn } | Op::Reaction { conn } => {
                let Some(id) = pick(conn) else { continue };
                let msg = match op {
                    Op::Chat { .. } => ClientMessage::chat("hi"),
                    _ => ClientMessage::reaction("m", "👍", None),
                };
                hub.send_raw(id, msg.encode().unwrap()).unwrap_or_default();
                if let Some(room) = model.room_of(id) {
                    for m in model.members(room) {
                        *expected.entry(m).or_default() += 1;
                    }
                }
            },
            Op::Typing { conn, on } => {
                let Some(id) = pick(conn) else { continue };
                hub.send_raw(id, ClientMessage::typing(on).encode().unwrap()).unwrap_or_default();
                if let Some(room) = model.room_of(id) {
                    for m in model.members(room).into_iter().filter(|m| *m != id) {
                        *expected.entry(m).or_default() += 1;
                    }
                }
            },
            Op::Garbage { conn } => {
                let Some(id) = pick(conn) else { continue };
                hub.send_raw(id, "{\"type\":\"chat\"").unwrap_or_default();
            },
            Op::Disconnect { conn } => {
                let Some(id) = pick(conn) else { continue };
                hub.disconnect(id).unwrap();
                if let Some(Some(room)) = model.rooms.remove(&id) {
                    for m in model.members(room) {
                        *expected.entry(m).or_default() += 1;
                    }
                }
            },
        }

        for room in ROOMS {
            let actual: BTreeSet<u64> = hub.members(room).into_iter().collect();
            prop_assert_eq!(&actual, &model.members(room), "membership of {} after {:?}", room, op);
        }

        let after = inbox_lengths(&hub, &model);
        for (id, len) in &after {
            let grew = len - before.get(id).copied().unwrap_or(0);
            let want = expected.get(id).copied().unwrap_or(0);
            prop_assert_eq!(grew, want, "inbox of {} after {:?}", id, op);
        }

        // Every system notice reports its own roster size.
        for id in &model.opened {
            for msg in &hub.inbox(*id)[before.get(id).copied().unwrap_or(0)..] {
                if let ServerMessage::System(notice) = msg {
                    prop_assert_eq!(notice.user_count, notice.users.len());
                }
            }
        }
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn membership_matches_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
        run(&ops)?;
    }
}
