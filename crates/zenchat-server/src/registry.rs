//! Connection registry and room index.
//!
//! The registry is the single source of truth for who is connected and which
//! room each connection is in. Rooms are never stored: membership is computed
//! on demand by filtering the live sessions by room identifier, so a room
//! exists exactly as long as one session names it and a removed connection
//! can never show up in a fan-out list.
//!
//! The registry itself is not synchronized. The driver owns it and the
//! runtime serializes all driver access behind one lock.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use zenchat_proto::{MemberSummary, PresenceStatus};

/// Session attributes of a joined connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Display name chosen on join
    pub name: String,
    /// Room the connection is in
    pub room: String,
    /// Icon assigned on join
    pub icon: String,
    /// Self-reported presence
    pub status: PresenceStatus,
    /// Last typing state reported
    pub typing: bool,
    /// Last activity (join, chat, typing, status)
    pub last_seen: DateTime<Utc>,
}

impl Session {
    /// Fresh session as created by a `join`.
    pub fn new(
        name: impl Into<String>,
        room: impl Into<String>,
        icon: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            room: room.into(),
            icon: icon.into(),
            status: PresenceStatus::Online,
            typing: false,
            last_seen: now,
        }
    }

    /// Record activity.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen = now;
    }

    /// Roster entry with name and icon only.
    pub fn summary(&self) -> MemberSummary {
        MemberSummary {
            name: self.name.clone(),
            icon: self.icon.clone(),
            status: None,
            last_seen: None,
        }
    }

    /// Roster entry including presence status and last activity.
    pub fn presence_summary(&self) -> MemberSummary {
        MemberSummary {
            status: Some(self.status),
            last_seen: Some(self.last_seen),
            ..self.summary()
        }
    }
}

#[derive(Debug, Default)]
struct Entry {
    session: Option<Session>,
    /// Order of the most recent join; meaningless while `session` is `None`
    join_seq: u64,
}

/// Registry of live connections and their sessions.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Connection ID → entry
    connections: HashMap<u64, Entry>,
    /// Next join sequence number
    next_join_seq: u64,
}

impl ConnectionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection without a session.
    ///
    /// Returns `false` if the connection is already registered.
    pub fn register(&mut self, session_id: u64) -> bool {
        if self.connections.contains_key(&session_id) {
            return false;
        }
        self.connections.insert(session_id, Entry::default());
        true
    }

    /// Remove a connection.
    ///
    /// Returns its session if it had joined a room. Removing an unknown
    /// connection is a no-op.
    pub fn unregister(&mut self, session_id: u64) -> Option<Session> {
        self.connections.remove(&session_id).and_then(|entry| entry.session)
    }

    /// Check if a connection is registered.
    pub fn is_registered(&self, session_id: u64) -> bool {
        self.connections.contains_key(&session_id)
    }

    /// Install (or replace) the session of a registered connection.
    ///
    /// Replacing moves the connection to the end of its room's join order.
    /// Returns `false` if the connection is not registered.
    pub fn set_session(&mut self, session_id: u64, session: Session) -> bool {
        let Some(entry) = self.connections.get_mut(&session_id) else {
            return false;
        };
        entry.session = Some(session);
        entry.join_seq = self.next_join_seq;
        self.next_join_seq += 1;
        true
    }

    /// Session of a connection. `None` if unknown or not joined.
    pub fn session(&self, session_id: u64) -> Option<&Session> {
        self.connections.get(&session_id).and_then(|entry| entry.session.as_ref())
    }

    /// Mutable session of a connection. `None` if unknown or not joined.
    pub fn session_mut(&mut self, session_id: u64) -> Option<&mut Session> {
        self.connections.get_mut(&session_id).and_then(|entry| entry.session.as_mut())
    }

    /// Members of a room with their sessions, in join order.
    pub fn roster(&self, room: &str) -> Vec<(u64, &Session)> {
        let mut members: Vec<(u64, u64, &Session)> = self
            .connections
            .iter()
            .filter_map(|(&id, entry)| {
                entry
                    .session
                    .as_ref()
                    .filter(|session| session.room == room)
                    .map(|session| (entry.join_seq, id, session))
            })
            .collect();
        members.sort_unstable_by_key(|(seq, ..)| *seq);
        members.into_iter().map(|(_, id, session)| (id, session)).collect()
    }

    /// Connection IDs in a room, in join order.
    pub fn members_of(&self, room: &str) -> Vec<u64> {
        self.roster(room).into_iter().map(|(id, _)| id).collect()
    }

    /// Total number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of connections holding a session.
    pub fn joined_count(&self) -> usize {
        self.connections.values().filter(|entry| entry.session.is_some()).count()
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.connections
            .values()
            .filter_map(|entry| entry.session.as_ref())
            .map(|session| session.room.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn session(name: &str, room: &str) -> Session {
        Session::new(name, room, "🦊", now())
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = ConnectionRegistry::new();

        assert!(registry.register(1));
        assert!(registry.is_registered(1));
        assert!(!registry.is_registered(2));
        assert!(registry.session(1).is_none());
    }

    #[test]
    fn register_duplicate_fails() {
        let mut registry = ConnectionRegistry::new();

        assert!(registry.register(1));
        assert!(!registry.register(1));
        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut registry = ConnectionRegistry::new();
        registry.register(1);
        registry.set_session(1, session("Alice", "R1"));

        assert_eq!(registry.unregister(1).map(|s| s.name), Some("Alice".to_string()));
        assert_eq!(registry.unregister(1), None);
        assert_eq!(registry.unregister(99), None);
        assert!(!registry.is_registered(1));
    }

    #[test]
    fn unregister_unjoined_returns_none() {
        let mut registry = ConnectionRegistry::new();
        registry.register(1);

        assert_eq!(registry.unregister(1), None);
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn set_session_requires_registration() {
        let mut registry = ConnectionRegistry::new();

        assert!(!registry.set_session(1, session("Alice", "R1")));
        assert!(registry.members_of("R1").is_empty());
    }

    #[test]
    fn members_exclude_unjoined_and_other_rooms() {
        let mut registry = ConnectionRegistry::new();
        for id in 1..=4 {
            registry.register(id);
        }
        registry.set_session(1, session("Alice", "R1"));
        registry.set_session(2, session("Bob", "R2"));
        registry.set_session(3, session("Carol", "R1"));

        assert_eq!(registry.members_of("R1"), vec![1, 3]);
        assert_eq!(registry.members_of("R2"), vec![2]);
        assert!(registry.members_of("R3").is_empty());
        assert_eq!(registry.joined_count(), 3);
        assert_eq!(registry.room_count(), 2);
    }

    #[test]
    fn rejoin_overwrites_membership() {
        let mut registry = ConnectionRegistry::new();
        registry.register(1);
        registry.register(2);
        registry.set_session(1, session("Alice", "R1"));
        registry.set_session(2, session("Bob", "R1"));

        registry.set_session(1, session("Alice", "R2"));

        assert_eq!(registry.members_of("R1"), vec![2]);
        assert_eq!(registry.members_of("R2"), vec![1]);
    }

    #[test]
    fn rejoin_same_room_moves_to_end() {
        let mut registry = ConnectionRegistry::new();
        registry.register(1);
        registry.register(2);
        registry.set_session(1, session("Alice", "R1"));
        registry.set_session(2, session("Bob", "R1"));

        registry.set_session(1, session("Alicia", "R1"));

        let names: Vec<_> =
            registry.roster("R1").into_iter().map(|(_, s)| s.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alicia"]);
    }

    #[test]
    fn room_disappears_with_last_member() {
        let mut registry = ConnectionRegistry::new();
        registry.register(1);
        registry.set_session(1, session("Alice", "R1"));
        assert_eq!(registry.room_count(), 1);

        registry.unregister(1);
        assert_eq!(registry.room_count(), 0);
        assert!(registry.members_of("R1").is_empty());
    }

    #[test]
    fn session_mut_updates_in_place() {
        let mut registry = ConnectionRegistry::new();
        registry.register(1);
        registry.set_session(1, session("Alice", "R1"));

        let later = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap();
        let s = registry.session_mut(1).unwrap();
        s.status = PresenceStatus::Busy;
        s.typing = true;
        s.touch(later);

        let s = registry.session(1).unwrap();
        assert_eq!(s.status, PresenceStatus::Busy);
        assert!(s.typing);
        assert_eq!(s.last_seen, later);
    }

    #[test]
    fn summaries() {
        let s = session("Alice", "R1");

        let basic = s.summary();
        assert_eq!(basic.name, "Alice");
        assert_eq!(basic.icon, "🦊");
        assert!(basic.status.is_none() && basic.last_seen.is_none());

        let presence = s.presence_summary();
        assert_eq!(presence.status, Some(PresenceStatus::Online));
        assert_eq!(presence.last_seen, Some(now()));
    }
}
