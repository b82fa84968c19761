//! Server driver.
//!
//! Ties together the per-connection lifecycle state machines, the
//! [`ConnectionRegistry`] (session and room membership) and the icon set.
//! Pure logic: the runtime feeds [`ServerEvent`]s in and executes the
//! returned [`ServerAction`]s.

use std::collections::HashMap;

use zenchat_core::{Connection, ConnectionState, Environment};
use zenchat_proto::{
    ChatBroadcast, ChatRequest, ClientMessage, JoinRequest, MemberSummary, ReactionBroadcast,
    ReactionRequest, ServerMessage, StatusRequest, SystemNotice, TypingBroadcast, TypingRequest,
};

use crate::{
    icons::IconSet,
    registry::{ConnectionRegistry, Session},
    server_error::DriverError,
};

/// Driver configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Send a "left the room" notice to the old room when a member joins a
    /// different room
    pub announce_room_switch: bool,
    /// Icons assigned on join
    pub icons: IconSet,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { announce_room_switch: true, icons: IconSet::default() }
    }
}

/// Events that the server driver processes.
///
/// These are produced by the external runtime (production or simulation).
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// Transport accepted a connection; WebSocket handshake pending
    ConnectionAccepted {
        /// Unique connection ID assigned by the runtime
        session_id: u64,
    },

    /// WebSocket handshake completed
    ConnectionOpened {
        /// Connection that completed the handshake
        session_id: u64,
    },

    /// A text frame was received from a connection
    TextReceived {
        /// Connection that sent the frame
        session_id: u64,
        /// Raw frame contents
        text: String,
    },

    /// A connection was closed (by peer, handshake failure or error)
    ConnectionClosed {
        /// Connection that was closed
        session_id: u64,
        /// Reason for closure
        reason: String,
    },
}

/// Actions that the server driver produces.
///
/// These are executed by runtime-specific code (production or simulation).
#[derive(Debug, Clone, PartialEq)]
pub enum ServerAction {
    /// Deliver a message to each listed connection
    Broadcast {
        /// Target connections, in room join order
        recipients: Vec<u64>,
        /// Message to deliver
        message: ServerMessage,
    },

    /// Log a message (for debugging/monitoring)
    Log {
        /// Log level
        level: LogLevel,
        /// Message to log
        message: String,
    },
}

/// Log levels for server actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}

/// Which member details a `system` roster carries.
#[derive(Debug, Clone, Copy)]
enum Roster {
    /// `{name, icon}`
    Basic,
    /// `{name, icon, status, lastSeen}`
    Presence,
}

/// Action-based server driver.
///
/// Owns all relay state. Every event is processed to completion before the
/// next one, so membership is never observed half-updated.
pub struct ServerDriver<E: Environment> {
    /// Lifecycle state per connection
    connections: HashMap<u64, Connection>,
    /// Sessions and room membership
    registry: ConnectionRegistry,
    /// Time and randomness
    env: E,
    /// Configuration
    config: DriverConfig,
}

impl<E: Environment> ServerDriver<E> {
    /// Create a new server driver.
    pub fn new(env: E, config: DriverConfig) -> Self {
        Self { connections: HashMap::new(), registry: ConnectionRegistry::new(), env, config }
    }

    /// Process an event and return actions to execute.
    ///
    /// # Errors
    ///
    /// Only runtime bookkeeping bugs are errors (unknown or duplicate
    /// connection IDs, invalid lifecycle transitions). Client mistakes are
    /// reported as [`ServerAction::Log`].
    pub fn process_event(&mut self, event: ServerEvent) -> Result<Vec<ServerAction>, DriverError> {
        match event {
            ServerEvent::ConnectionAccepted { session_id } => {
                self.handle_connection_accepted(session_id)
            },
            ServerEvent::ConnectionOpened { session_id } => self.handle_connection_opened(session_id),
            ServerEvent::TextReceived { session_id, text } => {
                self.handle_text_received(session_id, &text)
            },
            ServerEvent::ConnectionClosed { session_id, reason } => {
                Ok(self.handle_connection_closed(session_id, &reason))
            },
        }
    }

    fn handle_connection_accepted(&mut self, session_id: u64) -> Result<Vec<ServerAction>, DriverError> {
        if self.connections.contains_key(&session_id) {
            return Err(DriverError::ConnectionAlreadyExists(session_id));
        }

        self.connections.insert(session_id, Connection::new());
        self.registry.register(session_id);

        Ok(vec![log(LogLevel::Debug, format!("connection {session_id} accepted"))])
    }

    fn handle_connection_opened(&mut self, session_id: u64) -> Result<Vec<ServerAction>, DriverError> {
        let conn = self
            .connections
            .get_mut(&session_id)
            .ok_or(DriverError::ConnectionNotFound(session_id))?;

        conn.open().map_err(|source| DriverError::Lifecycle { session_id, source })?;

        Ok(vec![log(LogLevel::Debug, format!("connection {session_id} open"))])
    }

    fn handle_text_received(
        &mut self,
        session_id: u64,
        text: &str,
    ) -> Result<Vec<ServerAction>, DriverError> {
        let conn = self
            .connections
            .get_mut(&session_id)
            .ok_or(DriverError::ConnectionNotFound(session_id))?;

        if let Err(e) = conn.record_frame() {
            return Ok(vec![log(
                LogLevel::Warn,
                format!("dropping frame from connection {session_id}: {e}"),
            )]);
        }

        let message = match ClientMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                return Ok(vec![log(
                    LogLevel::Warn,
                    format!("dropping malformed frame from connection {session_id}: {e}"),
                )]);
            },
        };

        let actions = match message {
            ClientMessage::Join(request) => self.handle_join(session_id, request),
            ClientMessage::Chat(request) => self.handle_chat(session_id, request),
            ClientMessage::Typing(request) => self.handle_typing(session_id, request),
            ClientMessage::Reaction(request) => self.handle_reaction(session_id, request),
            ClientMessage::Status(request) => self.handle_status(session_id, request),
        };

        Ok(actions)
    }

    fn handle_join(&mut self, session_id: u64, request: JoinRequest) -> Vec<ServerAction> {
        let JoinRequest { room_id, name } = request;
        let icon = self.config.icons.pick(&self.env).to_string();
        let session = Session::new(name.clone(), room_id.clone(), icon, self.env.wall_clock());

        let previous = self.registry.session(session_id).cloned();
        self.registry.set_session(session_id, session);

        let mut actions = Vec::new();

        if let Some(previous) = previous.filter(|p| p.room != room_id) {
            actions.push(log(
                LogLevel::Info,
                format!("connection {session_id} switched from room {} to {room_id}", previous.room),
            ));
            if self.config.announce_room_switch {
                actions.extend(self.system_notice(
                    &previous.room,
                    format!("{} left the room", previous.name),
                    Roster::Basic,
                ));
            }
        }

        actions.push(log(
            LogLevel::Info,
            format!("connection {session_id} joined room {room_id} as {name}"),
        ));
        actions.extend(self.system_notice(&room_id, format!("{name} joined the room"), Roster::Basic));
        actions
    }

    fn handle_chat(&mut self, session_id: u64, request: ChatRequest) -> Vec<ServerAction> {
        let now = self.env.wall_clock();
        let Some(session) = self.registry.session_mut(session_id) else {
            return vec![not_joined(session_id, "chat")];
        };
        session.touch(now);

        let message = ServerMessage::Chat(ChatBroadcast {
            name: session.name.clone(),
            message: request.message,
            icon: session.icon.clone(),
            timestamp: now,
        });
        let room = session.room.clone();

        self.broadcast(&room, None, message).into_iter().collect()
    }

    fn handle_typing(&mut self, session_id: u64, request: TypingRequest) -> Vec<ServerAction> {
        let now = self.env.wall_clock();
        let Some(session) = self.registry.session_mut(session_id) else {
            return vec![not_joined(session_id, "typing")];
        };
        session.typing = request.is_typing;
        session.touch(now);

        let message = ServerMessage::Typing(TypingBroadcast {
            name: session.name.clone(),
            is_typing: request.is_typing,
        });
        let room = session.room.clone();

        self.broadcast(&room, Some(session_id), message).into_iter().collect()
    }

    fn handle_reaction(&mut self, session_id: u64, request: ReactionRequest) -> Vec<ServerAction> {
        let Some(session) = self.registry.session(session_id) else {
            return vec![not_joined(session_id, "reaction")];
        };

        let message = ServerMessage::Reaction(ReactionBroadcast {
            action: request.action_or_default().to_string(),
            message_id: request.message_id,
            emoji: request.emoji,
            username: session.name.clone(),
        });
        let room = session.room.clone();

        self.broadcast(&room, None, message).into_iter().collect()
    }

    fn handle_status(&mut self, session_id: u64, request: StatusRequest) -> Vec<ServerAction> {
        let now = self.env.wall_clock();
        let Some(session) = self.registry.session_mut(session_id) else {
            return vec![not_joined(session_id, "status")];
        };
        session.status = request.status;
        session.touch(now);

        let text = format!("{} is now {}", session.name, request.status);
        let room = session.room.clone();

        self.system_notice(&room, text, Roster::Presence).into_iter().collect()
    }

    fn handle_connection_closed(&mut self, session_id: u64, reason: &str) -> Vec<ServerAction> {
        let Some(mut conn) = self.connections.remove(&session_id) else {
            return vec![log(
                LogLevel::Debug,
                format!("ignoring close of unknown connection {session_id}"),
            )];
        };
        let from = conn.close().unwrap_or(ConnectionState::Closed);

        let mut actions = vec![log(
            LogLevel::Debug,
            format!("connection {session_id} closed from {from:?}: {reason}"),
        )];

        if let Some(session) = self.registry.unregister(session_id) {
            actions.push(log(
                LogLevel::Info,
                format!("connection {session_id} ({}) left room {}", session.name, session.room),
            ));
            actions.extend(self.system_notice(
                &session.room,
                format!("{} left the room", session.name),
                Roster::Basic,
            ));
        }

        actions
    }

    /// `system` notice to every member of `room`, carrying the current roster.
    fn system_notice(&self, room: &str, text: String, roster: Roster) -> Option<ServerAction> {
        let members = self.registry.roster(room);
        if members.is_empty() {
            return None;
        }

        let users: Vec<MemberSummary> = members
            .iter()
            .map(|(_, session)| match roster {
                Roster::Basic => session.summary(),
                Roster::Presence => session.presence_summary(),
            })
            .collect();
        let recipients = members.iter().map(|(id, _)| *id).collect();

        Some(ServerAction::Broadcast {
            recipients,
            message: ServerMessage::System(SystemNotice {
                message: text,
                user_count: users.len(),
                users,
            }),
        })
    }

    /// Broadcast to every member of `room` except `exclude`.
    fn broadcast(
        &self,
        room: &str,
        exclude: Option<u64>,
        message: ServerMessage,
    ) -> Option<ServerAction> {
        let recipients: Vec<u64> = self
            .registry
            .members_of(room)
            .into_iter()
            .filter(|id| Some(*id) != exclude)
            .collect();

        if recipients.is_empty() {
            return None;
        }

        Some(ServerAction::Broadcast { recipients, message })
    }

    /// Connection IDs in a room, in join order.
    pub fn members_of(&self, room: &str) -> Vec<u64> {
        self.registry.members_of(room)
    }

    /// Session of a connection. `None` if unknown or not joined.
    pub fn session(&self, session_id: u64) -> Option<&Session> {
        self.registry.session(session_id)
    }

    /// Lifecycle state of a connection. `None` once closed and removed.
    pub fn connection_state(&self, session_id: u64) -> Option<ConnectionState> {
        self.connections.get(&session_id).map(Connection::state)
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.registry.room_count()
    }

    /// Driver configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }
}

impl<E: Environment> std::fmt::Debug for ServerDriver<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerDriver")
            .field("connections", &self.connections.len())
            .field("joined", &self.registry.joined_count())
            .field("rooms", &self.registry.room_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn log(level: LogLevel, message: String) -> ServerAction {
    ServerAction::Log { level, message }
}

fn not_joined(session_id: u64, kind: &str) -> ServerAction {
    log(LogLevel::Warn, format!("rejected {kind} from connection {session_id}: not joined"))
}
