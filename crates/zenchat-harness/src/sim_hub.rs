//! In-memory relay for scenario and property tests.
//!
//! `SimHub` drives a [`ServerDriver`] directly, without sockets. Broadcasts
//! land in per-connection inboxes that tests inspect, and log actions are
//! recorded so tests can assert on rejected input. Connection IDs are
//! sequential starting at 1. Driver errors surface as `io::Error`, like the
//! socket-backed runtime.

use std::{collections::HashMap, io};

use zenchat_proto::{ClientMessage, ServerMessage};
use zenchat_server::{
    DriverConfig, LogLevel, ServerAction, ServerDriver, ServerEvent, Session,
};

use crate::SimEnv;

/// Simulated relay with one inbox per connection.
#[derive(Debug)]
pub struct SimHub {
    driver: ServerDriver<SimEnv>,
    env: SimEnv,
    inboxes: HashMap<u64, Vec<ServerMessage>>,
    logs: Vec<(LogLevel, String)>,
    next_session_id: u64,
}

impl SimHub {
    /// Hub with default driver configuration.
    pub fn new(env: SimEnv) -> Self {
        Self::with_config(env, DriverConfig::default())
    }

    /// Hub with custom driver configuration.
    pub fn with_config(env: SimEnv, config: DriverConfig) -> Self {
        Self {
            driver: ServerDriver::new(env.clone(), config),
            env,
            inboxes: HashMap::new(),
            logs: Vec::new(),
            next_session_id: 1,
        }
    }

    /// Accept a connection and complete its handshake. Returns its ID.
    pub fn connect(&mut self) -> io::Result<u64> {
        let session_id = self.accept()?;
        self.process(ServerEvent::ConnectionOpened { session_id })?;
        Ok(session_id)
    }

    /// Accept a connection but leave the handshake pending.
    pub fn accept(&mut self) -> io::Result<u64> {
        let session_id = self.next_session_id;
        self.next_session_id += 1;
        self.inboxes.insert(session_id, Vec::new());
        self.process(ServerEvent::ConnectionAccepted { session_id })?;
        Ok(session_id)
    }

    /// Send a message from a connection.
    pub fn send(&mut self, session_id: u64, message: &ClientMessage) -> io::Result<()> {
        let text = message.encode().map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.send_raw(session_id, text)
    }

    /// Send an arbitrary text frame from a connection.
    pub fn send_raw(&mut self, session_id: u64, text: impl Into<String>) -> io::Result<()> {
        self.process(ServerEvent::TextReceived { session_id, text: text.into() })
    }

    /// Close a connection.
    pub fn disconnect(&mut self, session_id: u64) -> io::Result<()> {
        self.process(ServerEvent::ConnectionClosed {
            session_id,
            reason: "simulated disconnect".to_string(),
        })
    }

    /// Messages delivered to a connection so far.
    pub fn inbox(&self, session_id: u64) -> &[ServerMessage] {
        self.inboxes.get(&session_id).map_or(&[], Vec::as_slice)
    }

    /// Drain a connection's inbox.
    pub fn take_inbox(&mut self, session_id: u64) -> Vec<ServerMessage> {
        self.inboxes.get_mut(&session_id).map(std::mem::take).unwrap_or_default()
    }

    /// Drain every inbox.
    pub fn clear_inboxes(&mut self) {
        self.inboxes.values_mut().for_each(Vec::clear);
    }

    /// Log actions emitted so far.
    pub fn logs(&self) -> &[(LogLevel, String)] {
        &self.logs
    }

    /// Number of warnings emitted so far.
    pub fn warning_count(&self) -> usize {
        self.logs.iter().filter(|(level, _)| *level == LogLevel::Warn).count()
    }

    /// Connection IDs in a room, in join order.
    pub fn members(&self, room: &str) -> Vec<u64> {
        self.driver.members_of(room)
    }

    /// Session of a connection.
    pub fn session(&self, session_id: u64) -> Option<&Session> {
        self.driver.session(session_id)
    }

    /// Underlying driver.
    pub fn driver(&self) -> &ServerDriver<SimEnv> {
        &self.driver
    }

    /// Simulation environment (shared with the driver).
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    fn process(&mut self, event: ServerEvent) -> io::Result<()> {
        let actions =
            self.driver.process_event(event).map_err(|e| io::Error::other(e.to_string()))?;
        for action in actions {
            match action {
                ServerAction::Broadcast { recipients, message } => {
                    for session_id in recipients {
                        match self.inboxes.get_mut(&session_id) {
                            Some(inbox) => inbox.push(message.clone()),
                            None => tracing::warn!(session_id, "broadcast to unknown inbox"),
                        }
                    }
                },
                ServerAction::Log { level, message } => {
                    tracing::debug!(?level, "{}", message);
                    self.logs.push((level, message));
                },
            }
        }
        Ok(())
    }
}
