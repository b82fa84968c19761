//! Fan-out of outbound messages to connection outboxes.
//!
//! Each open connection owns an unbounded outbox drained by its writer task.
//! Delivery serializes the message once and pushes the same frame into every
//! recipient's outbox without waiting on the socket, so a slow or dead peer
//! never stalls the dispatcher or the other recipients. Pushing into a
//! single outbox preserves FIFO order per recipient.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{RwLock, mpsc};
use zenchat_proto::ServerMessage;

/// Sending half of a connection's outbox. Frames are pre-serialized JSON.
pub type Outbox = mpsc::UnboundedSender<Arc<str>>;

/// Outcome of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Recipients whose outbox accepted the frame
    pub delivered: usize,
    /// Recipients that could not be reached
    pub failed: Vec<u64>,
}

/// Registry of connection outboxes.
#[derive(Debug, Default)]
pub struct Broadcaster {
    outboxes: RwLock<HashMap<u64, Outbox>>,
}

impl Broadcaster {
    /// Create a broadcaster with no outboxes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the outbox of a newly opened connection.
    pub async fn attach(&self, session_id: u64, outbox: Outbox) {
        self.outboxes.write().await.insert(session_id, outbox);
    }

    /// Detach a connection's outbox. Returns `false` if none was attached.
    pub async fn detach(&self, session_id: u64) -> bool {
        self.outboxes.write().await.remove(&session_id).is_some()
    }

    /// Number of attached outboxes.
    pub async fn outbox_count(&self) -> usize {
        self.outboxes.read().await.len()
    }

    /// Deliver `message` to every recipient.
    ///
    /// Failures are logged per recipient and reported, never propagated.
    pub async fn deliver(&self, message: &ServerMessage, recipients: &[u64]) -> DeliveryReport {
        let frame: Arc<str> = match message.encode() {
            Ok(text) => Arc::from(text),
            Err(e) => {
                tracing::error!(kind = message.kind(), error = %e, "failed to encode broadcast");
                return DeliveryReport { delivered: 0, failed: recipients.to_vec() };
            },
        };

        let outboxes = self.outboxes.read().await;
        let mut report = DeliveryReport::default();

        for &session_id in recipients {
            match outboxes.get(&session_id) {
                Some(outbox) if outbox.send(Arc::clone(&frame)).is_ok() => report.delivered += 1,
                Some(_) => {
                    tracing::warn!(session_id, kind = message.kind(), "outbox closed, dropping");
                    report.failed.push(session_id);
                },
                None => {
                    tracing::debug!(session_id, kind = message.kind(), "no outbox, dropping");
                    report.failed.push(session_id);
                },
            }
        }

        tracing::trace!(
            kind = message.kind(),
            delivered = report.delivered,
            failed = report.failed.len(),
            "broadcast"
        );

        report
    }
}
