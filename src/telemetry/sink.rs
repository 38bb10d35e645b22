// Outbound edges: connection queue and per-subscription gate.

use tokio::sync::{mpsc, watch};
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use super::ConnectionId;
use crate::models::ServerEvent;

/// Sending half of a connection's outbound queue. Never blocks: a full queue drops the
/// event and a closed queue (socket gone) is a silent no-op.
#[derive(Debug, Clone)]
pub struct EventSink {
    connection: ConnectionId,
    tx: mpsc::Sender<ServerEvent>,
}

impl EventSink {
    pub fn new(connection: ConnectionId, tx: mpsc::Sender<ServerEvent>) -> Self {
        Self { connection, tx }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Returns whether the event was queued.
    pub fn push(&self, event: ServerEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                debug!(
                    connection = %self.connection,
                    event = event.name(),
                    "outbound queue full, dropping event"
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Sink seen by one (connection, topic) timer. Once the subscription is stopped every
/// push is discarded, so a fetch that resolves after unsubscribe delivers nothing.
#[derive(Debug, Clone)]
pub struct TopicPusher {
    sink: EventSink,
    stopped: watch::Receiver<bool>,
}

impl TopicPusher {
    pub fn new(sink: EventSink, stopped: watch::Receiver<bool>) -> Self {
        Self { sink, stopped }
    }

    pub fn is_stopped(&self) -> bool {
        // A dropped stop sender means the subscription record is gone.
        *self.stopped.borrow() || self.stopped.has_changed().is_err()
    }

    pub fn push(&self, event: ServerEvent) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.sink.push(event)
    }

    pub fn connection(&self) -> ConnectionId {
        self.sink.connection()
    }
}
