// Live telemetry fan-out: per-connection subscriptions, timers and log streams.

mod broadcaster;
mod registry;
mod sink;

pub use broadcaster::{Broadcaster, TelemetryConfig, TimerHandle, docker_tick, system_tick};
pub use registry::ConnectionRegistry;
pub use sink::{EventSink, TopicPusher};

use std::fmt;

/// Opaque handle of one live WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
