// Connection registry: which topics and log streams each live connection holds.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{Broadcaster, ConnectionId, EventSink, TimerHandle};
use crate::models::{ClientEvent, LogStreamStopped, ServerEvent, Topic};

/// Aborts the stream task when dropped.
struct LogStreamHandle(JoinHandle<()>);

impl Drop for LogStreamHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Default)]
struct RegistryState {
    connections: HashMap<ConnectionId, EventSink>,
    timers: HashMap<(ConnectionId, Topic), TimerHandle>,
    log_streams: HashMap<(ConnectionId, String), LogStreamHandle>,
}

/// Owns every connection record for its lifetime. All operations are synchronous and
/// never hold the lock across an await.
pub struct ConnectionRegistry {
    broadcaster: Broadcaster,
    state: Mutex<RegistryState>,
}

impl ConnectionRegistry {
    pub fn new(broadcaster: Broadcaster) -> Self {
        Self {
            broadcaster,
            state: Mutex::new(RegistryState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        // Bookkeeping stays usable even if a holder panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a new connection whose events go to `tx`.
    pub fn on_connect(&self, tx: mpsc::Sender<ServerEvent>) -> ConnectionId {
        let id = ConnectionId::new();
        self.state().connections.insert(id, EventSink::new(id, tx));
        info!(connection = %id, "client connected");
        id
    }

    /// Starts the topic timer unless one already runs for (id, topic). A timer whose task
    /// died is replaced.
    pub fn on_subscribe(&self, id: ConnectionId, topic: Topic) {
        let mut state = self.state();
        let Some(sink) = state.connections.get(&id).cloned() else {
            debug!(connection = %id, %topic, "subscribe for unknown connection ignored");
            return;
        };
        if state
            .timers
            .get(&(id, topic))
            .is_some_and(|t| !t.is_finished())
        {
            debug!(connection = %id, %topic, "already subscribed");
            return;
        }
        let timer = self.broadcaster.start(topic, sink);
        state.timers.insert((id, topic), timer);
        info!(connection = %id, %topic, "subscribed");
    }

    /// Stops the topic timer if there is one.
    pub fn on_unsubscribe(&self, id: ConnectionId, topic: Topic) {
        let removed = self.state().timers.remove(&(id, topic));
        if removed.is_some() {
            info!(connection = %id, %topic, "unsubscribed");
        }
    }

    /// Stops every timer and log stream of the connection and forgets it.
    pub fn on_disconnect(&self, id: ConnectionId) {
        let (timers, streams) = {
            let mut state = self.state();
            state.connections.remove(&id);
            let timer_keys: Vec<_> = state
                .timers
                .keys()
                .filter(|(c, _)| *c == id)
                .copied()
                .collect();
            let timers: Vec<TimerHandle> = timer_keys
                .iter()
                .filter_map(|k| state.timers.remove(k))
                .collect();
            let stream_keys: Vec<_> = state
                .log_streams
                .keys()
                .filter(|(c, _)| *c == id)
                .cloned()
                .collect();
            let streams: Vec<LogStreamHandle> = stream_keys
                .iter()
                .filter_map(|k| state.log_streams.remove(k))
                .collect();
            (timers, streams)
        };
        info!(
            connection = %id,
            timers = timers.len(),
            log_streams = streams.len(),
            "client disconnected"
        );
        // Dropping signals the timers and aborts the streams.
        drop(timers);
        drop(streams);
    }

    /// Attaches to a container's live logs. A second request while the stream is live is
    /// a no-op; a request after it ended starts a new one.
    pub fn start_log_stream(&self, id: ConnectionId, container_id: &str) {
        let mut state = self.state();
        let Some(sink) = state.connections.get(&id).cloned() else {
            return;
        };
        let key = (id, container_id.to_string());
        if state
            .log_streams
            .get(&key)
            .is_some_and(|h| !h.0.is_finished())
        {
            debug!(connection = %id, container = container_id, "log stream already active");
            return;
        }
        let task = self.broadcaster.stream_logs(container_id.to_string(), sink);
        state.log_streams.insert(key, LogStreamHandle(task));
        info!(connection = %id, container = container_id, "log stream started");
    }

    /// Detaches the container's log stream, if any, and acknowledges with
    /// `docker:logs:stopped`. Safe when the stream already ended or never existed.
    pub fn stop_log_stream(&self, id: ConnectionId, container_id: &str) {
        let (handle, sink) = {
            let mut state = self.state();
            let handle = state.log_streams.remove(&(id, container_id.to_string()));
            (handle, state.connections.get(&id).cloned())
        };
        if handle.is_some() {
            info!(connection = %id, container = container_id, "log stream stopped");
        }
        drop(handle);
        if let Some(sink) = sink {
            sink.push(ServerEvent::DockerLogsStopped(LogStreamStopped {
                container_id: container_id.to_string(),
            }));
        }
    }

    /// Applies one client frame to the connection's subscriptions.
    pub fn handle(&self, id: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::SubscribeSystem => self.on_subscribe(id, Topic::System),
            ClientEvent::UnsubscribeSystem => self.on_unsubscribe(id, Topic::System),
            ClientEvent::SubscribeDocker => self.on_subscribe(id, Topic::Docker),
            ClientEvent::UnsubscribeDocker => self.on_unsubscribe(id, Topic::Docker),
            ClientEvent::StreamLogs(container) => self.start_log_stream(id, &container),
            ClientEvent::StopLogs(container) => self.stop_log_stream(id, &container),
        }
    }

    /// Queues an event for one connection (e.g. protocol errors). Unknown ids are ignored.
    pub fn send(&self, id: ConnectionId, event: ServerEvent) -> bool {
        let sink = self.state().connections.get(&id).cloned();
        sink.is_some_and(|s| s.push(event))
    }

    pub fn connection_count(&self) -> usize {
        self.state().connections.len()
    }

    pub fn timer_count(&self, id: ConnectionId) -> usize {
        self.state().timers.keys().filter(|(c, _)| *c == id).count()
    }

    pub fn total_timers(&self) -> usize {
        self.state().timers.len()
    }

    pub fn is_subscribed(&self, id: ConnectionId, topic: Topic) -> bool {
        self.state().timers.contains_key(&(id, topic))
    }

    pub fn log_stream_count(&self, id: ConnectionId) -> usize {
        self.state()
            .log_streams
            .keys()
            .filter(|(c, _)| *c == id)
            .count()
    }
}
