// Per-(connection, topic) sampling loops and container log streams.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{EventSink, TopicPusher};
use crate::docker_repo::ContainerRuntime;
use crate::models::{
    ContainerState, ContainerStatsEvent, ErrorMessage, LogChunk, LogStreamError, ServerEvent,
    Topic,
};
use crate::sysinfo_repo::SnapshotProvider;

pub const SYSTEM_ERROR_MESSAGE: &str = "Failed to get system stats";
pub const DOCKER_ERROR_MESSAGE: &str = "Failed to get docker data";
pub const LOG_STREAM_ERROR_MESSAGE: &str = "Failed to stream logs";

#[derive(Debug, Clone, Copy)]
pub struct TelemetryConfig {
    pub system_interval: Duration,
    pub docker_interval: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            system_interval: Duration::from_millis(2000),
            docker_interval: Duration::from_millis(3000),
        }
    }
}

/// Running timer for one subscription. Dropping it stops the loop: a tick in flight
/// finishes its fetch and pushes nothing.
#[derive(Debug)]
pub struct TimerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

/// Fetches snapshots for subscribed connections.
#[derive(Clone)]
pub struct Broadcaster {
    provider: Arc<dyn SnapshotProvider>,
    runtime: Arc<dyn ContainerRuntime>,
    config: TelemetryConfig,
}

impl Broadcaster {
    pub fn new(
        provider: Arc<dyn SnapshotProvider>,
        runtime: Arc<dyn ContainerRuntime>,
        config: TelemetryConfig,
    ) -> Self {
        Self {
            provider,
            runtime,
            config,
        }
    }

    pub fn interval(&self, topic: Topic) -> Duration {
        match topic {
            Topic::System => self.config.system_interval,
            Topic::Docker => self.config.docker_interval,
        }
    }

    /// Spawns the fixed-delay loop for `topic` pushing into `sink`. The first tick fires
    /// one interval after the call.
    pub fn start(&self, topic: Topic, sink: EventSink) -> TimerHandle {
        let (stop, stopped) = watch::channel(false);
        let pusher = TopicPusher::new(sink, stopped.clone());
        let this = self.clone();
        let task = tokio::spawn(async move {
            this.run(topic, pusher, stopped).await;
        });
        TimerHandle { stop, task }
    }

    async fn run(&self, topic: Topic, pusher: TopicPusher, mut stopped: watch::Receiver<bool>) {
        let interval = self.interval(topic);
        let connection = pusher.connection();
        debug!(%connection, %topic, ?interval, "subscription timer started");
        loop {
            // Re-armed after each tick completes, so slow ticks never overlap.
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                // Err means the handle is gone, which also stops the loop.
                _ = stopped.changed() => break,
            }
            if pusher.is_stopped() {
                break;
            }
            match topic {
                Topic::System => system_tick(self.provider.as_ref(), &pusher).await,
                Topic::Docker => docker_tick(self.runtime.as_ref(), &pusher).await,
            }
        }
        debug!(%connection, %topic, "subscription timer stopped");
    }

    /// Follows a container's live logs into `sink` until the stream ends or the task is
    /// aborted. Aborting drops the runtime stream and so detaches from the daemon.
    pub fn stream_logs(&self, container_id: String, sink: EventSink) -> JoinHandle<()> {
        let runtime = self.runtime.clone();
        tokio::spawn(async move {
            let mut forward = |data: String| {
                sink.push(ServerEvent::DockerLogs(LogChunk {
                    container_id: container_id.clone(),
                    data,
                }));
            };
            let result = runtime.stream_logs(&container_id, &mut forward).await;
            if let Err(e) = result {
                warn!(
                    connection = %sink.connection(),
                    container = %container_id,
                    error = %e,
                    "log stream failed"
                );
                sink.push(ServerEvent::DockerLogsError(LogStreamError {
                    container_id: container_id.clone(),
                    message: LOG_STREAM_ERROR_MESSAGE.to_string(),
                }));
            }
        })
    }
}

/// One `system` tick: snapshot or a topic-scoped error for this connection only.
pub async fn system_tick(provider: &dyn SnapshotProvider, pusher: &TopicPusher) {
    match provider.system_snapshot().await {
        Ok(snapshot) => {
            pusher.push(ServerEvent::SystemStats(Box::new(snapshot)));
        }
        Err(e) => {
            warn!(
                connection = %pusher.connection(),
                error = %e,
                operation = "system_snapshot",
                "system tick failed"
            );
            pusher.push(ServerEvent::SystemError(ErrorMessage::new(
                SYSTEM_ERROR_MESSAGE,
            )));
        }
    }
}

/// One `docker` tick: container list, then stats for each running container. A failed
/// stats fetch is logged and skipped; the rest of the batch still goes out.
pub async fn docker_tick(runtime: &dyn ContainerRuntime, pusher: &TopicPusher) {
    let containers = match runtime.list().await {
        Ok(c) => c,
        Err(e) => {
            warn!(
                connection = %pusher.connection(),
                error = %e,
                operation = "list_containers",
                "docker tick failed"
            );
            pusher.push(ServerEvent::DockerError(ErrorMessage::new(
                DOCKER_ERROR_MESSAGE,
            )));
            return;
        }
    };
    let running: Vec<String> = containers
        .iter()
        .filter(|c| c.state == ContainerState::Running)
        .map(|c| c.id.clone())
        .collect();
    pusher.push(ServerEvent::DockerContainers(containers));

    for id in running {
        if pusher.is_stopped() {
            return;
        }
        match runtime.stats(&id).await {
            Ok(stats) => {
                pusher.push(ServerEvent::DockerStats(ContainerStatsEvent {
                    container_id: id,
                    stats,
                }));
            }
            Err(e) => {
                warn!(
                    connection = %pusher.connection(),
                    container = %id,
                    error = %e,
                    operation = "container_stats",
                    "container stats failed, skipping"
                );
            }
        }
    }
}
