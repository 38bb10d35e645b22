// Docker containers via bollard

mod stats;
mod summary;

pub use stats::{cpu_percent, process_statistics};
pub use summary::container_info;

use crate::models::{ContainerInfo, ContainerStats};
use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::{
    ListContainersOptions, LogsOptions, RestartContainerOptions, StartContainerOptions,
    StatsOptions, StopContainerOptions,
};
use futures_util::StreamExt;
use thiserror::Error;
use tracing::{debug, instrument};

/// Seconds bollard waits on the daemon socket before giving up.
const DOCKER_CLIENT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum DockerError {
    /// The daemon socket could not be reached (daemon down, socket missing, permissions).
    #[error("Failed to connect to Docker daemon. Make sure Docker is running and accessible.")]
    Unavailable(#[source] bollard::errors::Error),
    #[error("container not found: {0}")]
    NotFound(String),
    #[error("docker API error: {0}")]
    Api(String),
}

impl DockerError {
    /// Server-side responses are API errors (404 = not found); anything that never got a
    /// response from the daemon counts as unavailable.
    fn classify(e: bollard::errors::Error, id: Option<&str>) -> Self {
        match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => DockerError::NotFound(id.map(str::to_string).unwrap_or(message)),
            bollard::errors::Error::DockerResponseServerError {
                status_code,
                message,
            } => DockerError::Api(format!("{}: {}", status_code, message)),
            other => DockerError::Unavailable(other),
        }
    }
}

/// Container runtime operations used by the dashboard.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// All containers, running or not.
    async fn list(&self) -> Result<Vec<ContainerInfo>, DockerError>;
    async fn stats(&self, id: &str) -> Result<ContainerStats, DockerError>;
    async fn start(&self, id: &str) -> Result<(), DockerError>;
    async fn stop(&self, id: &str) -> Result<(), DockerError>;
    async fn restart(&self, id: &str) -> Result<(), DockerError>;
    /// Last `tail` lines of stdout+stderr with timestamps.
    async fn logs(&self, id: &str, tail: u32) -> Result<String, DockerError>;
    /// Follows the live log stream, calling `on_chunk` per chunk until the stream ends.
    /// Dropping the returned future detaches from the daemon.
    async fn stream_logs(
        &self,
        id: &str,
        on_chunk: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), DockerError>;
}

pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    /// Connects lazily: a missing daemon surfaces as `DockerError::Unavailable` on first use.
    pub fn connect(socket_path: Option<&str>) -> anyhow::Result<Self> {
        let docker = match socket_path {
            Some(path) => Docker::connect_with_unix(
                path,
                DOCKER_CLIENT_TIMEOUT_SECS,
                bollard::API_DEFAULT_VERSION,
            )?,
            None => Docker::connect_with_unix_defaults()?,
        };
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRepo {
    #[instrument(skip(self), fields(repo = "docker", operation = "list"))]
    async fn list(&self) -> Result<Vec<ContainerInfo>, DockerError> {
        let options = ListContainersOptions {
            all: true,
            ..Default::default()
        };
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| DockerError::classify(e, None))?;
        Ok(containers.iter().map(container_info).collect())
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "stats"))]
    async fn stats(&self, id: &str) -> Result<ContainerStats, DockerError> {
        let options = StatsOptions {
            stream: false,
            ..Default::default()
        };
        let mut stream = self.docker.stats(id, Some(options));
        match stream.next().await {
            Some(Ok(s)) => Ok(process_statistics(&s, id)),
            Some(Err(e)) => Err(DockerError::classify(e, Some(id))),
            None => Err(DockerError::Api(format!("empty stats response for {}", id))),
        }
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "start"))]
    async fn start(&self, id: &str) -> Result<(), DockerError> {
        self.docker
            .start_container(id, None::<StartContainerOptions>)
            .await
            .map_err(|e| DockerError::classify(e, Some(id)))
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "stop"))]
    async fn stop(&self, id: &str) -> Result<(), DockerError> {
        self.docker
            .stop_container(id, None::<StopContainerOptions>)
            .await
            .map_err(|e| DockerError::classify(e, Some(id)))
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "restart"))]
    async fn restart(&self, id: &str) -> Result<(), DockerError> {
        self.docker
            .restart_container(id, None::<RestartContainerOptions>)
            .await
            .map_err(|e| DockerError::classify(e, Some(id)))
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "logs"))]
    async fn logs(&self, id: &str, tail: u32) -> Result<String, DockerError> {
        let options = LogsOptions {
            stdout: true,
            stderr: true,
            timestamps: true,
            tail: tail.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.logs(id, Some(options));
        let mut out = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DockerError::classify(e, Some(id)))?;
            out.push_str(&String::from_utf8_lossy(&chunk.into_bytes()));
        }
        Ok(out)
    }

    #[instrument(skip(self, on_chunk), fields(repo = "docker", operation = "stream_logs"))]
    async fn stream_logs(
        &self,
        id: &str,
        on_chunk: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), DockerError> {
        let options = LogsOptions {
            follow: true,
            stdout: true,
            stderr: true,
            timestamps: true,
            ..Default::default()
        };
        let mut stream = self.docker.logs(id, Some(options));
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DockerError::classify(e, Some(id)))?;
            on_chunk(String::from_utf8_lossy(&chunk.into_bytes()).into_owned());
        }
        debug!(container = id, "log stream ended");
        Ok(())
    }
}
