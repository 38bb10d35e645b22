// WebSocket event envelopes: {"event": "<name>", "data": <payload>}

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ContainerInfo, ContainerStats, SystemSnapshot};

/// A class of periodic update a connection can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    System,
    Docker,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::System => f.write_str("system"),
            Topic::Docker => f.write_str("docker"),
        }
    }
}

/// Frames sent by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "subscribe:system")]
    SubscribeSystem,
    #[serde(rename = "unsubscribe:system")]
    UnsubscribeSystem,
    #[serde(rename = "subscribe:docker")]
    SubscribeDocker,
    #[serde(rename = "unsubscribe:docker")]
    UnsubscribeDocker,
    #[serde(rename = "stream:logs")]
    StreamLogs(String),
    #[serde(rename = "stop:logs")]
    StopLogs(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatsEvent {
    pub container_id: String,
    pub stats: ContainerStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogChunk {
    pub container_id: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStreamError {
    pub container_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStreamStopped {
    pub container_id: String,
}

/// Frames pushed to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "system:stats")]
    SystemStats(Box<SystemSnapshot>),
    #[serde(rename = "system:error")]
    SystemError(ErrorMessage),
    #[serde(rename = "docker:containers")]
    DockerContainers(Vec<ContainerInfo>),
    #[serde(rename = "docker:stats")]
    DockerStats(ContainerStatsEvent),
    #[serde(rename = "docker:error")]
    DockerError(ErrorMessage),
    #[serde(rename = "docker:logs")]
    DockerLogs(LogChunk),
    #[serde(rename = "docker:logs:error")]
    DockerLogsError(LogStreamError),
    #[serde(rename = "docker:logs:stopped")]
    DockerLogsStopped(LogStreamStopped),
    #[serde(rename = "error")]
    Error(ErrorMessage),
}

impl ServerEvent {
    /// Wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::SystemStats(_) => "system:stats",
            ServerEvent::SystemError(_) => "system:error",
            ServerEvent::DockerContainers(_) => "docker:containers",
            ServerEvent::DockerStats(_) => "docker:stats",
            ServerEvent::DockerError(_) => "docker:error",
            ServerEvent::DockerLogs(_) => "docker:logs",
            ServerEvent::DockerLogsError(_) => "docker:logs:error",
            ServerEvent::DockerLogsStopped(_) => "docker:logs:stopped",
            ServerEvent::Error(_) => "error",
        }
    }
}
