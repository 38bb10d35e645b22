// /api/logs, /api/services, /api/users

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiError, AppState};
use crate::host::{DEFAULT_LOG_LINES, LogOutput, ServiceControl, ServiceListing, SshHistory};

#[derive(Debug, Deserialize)]
pub(super) struct LinesQuery {
    lines: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DockerLogsQuery {
    container: Option<String>,
    lines: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ServicesQuery {
    q: Option<String>,
}

pub(super) async fn system_logs(
    State(state): State<AppState>,
    Query(q): Query<LinesQuery>,
) -> Result<Json<LogOutput>, ApiError> {
    state
        .host
        .system_logs(q.lines.unwrap_or(DEFAULT_LOG_LINES))
        .await
        .map(Json)
        .map_err(|e| ApiError::host("Failed to fetch system logs", e))
}

pub(super) async fn docker_logs(
    State(state): State<AppState>,
    Query(q): Query<DockerLogsQuery>,
) -> Result<Json<LogOutput>, ApiError> {
    let container = q.container.unwrap_or_default();
    state
        .host
        .docker_logs(&container, q.lines.unwrap_or(DEFAULT_LOG_LINES))
        .await
        .map(Json)
        .map_err(|e| ApiError::host("Failed to fetch docker logs", e))
}

pub(super) async fn list_services(
    State(state): State<AppState>,
    Query(q): Query<ServicesQuery>,
) -> Result<Json<ServiceListing>, ApiError> {
    state
        .host
        .list_services(q.q.as_deref())
        .await
        .map(Json)
        .map_err(|e| ApiError::host("Failed to list services", e))
}

pub(super) async fn control_service(
    State(state): State<AppState>,
    Path((name, action)): Path<(String, String)>,
) -> Result<Json<ServiceControl>, ApiError> {
    state
        .host
        .control_service(&name, &action)
        .await
        .map(Json)
        .map_err(|e| ApiError::host("Failed to control service", e))
}

pub(super) async fn sessions(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sessions = state
        .host
        .sessions()
        .await
        .map_err(|e| ApiError::host("Failed to fetch sessions", e))?;
    Ok(Json(json!({ "sessions": sessions })))
}

pub(super) async fn ssh_history(
    State(state): State<AppState>,
    Query(q): Query<LinesQuery>,
) -> Result<Json<SshHistory>, ApiError> {
    state
        .host
        .ssh_history(q.lines.unwrap_or(DEFAULT_LOG_LINES))
        .await
        .map(Json)
        .map_err(|e| ApiError::host("Failed to fetch ssh history", e))
}
