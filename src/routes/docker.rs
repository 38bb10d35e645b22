// /api/docker/containers: list, stats, logs, lifecycle actions

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiError, AppState};
use crate::models::{ContainerInfo, ContainerStats};

const DEFAULT_TAIL: u32 = 100;

#[derive(Debug, Deserialize)]
pub(super) struct LogsQuery {
    tail: Option<u32>,
}

pub(super) async fn list(State(state): State<AppState>) -> Result<Json<Vec<ContainerInfo>>, ApiError> {
    state
        .runtime
        .list()
        .await
        .map(Json)
        .map_err(|e| ApiError::docker("Failed to get containers", e))
}

pub(super) async fn stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContainerStats>, ApiError> {
    state
        .runtime
        .stats(&id)
        .await
        .map(Json)
        .map_err(|e| ApiError::docker("Failed to get container stats", e))
}

pub(super) async fn logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<LogsQuery>,
) -> Result<Json<Value>, ApiError> {
    let logs = state
        .runtime
        .logs(&id, q.tail.unwrap_or(DEFAULT_TAIL))
        .await
        .map_err(|e| ApiError::docker("Failed to get container logs", e))?;
    Ok(Json(json!({ "logs": logs })))
}

pub(super) async fn start(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .runtime
        .start(&id)
        .await
        .map_err(|e| ApiError::docker("Failed to start container", e))?;
    Ok(Json(json!({ "message": "Container started successfully" })))
}

pub(super) async fn stop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .runtime
        .stop(&id)
        .await
        .map_err(|e| ApiError::docker("Failed to stop container", e))?;
    Ok(Json(json!({ "message": "Container stopped successfully" })))
}

pub(super) async fn restart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .runtime
        .restart(&id)
        .await
        .map_err(|e| ApiError::docker("Failed to restart container", e))?;
    Ok(Json(json!({ "message": "Container restarted successfully" })))
}
