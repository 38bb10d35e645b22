// GET /api/system/* and /api/alerts, all backed by one fresh snapshot per request

use axum::{Json, extract::State};
use serde_json::{Value, json};

use super::{ApiError, AppState};
use crate::alerts;
use crate::models::{AlertReport, AlertThresholds, SystemSnapshot};

async fn snapshot(state: &AppState, context: &str) -> Result<SystemSnapshot, ApiError> {
    state
        .provider
        .system_snapshot()
        .await
        .map_err(|e| ApiError::internal(context, e))
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub(super) async fn stats(State(state): State<AppState>) -> Result<Json<SystemSnapshot>, ApiError> {
    Ok(Json(snapshot(&state, "Failed to get system stats").await?))
}

pub(super) async fn cpu(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let s = snapshot(&state, "Failed to get CPU data").await?;
    Ok(Json(json!({
        "usage": s.cpu.usage,
        "cores": s.cpu.cores,
        "temperature": s.cpu.temperature,
        "loadAverage": s.cpu.load_average,
        "timestamp": now_millis(),
    })))
}

pub(super) async fn memory(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let s = snapshot(&state, "Failed to get memory data").await?;
    let m = s.memory;
    Ok(Json(json!({
        "total": m.total,
        "used": m.used,
        "free": m.free,
        "cached": m.cached,
        "swap": m.swap,
        "timestamp": now_millis(),
    })))
}

pub(super) async fn disks(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let s = snapshot(&state, "Failed to get disk data").await?;
    Ok(Json(json!({ "disks": s.disk, "timestamp": now_millis() })))
}

pub(super) async fn network(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let s = snapshot(&state, "Failed to get network data").await?;
    Ok(Json(json!({ "interfaces": s.network, "timestamp": now_millis() })))
}

pub(super) async fn alerts(State(state): State<AppState>) -> Result<Json<AlertReport>, ApiError> {
    let s = snapshot(&state, "Failed to get alerts").await?;
    let metrics = alerts::metrics_from_snapshot(&s);
    Ok(Json(alerts::evaluate(AlertThresholds::default(), metrics)))
}
