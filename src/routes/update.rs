// /api/update/* and /api/version/*: git + docker compose self-update

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::host::{PendingCommits, UpdateCheck, UpdateOutcome, UpdateStatus};

/// Body of destructive requests. A missing or unparsable body counts as unconfirmed.
#[derive(Debug, Deserialize)]
pub(super) struct Confirm {
    #[serde(default)]
    confirm: bool,
}

fn confirmed(body: Option<Json<Confirm>>) -> bool {
    body.is_some_and(|Json(c)| c.confirm)
}

fn outcome_response(outcome: UpdateOutcome) -> Response {
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome)).into_response()
}

pub(super) async fn check(State(state): State<AppState>) -> Result<Json<UpdateCheck>, ApiError> {
    state
        .host
        .check_latest_tag()
        .await
        .map(Json)
        .map_err(|e| ApiError::host("Failed to check for updates", e))
}

pub(super) async fn pending(
    State(state): State<AppState>,
) -> Result<Json<PendingCommits>, ApiError> {
    state
        .host
        .pending_commits()
        .await
        .map(Json)
        .map_err(|e| ApiError::host("Failed to check for updates", e))
}

pub(super) async fn status(State(state): State<AppState>) -> Result<Json<UpdateStatus>, ApiError> {
    state
        .host
        .update_status()
        .await
        .map(Json)
        .map_err(|e| ApiError::host("Failed to get update status", e))
}

pub(super) async fn perform(
    State(state): State<AppState>,
    body: Result<Json<Confirm>, JsonRejection>,
) -> Result<Response, ApiError> {
    state
        .host
        .authorize_update(confirmed(body.ok()))
        .map_err(|e| ApiError::host("Update refused", e))?;
    Ok(outcome_response(state.host.perform_update().await))
}

pub(super) async fn pull(
    State(state): State<AppState>,
    body: Result<Json<Confirm>, JsonRejection>,
) -> Result<Response, ApiError> {
    state
        .host
        .authorize_update(confirmed(body.ok()))
        .map_err(|e| ApiError::host("Update refused", e))?;
    Ok(outcome_response(state.host.pull().await))
}

pub(super) async fn restart(
    State(state): State<AppState>,
    body: Result<Json<Confirm>, JsonRejection>,
) -> Result<Response, ApiError> {
    state
        .host
        .authorize_update(confirmed(body.ok()))
        .map_err(|e| ApiError::host("Restart refused", e))?;
    Ok(outcome_response(state.host.restart_services().await))
}
