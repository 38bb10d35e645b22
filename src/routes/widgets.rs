// /api/widgets/*: proxied third-party data

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::integrations::{DEFAULT_CITY, DEFAULT_NEWS_CATEGORY};
use crate::models::{CryptoPrice, GitHubRepo, NewsItem, UpstreamStatus, WeatherData};

const MAX_LIMIT: u32 = 100;

fn limit(requested: Option<u32>, default: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, MAX_LIMIT)
}

#[derive(Debug, Deserialize)]
pub(super) struct WeatherQuery {
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct NewsQuery {
    category: Option<String>,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LimitQuery {
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GitHubQuery {
    username: Option<String>,
    limit: Option<u32>,
}

/// GitHub logins: alphanumerics and single hyphens, up to 39 chars.
fn valid_github_username(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 39
        && !name.starts_with('-')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

pub(super) async fn weather(
    State(state): State<AppState>,
    Query(q): Query<WeatherQuery>,
) -> Result<Json<WeatherData>, ApiError> {
    let city = q.city.filter(|c| !c.trim().is_empty());
    state
        .widgets
        .weather(city.as_deref().unwrap_or(DEFAULT_CITY))
        .await
        .map(Json)
        .map_err(|e| ApiError::upstream("Failed to get weather data", e))
}

pub(super) async fn news(
    State(state): State<AppState>,
    Query(q): Query<NewsQuery>,
) -> Result<Json<Vec<NewsItem>>, ApiError> {
    let category = q.category.filter(|c| !c.trim().is_empty());
    state
        .widgets
        .news(
            category.as_deref().unwrap_or(DEFAULT_NEWS_CATEGORY),
            limit(q.limit, 10),
        )
        .await
        .map(Json)
        .map_err(|e| ApiError::upstream("Failed to get news data", e))
}

pub(super) async fn crypto(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<Vec<CryptoPrice>>, ApiError> {
    state
        .widgets
        .crypto(limit(q.limit, 10))
        .await
        .map(Json)
        .map_err(|e| ApiError::upstream("Failed to get crypto data", e))
}

pub(super) async fn github(
    State(state): State<AppState>,
    Query(q): Query<GitHubQuery>,
) -> Result<Json<Vec<GitHubRepo>>, ApiError> {
    let username = q.username.unwrap_or_default();
    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".into()));
    }
    if !valid_github_username(username) {
        return Err(ApiError::BadRequest(format!("Invalid username: {}", username)));
    }
    state
        .widgets
        .github(username, limit(q.limit, 5))
        .await
        .map(Json)
        .map_err(|e| ApiError::upstream("Failed to get GitHub data", e))
}

pub(super) async fn status(State(state): State<AppState>) -> Json<Vec<UpstreamStatus>> {
    Json(state.widgets.status().await)
}
