// HTTP + WebSocket routes

mod docker;
mod error;
mod host;
mod http;
mod ports;
mod system;
mod update;
mod widgets;
mod ws;

pub use error::ApiError;

use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{
    Json, Router,
    routing::{get, post},
};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, warn};

use crate::config::AppConfig;
use crate::docker_repo::ContainerRuntime;
use crate::host::HostCommands;
use crate::integrations::WidgetClient;
use crate::shell::CommandRunner;
use crate::sysinfo_repo::SnapshotProvider;
use crate::telemetry::{Broadcaster, ConnectionRegistry};

#[derive(Clone)]
pub struct AppState {
    pub(crate) provider: Arc<dyn SnapshotProvider>,
    pub(crate) runtime: Arc<dyn ContainerRuntime>,
    pub(crate) host: HostCommands,
    pub(crate) widgets: WidgetClient,
    pub(crate) registry: Arc<ConnectionRegistry>,
    pub(crate) config: AppConfig,
    pub(crate) started_at: Instant,
}

impl AppState {
    /// Wires the collaborators into the broadcaster, registry and host/widget clients.
    pub fn new(
        provider: Arc<dyn SnapshotProvider>,
        runtime: Arc<dyn ContainerRuntime>,
        runner: Arc<dyn CommandRunner>,
        config: AppConfig,
    ) -> anyhow::Result<Self> {
        let broadcaster = Broadcaster::new(
            provider.clone(),
            runtime.clone(),
            config.telemetry.broadcaster_config(),
        );
        let host = HostCommands::new(runner, config.commands.clone(), config.update.clone());
        let widgets = WidgetClient::new(config.integrations.clone())?;
        Ok(Self {
            provider,
            runtime,
            host,
            widgets,
            registry: Arc::new(ConnectionRegistry::new(broadcaster)),
            config,
            started_at: Instant::now(),
        })
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        self.registry.clone()
    }
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(frontend_url) {
        Ok(v) => AllowOrigin::exact(v),
        Err(e) => {
            warn!(frontend_url, error = %e, "invalid frontend origin, allowing none");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Route not found" })),
    )
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Internal server error" })),
    )
        .into_response()
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.frontend_url);
    let api = Router::new()
        .route("/health", get(http::health)) // GET /api/health
        // system
        .route("/system/stats", get(system::stats))
        .route("/system/cpu-history", get(system::cpu))
        .route("/system/memory-history", get(system::memory))
        .route("/system/disk-usage", get(system::disks))
        .route("/system/network-stats", get(system::network))
        .route("/alerts", get(system::alerts))
        // docker
        .route("/docker/containers", get(docker::list))
        .route("/docker/containers/{id}/stats", get(docker::stats))
        .route("/docker/containers/{id}/logs", get(docker::logs))
        .route("/docker/containers/{id}/start", post(docker::start))
        .route("/docker/containers/{id}/stop", post(docker::stop))
        .route("/docker/containers/{id}/restart", post(docker::restart))
        // ports
        .route("/ports/scan", get(ports::scan))
        .route("/ports/local-ip", get(ports::local_ip))
        .route("/ports/common-ports", get(ports::common_ports))
        // host
        .route("/logs/system", get(host::system_logs))
        .route("/logs/docker", get(host::docker_logs))
        .route("/services", get(host::list_services))
        .route("/services/{name}/{action}", post(host::control_service))
        .route("/users/sessions", get(host::sessions))
        .route("/users/ssh-history", get(host::ssh_history))
        // self-update
        .route("/update/check", get(update::check))
        .route("/update/perform", post(update::perform))
        .route("/update/status", get(update::status))
        .route("/version/current", get(http::version_handler))
        .route("/version/check", get(update::pending))
        .route("/version/update", post(update::pull))
        .route("/version/restart", post(update::restart))
        // widgets
        .route("/widgets/weather", get(widgets::weather))
        .route("/widgets/news", get(widgets::news))
        .route("/widgets/crypto", get(widgets::crypto))
        .route("/widgets/github", get(widgets::github))
        .route("/widgets/status", get(widgets::status));

    Router::new()
        .nest("/api", api)
        .route("/ws", get(ws::ws_handler)) // WS /ws
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .with_state(state)
}
