use serde::Deserialize;
use std::time::Duration;

use crate::telemetry::TelemetryConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub telemetry: TelemetrySection,
    pub docker: DockerConfig,
    pub commands: CommandsConfig,
    pub integrations: IntegrationsConfig,
    pub update: UpdateConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Origin allowed by CORS.
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5200,
            host: "0.0.0.0".into(),
            frontend_url: "http://localhost:3200".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetrySection {
    pub system_interval_ms: u64,
    pub docker_interval_ms: u64,
    /// Outbound events buffered per connection before new ones are dropped.
    pub queue_capacity: usize,
    /// How often to log connection/timer counts at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            system_interval_ms: 2000,
            docker_interval_ms: 3000,
            queue_capacity: 256,
            stats_log_interval_secs: 300,
        }
    }
}

impl TelemetrySection {
    pub fn broadcaster_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            system_interval: Duration::from_millis(self.system_interval_ms),
            docker_interval: Duration::from_millis(self.docker_interval_ms),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Unix socket path; bollard's default when unset.
    pub socket: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    pub timeout_secs: u64,
    pub service_timeout_secs: u64,
    pub max_output_bytes: usize,
    pub syslog_path: String,
    pub auth_log_path: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            service_timeout_secs: 15,
            max_output_bytes: 5 * 1024 * 1024,
            syslog_path: "/var/log/syslog".into(),
            auth_log_path: "/var/log/auth.log".into(),
        }
    }
}

impl CommandsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.service_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    pub openweather_api_key: Option<String>,
    pub news_api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub status_timeout_secs: u64,
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            openweather_api_key: None,
            news_api_key: None,
            request_timeout_secs: 10,
            status_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// When false, pull/rebuild/restart endpoints answer 403.
    pub allow_destructive: bool,
    /// Git checkout that also holds the compose file.
    pub repo_dir: String,
    pub remote: String,
    pub branch: String,
    pub timeout_secs: u64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            allow_destructive: true,
            repo_dir: ".".into(),
            remote: "origin".into(),
            branch: "main".into(),
            timeout_secs: 600,
        }
    }
}

impl UpdateConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Reads `CONFIG_FILE` (default `config.toml`); a missing file means all defaults.
    /// Environment overrides are applied last.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path, "config file not found, using defaults");
                String::new()
            }
            Err(e) => return Err(anyhow::anyhow!("reading {}: {}", path, e)),
        };
        let mut config: AppConfig = toml::from_str(&s)?;
        config.apply_env(|k| std::env::var(k).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests). No env overrides.
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies PORT, FRONTEND_URL, OPENWEATHER_API_KEY, NEWS_API_KEY and DOCKER_SOCKET.
    /// Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        if let Some(port) = get("PORT") {
            match port.trim().parse() {
                Ok(p) => self.server.port = p,
                Err(e) => tracing::warn!(value = %port, error = %e, "ignoring invalid PORT"),
            }
        }
        if let Some(v) = get("FRONTEND_URL") {
            self.server.frontend_url = v;
        }
        if let Some(v) = get("OPENWEATHER_API_KEY") {
            self.integrations.openweather_api_key = Some(v);
        }
        if let Some(v) = get("NEWS_API_KEY") {
            self.integrations.news_api_key = Some(v);
        }
        if let Some(v) = get("DOCKER_SOCKET") {
            self.docker.socket = Some(v);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        anyhow::ensure!(
            self.telemetry.system_interval_ms > 0,
            "telemetry.system_interval_ms must be > 0, got {}",
            self.telemetry.system_interval_ms
        );
        anyhow::ensure!(
            self.telemetry.docker_interval_ms > 0,
            "telemetry.docker_interval_ms must be > 0, got {}",
            self.telemetry.docker_interval_ms
        );
        anyhow::ensure!(
            self.telemetry.queue_capacity > 0,
            "telemetry.queue_capacity must be > 0, got {}",
            self.telemetry.queue_capacity
        );
        anyhow::ensure!(
            self.telemetry.stats_log_interval_secs > 0,
            "telemetry.stats_log_interval_secs must be > 0, got {}",
            self.telemetry.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.commands.timeout_secs > 0,
            "commands.timeout_secs must be > 0, got {}",
            self.commands.timeout_secs
        );
        anyhow::ensure!(
            self.commands.service_timeout_secs > 0,
            "commands.service_timeout_secs must be > 0, got {}",
            self.commands.service_timeout_secs
        );
        anyhow::ensure!(
            self.commands.max_output_bytes > 0,
            "commands.max_output_bytes must be > 0, got {}",
            self.commands.max_output_bytes
        );
        anyhow::ensure!(
            self.integrations.request_timeout_secs > 0,
            "integrations.request_timeout_secs must be > 0, got {}",
            self.integrations.request_timeout_secs
        );
        anyhow::ensure!(
            self.integrations.status_timeout_secs > 0,
            "integrations.status_timeout_secs must be > 0, got {}",
            self.integrations.status_timeout_secs
        );
        anyhow::ensure!(
            self.update.timeout_secs > 0,
            "update.timeout_secs must be > 0, got {}",
            self.update.timeout_secs
        );
        anyhow::ensure!(!self.update.branch.is_empty(), "update.branch must be non-empty");
        anyhow::ensure!(!self.update.remote.is_empty(), "update.remote must be non-empty");
        Ok(())
    }
}
