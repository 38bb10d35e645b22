use serde::Serialize;
use tracing::{debug, instrument};

use super::{HostCommands, HostError};

pub const DEFAULT_LOG_LINES: u32 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogOutput {
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    pub lines: u32,
    pub log: String,
}

impl HostCommands {
    /// journald when available, the syslog file otherwise.
    #[instrument(skip(self), fields(operation = "system_logs"))]
    pub async fn system_logs(&self, lines: u32) -> Result<LogOutput, HostError> {
        let n = lines.to_string();
        let timeout = self.commands.timeout();
        let out = if self.runner.has_program("journalctl") {
            self.runner
                .run_checked("journalctl", &["-n", &n, "--no-pager"], timeout)
                .await?
        } else {
            debug!("journalctl not found, tailing syslog");
            self.runner
                .run_checked("tail", &["-n", &n, &self.commands.syslog_path], timeout)
                .await?
        };
        Ok(LogOutput {
            source: "system",
            container: None,
            lines,
            log: out.stdout,
        })
    }

    /// `docker logs` through the CLI. The container writes to both streams, so both are
    /// returned.
    #[instrument(skip(self), fields(operation = "docker_cli_logs"))]
    pub async fn docker_logs(&self, container: &str, lines: u32) -> Result<LogOutput, HostError> {
        let container = container.trim();
        if container.is_empty() {
            return Err(HostError::Invalid(
                "container query param is required".into(),
            ));
        }
        if container.starts_with('-') {
            return Err(HostError::Invalid(format!(
                "invalid container name: {}",
                container
            )));
        }
        let n = lines.to_string();
        let out = self
            .runner
            .run_checked(
                "docker",
                &["logs", "--tail", &n, container],
                self.commands.timeout(),
            )
            .await?;
        let mut log = out.stdout;
        log.push_str(&out.stderr);
        Ok(LogOutput {
            source: "docker",
            container: Some(container.to_string()),
            lines,
            log,
        })
    }
}
