// Child-process execution for host commands (journalctl, systemctl, who, git, docker compose).

use async_trait::async_trait;
use serde::Serialize;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// None when the process was killed by a signal.
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
    #[error("{program} exited with status {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Runs a fixed program with an argument vector. Arguments are never passed through a shell.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Returns the output whatever the exit status; expiry of `timeout` is an error.
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError>;

    /// Like `run`, but a non-zero exit status is an error.
    async fn run_checked(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let out = self.run(program, args, timeout).await?;
        if out.success() {
            Ok(out)
        } else {
            Err(CommandError::Failed {
                program: program.to_string(),
                code: out.code,
                stderr: out.stderr.trim().to_string(),
            })
        }
    }

    /// Whether `program` resolves to an executable on PATH.
    fn has_program(&self, program: &str) -> bool {
        find_program(program, std::env::var_os("PATH")).is_some()
    }
}

/// Resolves `program` against a PATH-style list. Files without the exec bit do not count.
pub fn find_program(program: &str, paths: Option<OsString>) -> Option<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_default();
    which::which_in(program, paths, cwd).ok()
}

/// `tokio::process` backed runner. Output beyond `max_output_bytes` per stream is cut.
pub struct ProcessRunner {
    max_output_bytes: usize,
}

impl ProcessRunner {
    pub fn new(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let end = bytes.len().min(self.max_output_bytes);
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    #[instrument(skip(self, args), fields(operation = "run_command"))]
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let child = Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output();
        let output = match tokio::time::timeout(timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(CommandError::Spawn {
                    program: program.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(CommandError::TimedOut {
                    program: program.to_string(),
                    timeout,
                });
            }
        };
        debug!(program, code = ?output.status.code(), "command finished");
        Ok(CommandOutput {
            stdout: self.decode(&output.stdout),
            stderr: self.decode(&output.stderr),
            code: output.status.code(),
        })
    }
}
