// Host utilities run as child processes: logs, systemd services, sessions, self-update.

mod logs;
mod services;
mod update;
mod users;

pub use logs::{DEFAULT_LOG_LINES, LogOutput};
pub use services::{
    ALLOWED_ACTIONS, DEFAULT_SERVICE_PATTERN, ServiceControl, ServiceListing, filter_lines,
    validate_service_name,
};
pub use update::{
    ComposeContainer, PendingCommits, UpdateCheck, UpdateOutcome, UpdateStatus,
    parse_compose_ps,
};
pub use users::{SshHistory, parse_who, tail_matching};

use std::sync::Arc;
use thiserror::Error;

use crate::config::{CommandsConfig, UpdateConfig};
use crate::shell::{CommandError, CommandRunner};

#[derive(Debug, Error)]
pub enum HostError {
    /// Caller input rejected before anything ran.
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Disabled(String),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unexpected output from {program}: {message}")]
    Parse { program: String, message: String },
}

/// Entry point for every host command. Arguments go to the runner as a vector, never
/// through a shell.
#[derive(Clone)]
pub struct HostCommands {
    runner: Arc<dyn CommandRunner>,
    commands: CommandsConfig,
    update: UpdateConfig,
}

impl HostCommands {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        commands: CommandsConfig,
        update: UpdateConfig,
    ) -> Self {
        Self {
            runner,
            commands,
            update,
        }
    }
}
