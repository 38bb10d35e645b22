use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::{HostCommands, HostError};
use crate::shell::CommandOutput;
use crate::version;

const DIRTY_TREE_MESSAGE: &str =
    "Working directory has uncommitted changes. Please commit or stash them first.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheck {
    pub current_version: String,
    pub latest_version: String,
    pub is_up_to_date: bool,
    pub update_available: bool,
    /// RFC 3339.
    pub last_checked: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCommits {
    pub has_updates: bool,
    pub pending_commits: Vec<String>,
}

/// Result of a multi-step update. On failure `step` names the command that failed and
/// `details` carries its stderr.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub output: String,
}

impl UpdateOutcome {
    fn failed(step: &str, details: impl Into<String>, output: String) -> Self {
        Self {
            success: false,
            message: format!("Update failed at {}", step),
            step: Some(step.to_string()),
            details: Some(details.into()),
            output,
        }
    }

    fn done(message: &str, output: String) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            step: None,
            details: None,
            output,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeContainer {
    #[serde(rename(deserialize = "Name"))]
    pub name: String,
    #[serde(rename(deserialize = "State"))]
    pub state: String,
    #[serde(rename(deserialize = "Status"), default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub current_version: String,
    pub is_updating: bool,
    pub containers: Vec<ComposeContainer>,
}

/// `docker compose ps --format json` prints a JSON array on older releases and one
/// object per line on newer ones; both are accepted.
pub fn parse_compose_ps(stdout: &str) -> Result<Vec<ComposeContainer>, serde_json::Error> {
    let trimmed = stdout.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed);
    }
    trimmed
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(serde_json::from_str)
        .collect()
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl HostCommands {
    /// 403 when destructive updates are disabled, 400 without an explicit confirmation.
    pub fn authorize_update(&self, confirm: bool) -> Result<(), HostError> {
        if !self.update.allow_destructive {
            return Err(HostError::Disabled(
                "Updates are disabled in configuration".into(),
            ));
        }
        if !confirm {
            return Err(HostError::Invalid(
                "Confirmation required: send {\"confirm\": true}".into(),
            ));
        }
        Ok(())
    }

    async fn git(&self, args: &[&str]) -> Result<CommandOutput, HostError> {
        let mut full = vec!["-C", self.update.repo_dir.as_str()];
        full.extend_from_slice(args);
        Ok(self
            .runner
            .run_checked("git", &full, self.update.timeout())
            .await?)
    }

    /// One step of an update; failures become an `UpdateOutcome` instead of an error.
    async fn step(
        &self,
        name: &str,
        program: &str,
        args: &[&str],
        log: &mut String,
    ) -> Result<CommandOutput, UpdateOutcome> {
        match self.runner.run(program, args, self.update.timeout()).await {
            Ok(out) if out.success() => {
                log.push_str(&out.stdout);
                Ok(out)
            }
            Ok(out) => {
                warn!(step = name, code = ?out.code, "update step failed");
                Err(UpdateOutcome::failed(
                    name,
                    out.stderr.trim(),
                    std::mem::take(log),
                ))
            }
            Err(e) => {
                warn!(step = name, error = %e, "update step failed");
                Err(UpdateOutcome::failed(name, e.to_string(), std::mem::take(log)))
            }
        }
    }

    fn compose_args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = vec!["compose", "--project-directory", self.update.repo_dir.as_str()];
        full.extend_from_slice(args);
        full
    }

    /// Compares the crate version with the newest tag on the remote.
    #[instrument(skip(self), fields(operation = "update_check"))]
    pub async fn check_latest_tag(&self) -> Result<UpdateCheck, HostError> {
        let out = self
            .git(&["ls-remote", "--tags", "--refs", &self.update.remote])
            .await?;
        let current = version::VERSION.to_string();
        let latest = version::latest_tag_version(&out.stdout).unwrap_or_else(|| current.clone());
        let up_to_date = current == latest;
        Ok(UpdateCheck {
            current_version: current,
            latest_version: latest,
            is_up_to_date: up_to_date,
            update_available: !up_to_date,
            last_checked: now_rfc3339(),
        })
    }

    /// `git fetch`, then the one-line log of commits on the tracked branch not yet in HEAD.
    #[instrument(skip(self), fields(operation = "pending_commits"))]
    pub async fn pending_commits(&self) -> Result<PendingCommits, HostError> {
        self.git(&["fetch", &self.update.remote]).await?;
        let range = format!("HEAD..{}/{}", self.update.remote, self.update.branch);
        let out = self.git(&["log", &range, "--oneline"]).await?;
        let pending: Vec<String> = out
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Ok(PendingCommits {
            has_updates: !pending.is_empty(),
            pending_commits: pending,
        })
    }

    /// Refuses a dirty tree, then pulls and rebuilds the compose stack.
    #[instrument(skip(self), fields(operation = "perform_update"))]
    pub async fn perform_update(&self) -> UpdateOutcome {
        let dir = self.update.repo_dir.as_str();
        let mut log = String::new();
        let status = match self
            .step(
                "git status",
                "git",
                &["-C", dir, "status", "--porcelain"],
                &mut log,
            )
            .await
        {
            Ok(out) => out,
            Err(outcome) => return outcome,
        };
        if !status.stdout.trim().is_empty() {
            return UpdateOutcome::failed("git status", DIRTY_TREE_MESSAGE, log);
        }
        log.clear();

        let pull = ["-C", dir, "pull", &self.update.remote, &self.update.branch];
        let down = self.compose_args(&["down"]);
        let up = self.compose_args(&["up", "-d", "--build"]);
        let steps: [(&str, &str, &[&str]); 3] = [
            ("git pull", "git", &pull[..]),
            ("docker compose down", "docker", down.as_slice()),
            ("docker compose up", "docker", up.as_slice()),
        ];
        for (name, program, args) in steps {
            if let Err(outcome) = self.step(name, program, args, &mut log).await {
                return outcome;
            }
        }
        info!("update completed");
        UpdateOutcome::done(
            "Update completed successfully. Services are restarting...",
            log,
        )
    }

    /// `git pull` only.
    #[instrument(skip(self), fields(operation = "pull_update"))]
    pub async fn pull(&self) -> UpdateOutcome {
        let dir = self.update.repo_dir.as_str();
        let mut log = String::new();
        let args = ["-C", dir, "pull", &self.update.remote, &self.update.branch];
        match self.step("git pull", "git", &args, &mut log).await {
            Ok(_) => UpdateOutcome::done("Update completed successfully", log),
            Err(outcome) => outcome,
        }
    }

    #[instrument(skip(self), fields(operation = "restart_services"))]
    pub async fn restart_services(&self) -> UpdateOutcome {
        let mut log = String::new();
        let args = self.compose_args(&["restart"]);
        match self
            .step("docker compose restart", "docker", &args, &mut log)
            .await
        {
            Ok(_) => UpdateOutcome::done("Services restarted successfully", log),
            Err(outcome) => outcome,
        }
    }

    #[instrument(skip(self), fields(operation = "update_status"))]
    pub async fn update_status(&self) -> Result<UpdateStatus, HostError> {
        let args = self.compose_args(&["ps", "--format", "json"]);
        let out = self
            .runner
            .run_checked("docker", &args, self.commands.timeout())
            .await?;
        let containers = parse_compose_ps(&out.stdout).map_err(|e| HostError::Parse {
            program: "docker compose ps".into(),
            message: e.to_string(),
        })?;
        let is_updating = containers
            .iter()
            .any(|c| c.state == "restarting" || c.state == "starting");
        Ok(UpdateStatus {
            current_version: version::VERSION.to_string(),
            is_updating,
            containers,
        })
    }
}
