use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::{HostCommands, HostError};
use crate::shell::CommandError;

pub const ALLOWED_ACTIONS: &[&str] = &["start", "stop", "restart", "enable", "disable", "status"];
pub const DEFAULT_SERVICE_PATTERN: &str = "nginx|apache2|docker|ssh|sshd";

/// Compiled patterns above this size are rejected as invalid.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceListing {
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceControl {
    pub success: bool,
    pub output: String,
    pub error: String,
}

/// Unit names: `[A-Za-z0-9@._-]+`, not starting with '-'.
pub fn validate_service_name(name: &str) -> Result<(), HostError> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(HostError::Invalid(format!("Invalid service name: {}", name)))
    }
}

/// Lines of `output` matching `pattern`, newline-terminated.
pub fn filter_lines(output: &str, pattern: &Regex) -> String {
    output
        .lines()
        .filter(|l| pattern.is_match(l))
        .fold(String::new(), |mut acc, l| {
            acc.push_str(l);
            acc.push('\n');
            acc
        })
}

fn compile_pattern(q: Option<&str>) -> Result<Regex, HostError> {
    let pattern = q
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or(DEFAULT_SERVICE_PATTERN);
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| HostError::Invalid(format!("Invalid pattern: {}", e)))
}

impl HostCommands {
    #[instrument(skip(self), fields(operation = "list_services"))]
    pub async fn list_services(&self, q: Option<&str>) -> Result<ServiceListing, HostError> {
        let pattern = compile_pattern(q)?;
        let out = self
            .runner
            .run_checked(
                "systemctl",
                &["list-units", "--type=service", "--all", "--no-pager"],
                self.commands.timeout(),
            )
            .await?;
        Ok(ServiceListing {
            output: filter_lines(&out.stdout, &pattern),
        })
    }

    /// Runs `systemctl <action> <name>`. Input is checked before anything runs. A non-zero
    /// exit (e.g. `status` of a stopped unit) is reported as `success: false` with the
    /// output kept; so is expiry of the service timeout.
    #[instrument(skip(self), fields(operation = "control_service"))]
    pub async fn control_service(
        &self,
        name: &str,
        action: &str,
    ) -> Result<ServiceControl, HostError> {
        if !ALLOWED_ACTIONS.contains(&action) {
            return Err(HostError::Invalid("Invalid action".into()));
        }
        validate_service_name(name)?;

        let timeout = self.commands.service_timeout();
        match self.runner.run("systemctl", &[action, name], timeout).await {
            Ok(out) => {
                let success = out.success();
                info!(service = name, action, success, "service command finished");
                Ok(ServiceControl {
                    success,
                    output: out.stdout,
                    error: out.stderr,
                })
            }
            Err(e @ CommandError::TimedOut { .. }) => {
                warn!(service = name, action, error = %e, "service command timed out");
                Ok(ServiceControl {
                    success: false,
                    output: String::new(),
                    error: e.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_names() {
        assert!(validate_service_name("nginx").is_ok());
        assert!(validate_service_name("getty@tty1.service").is_ok());
        assert!(validate_service_name("my_app-2").is_ok());
        assert!(validate_service_name("").is_err());
        assert!(validate_service_name("--now").is_err());
        assert!(validate_service_name("nginx; rm -rf /").is_err());
        assert!(validate_service_name("a b").is_err());
    }

    #[test]
    fn filtering_is_case_insensitive() {
        let out = "  nginx.service loaded active\n  cron.service loaded active\n  SSH.service loaded\n";
        let re = compile_pattern(None).unwrap();
        assert_eq!(
            filter_lines(out, &re),
            "  nginx.service loaded active\n  SSH.service loaded\n"
        );
    }

    #[test]
    fn blank_pattern_uses_default_and_bad_pattern_is_invalid() {
        assert_eq!(compile_pattern(Some("  ")).unwrap().as_str(), DEFAULT_SERVICE_PATTERN);
        assert!(matches!(
            compile_pattern(Some("(unclosed")),
            Err(HostError::Invalid(_))
        ));
    }
}
