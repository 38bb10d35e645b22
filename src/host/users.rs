use serde::Serialize;
use std::io::SeekFrom;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::instrument;

use super::{HostCommands, HostError};
use crate::models::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SshHistory {
    pub lines: u32,
    pub log: String,
}

/// Parses `who` output, e.g. `alice pts/0 2025-10-14 12:34 (192.168.1.10)`. The trailing
/// parenthesised token, if any, is the remote host; everything between tty and host is
/// the login date.
pub fn parse_who(stdout: &str) -> Vec<Session> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 2 {
                return None;
            }
            let host = match parts.last() {
                Some(last) if parts.len() > 2 && last.starts_with('(') && last.ends_with(')') => {
                    let h = last.trim_matches(|c| c == '(' || c == ')').to_string();
                    parts.pop();
                    Some(h).filter(|h| !h.is_empty())
                }
                _ => None,
            };
            Some(Session {
                user: parts[0].to_string(),
                tty: parts[1].to_string(),
                date: parts[2..].join(" "),
                host,
            })
        })
        .collect()
}

/// Last `n` lines containing `needle` (ASCII case-insensitive), newline-terminated.
pub fn tail_matching(content: &str, needle: &str, n: usize) -> String {
    let needle = needle.to_ascii_lowercase();
    let matching: Vec<&str> = content
        .lines()
        .filter(|l| l.to_ascii_lowercase().contains(&needle))
        .collect();
    let start = matching.len().saturating_sub(n);
    matching[start..].iter().fold(String::new(), |mut acc, l| {
        acc.push_str(l);
        acc.push('\n');
        acc
    })
}

/// Reads at most the last `max_bytes` of a file. When the window starts mid-file the
/// partial first line is dropped.
pub async fn read_tail(path: &str, max_bytes: usize) -> std::io::Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();
    let start = len.saturating_sub(max_bytes as u64);
    file.seek(SeekFrom::Start(start)).await?;

    let mut buf = Vec::with_capacity((len - start) as usize);
    file.take(max_bytes as u64).read_to_end(&mut buf).await?;
    if start > 0 {
        let cut = buf.iter().position(|&b| b == b'\n').map_or(buf.len(), |i| i + 1);
        buf.drain(..cut);
    }
    Ok(buf)
}

impl HostCommands {
    #[instrument(skip(self), fields(operation = "sessions"))]
    pub async fn sessions(&self) -> Result<Vec<Session>, HostError> {
        let out = self
            .runner
            .run_checked("who", &[], self.commands.timeout())
            .await?;
        Ok(parse_who(&out.stdout))
    }

    /// sshd lines from the tail of the auth log, at most `max_output_bytes` of it.
    #[instrument(skip(self), fields(operation = "ssh_history"))]
    pub async fn ssh_history(&self, lines: u32) -> Result<SshHistory, HostError> {
        let path = &self.commands.auth_log_path;
        let bytes = read_tail(path, self.commands.max_output_bytes)
            .await
            .map_err(|source| HostError::Read {
                path: path.clone(),
                source,
            })?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(SshHistory {
            lines,
            log: tail_matching(&content, "sshd", lines as usize),
        })
    }
}
