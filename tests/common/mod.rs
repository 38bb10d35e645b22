// Shared test helpers: fake collaborators and sample data
#![allow(dead_code)]

use async_trait::async_trait;
use homedash::config::AppConfig;
use homedash::docker_repo::{ContainerRuntime, DockerError};
use homedash::models::*;
use homedash::shell::{CommandError, CommandOutput, CommandRunner};
use homedash::sysinfo_repo::SnapshotProvider;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn sample_snapshot() -> SystemSnapshot {
    SystemSnapshot {
        cpu: CpuSnapshot {
            usage: 12.0,
            cores: 4,
            temperature: 0.0,
            load_average: [0.5, 0.4, 0.3],
        },
        memory: MemorySnapshot {
            total: 1000,
            used: 400,
            free: 600,
            cached: 0,
            swap: SwapSnapshot {
                total: 0,
                used: 0,
                free: 0,
            },
        },
        disk: vec![DiskUsage::new("/".into(), 1000, 500)],
        network: vec![],
        uptime: 60,
        os: OsInfo {
            platform: "linux".into(),
            distro: "Test Linux".into(),
            release: "6.0".into(),
            arch: "x86_64".into(),
        },
    }
}

/// Returns `snapshot` (or an error while `fail` is set) after `delay`.
pub struct FakeProvider {
    pub snapshot: Mutex<SystemSnapshot>,
    pub fail: AtomicBool,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new(snapshot: SystemSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            fail: AtomicBool::new(false),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl SnapshotProvider for FakeProvider {
    async fn system_snapshot(&self) -> anyhow::Result<SystemSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("sensor read failed");
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }
}

pub fn container(id: &str, state: ContainerState) -> ContainerInfo {
    ContainerInfo {
        id: id.into(),
        name: format!("{}-name", id),
        image: "nginx:latest".into(),
        status: "Up 1 minute".into(),
        state,
        created: 1_700_000_000,
        ports: vec!["80:8080".into()],
    }
}

pub fn stats_for(id: &str) -> ContainerStats {
    ContainerStats {
        id: id.into(),
        cpu_usage: 1.5,
        memory_usage: 100,
        memory_limit: 1000,
        network_rx: 0,
        network_tx: 0,
        block_read: 0,
        block_write: 0,
    }
}

/// In-memory container runtime. `unavailable` makes every call fail like a missing daemon.
#[derive(Default)]
pub struct FakeRuntime {
    pub containers: Vec<ContainerInfo>,
    pub failing_stats: HashSet<String>,
    pub unavailable: bool,
    pub log_chunks: Vec<String>,
    /// Keep the log stream open after the chunks, like `follow`.
    pub follow: bool,
    pub fail_stream: bool,
    pub actions: Mutex<Vec<String>>,
    /// Streams currently inside `stream_logs`; drops back when the task is aborted.
    pub live_streams: Arc<AtomicUsize>,
}

struct LiveStream(Arc<AtomicUsize>);

impl LiveStream {
    fn enter(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count.clone())
    }
}

impl Drop for LiveStream {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeRuntime {
    fn check(&self) -> Result<(), DockerError> {
        if self.unavailable {
            Err(DockerError::Unavailable(
                bollard::errors::Error::RequestTimeoutError,
            ))
        } else {
            Ok(())
        }
    }

    fn known(&self, id: &str) -> Result<(), DockerError> {
        self.check()?;
        if self.containers.iter().any(|c| c.id == id) {
            Ok(())
        } else {
            Err(DockerError::NotFound(id.to_string()))
        }
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list(&self) -> Result<Vec<ContainerInfo>, DockerError> {
        self.check()?;
        Ok(self.containers.clone())
    }

    async fn stats(&self, id: &str) -> Result<ContainerStats, DockerError> {
        self.known(id)?;
        if self.failing_stats.contains(id) {
            return Err(DockerError::Api(format!("stats for {} failed", id)));
        }
        Ok(stats_for(id))
    }

    async fn start(&self, id: &str) -> Result<(), DockerError> {
        self.known(id)?;
        self.actions.lock().unwrap().push(format!("start {}", id));
        Ok(())
    }

    async fn stop(&self, id: &str) -> Result<(), DockerError> {
        self.known(id)?;
        self.actions.lock().unwrap().push(format!("stop {}", id));
        Ok(())
    }

    async fn restart(&self, id: &str) -> Result<(), DockerError> {
        self.known(id)?;
        self.actions.lock().unwrap().push(format!("restart {}", id));
        Ok(())
    }

    async fn logs(&self, id: &str, tail: u32) -> Result<String, DockerError> {
        self.known(id)?;
        Ok(format!("last {} lines of {}", tail, id))
    }

    async fn stream_logs(
        &self,
        id: &str,
        on_chunk: &mut (dyn FnMut(String) + Send),
    ) -> Result<(), DockerError> {
        self.known(id)?;
        if self.fail_stream {
            return Err(DockerError::Api("stream broke".into()));
        }
        let _live = LiveStream::enter(&self.live_streams);
        for chunk in &self.log_chunks {
            on_chunk(chunk.clone());
        }
        if self.follow {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

/// Records every invocation and answers with a canned output.
pub struct RecordingRunner {
    pub calls: Mutex<Vec<(String, Vec<String>)>>,
    pub output: CommandOutput,
    pub programs: Vec<String>,
}

impl RecordingRunner {
    pub fn new(stdout: &str, code: i32) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            output: CommandOutput {
                stdout: stdout.into(),
                stderr: String::new(),
                code: Some(code),
            },
            programs: Vec::new(),
        }
    }

    pub fn with_programs(mut self, programs: &[&str]) -> Self {
        self.programs = programs.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(p, a)| format!("{} {}", p, a.join(" ")))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push((
            program.to_string(),
            args.iter().map(|a| a.to_string()).collect(),
        ));
        Ok(self.output.clone())
    }

    fn has_program(&self, program: &str) -> bool {
        self.programs.iter().any(|p| p == program)
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::load_from_str(
        r#"
[server]
port = 8081
frontend_url = "http://localhost:3200"

[telemetry]
system_interval_ms = 100
docker_interval_ms = 100
"#,
    )
    .unwrap()
}
