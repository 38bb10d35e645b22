// System stats via sysinfo

mod linux;
mod rates;

pub use rates::{NetworkRateTracker, rate};

use crate::models::*;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use sysinfo::{Components, Disks, Networks, System};
use tracing::instrument;

/// Produces a full system snapshot on demand.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Fails as a whole if any sub-read fails; there are no partial snapshots.
    async fn system_snapshot(&self) -> anyhow::Result<SystemSnapshot>;
}

pub struct SysinfoRepo {
    sys: Arc<Mutex<System>>,
    disks: Arc<Mutex<Disks>>,
    networks: Arc<Mutex<Networks>>,
    components: Arc<Mutex<Components>>,
    rates: Arc<Mutex<NetworkRateTracker>>,
    last_cpu_refresh: Arc<Mutex<Option<(Instant, f64)>>>,
}

impl Default for SysinfoRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a sysinfo refresh on the blocking pool.
async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
}

fn lock<'a, T>(m: &'a Mutex<T>, what: &str) -> anyhow::Result<std::sync::MutexGuard<'a, T>> {
    m.lock()
        .map_err(|e| anyhow::anyhow!("sysinfo {} lock poisoned: {}", what, e))
}

fn is_cpu_sensor(label: &str) -> bool {
    let l = label.to_ascii_lowercase();
    l.contains("cpu") || l.contains("package") || l.contains("tctl") || l.contains("tdie")
}

impl SysinfoRepo {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();
        Self {
            sys: Arc::new(Mutex::new(sys)),
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
            components: Arc::new(Mutex::new(Components::new_with_refreshed_list())),
            rates: Arc::new(Mutex::new(NetworkRateTracker::new())),
            last_cpu_refresh: Arc::new(Mutex::new(None)),
        }
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_cpu"))]
    pub async fn get_cpu(&self) -> anyhow::Result<CpuSnapshot> {
        let sys = self.sys.clone();
        let components = self.components.clone();
        let last_cpu_refresh = self.last_cpu_refresh.clone();
        blocking(move || {
            let mut sys = lock(&sys, "system")?;
            let now = Instant::now();
            let mut last = lock(&last_cpu_refresh, "cpu refresh")?;
            let previous = *last;
            let usage = match previous {
                // sysinfo needs a minimum gap between refreshes to compute usage
                Some((prev_ts, prev_usage))
                    if now.duration_since(prev_ts) < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL =>
                {
                    prev_usage
                }
                _ => {
                    sys.refresh_cpu_usage();
                    let usage = sys.global_cpu_usage() as f64;
                    *last = Some((now, usage));
                    usage
                }
            };
            let cores = sys.cpus().len() as u32;
            drop(sys);

            let temperature = {
                let mut components = lock(&components, "components")?;
                components.refresh(false);
                components
                    .iter()
                    .filter(|c| is_cpu_sensor(c.label()))
                    .find_map(|c| c.temperature())
                    .map(f64::from)
                    .unwrap_or(0.0)
            };

            let load = System::load_average();
            Ok(CpuSnapshot {
                usage: usage.clamp(0.0, 100.0).round(),
                cores,
                temperature,
                load_average: [load.one, load.five, load.fifteen],
            })
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_memory"))]
    pub async fn get_memory(&self) -> anyhow::Result<MemorySnapshot> {
        let sys = self.sys.clone();
        blocking(move || {
            let mut sys = lock(&sys, "system")?;
            sys.refresh_memory();
            Ok(MemorySnapshot {
                total: sys.total_memory(),
                used: sys.used_memory(),
                free: sys.free_memory(),
                cached: linux::read_cached_memory_linux(),
                swap: SwapSnapshot {
                    total: sys.total_swap(),
                    used: sys.used_swap(),
                    free: sys.free_swap(),
                },
            })
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_disks"))]
    pub async fn get_disks(&self) -> anyhow::Result<Vec<DiskUsage>> {
        let disks = self.disks.clone();
        blocking(move || {
            let mut disks = lock(&disks, "disks")?;
            disks.refresh(false);
            Ok(disks
                .list()
                .iter()
                .filter(|d| d.total_space() > 0)
                .map(|d| {
                    DiskUsage::new(
                        d.mount_point().to_string_lossy().into_owned(),
                        d.total_space(),
                        d.available_space(),
                    )
                })
                .collect())
        })
        .await
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_network"))]
    pub async fn get_network(&self) -> anyhow::Result<Vec<InterfaceRate>> {
        let networks = self.networks.clone();
        let rates = self.rates.clone();
        blocking(move || {
            let mut networks = lock(&networks, "networks")?;
            networks.refresh(true);
            // Counter update and rate read stay under one lock.
            let mut rates = lock(&rates, "network rates")?;
            let now = Instant::now();
            let mut interfaces: Vec<InterfaceRate> = networks
                .list()
                .iter()
                .map(|(name, data)| {
                    let rx_bytes = data.total_received();
                    let tx_bytes = data.total_transmitted();
                    let (rx_sec, tx_sec) = rates.observe(name, rx_bytes, tx_bytes, now);
                    InterfaceRate {
                        interface: name.clone(),
                        rx_sec,
                        tx_sec,
                        rx_bytes,
                        tx_bytes,
                    }
                })
                .collect();
            interfaces.sort_by(|a, b| a.interface.cmp(&b.interface));
            Ok(interfaces)
        })
        .await
    }

    pub fn os_info() -> OsInfo {
        OsInfo {
            platform: std::env::consts::OS.to_string(),
            distro: linux::read_os_distro_linux()
                .or_else(System::long_os_version)
                .or_else(System::name)
                .unwrap_or_default(),
            release: System::kernel_version().unwrap_or_default(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

#[async_trait]
impl SnapshotProvider for SysinfoRepo {
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "system_snapshot"))]
    async fn system_snapshot(&self) -> anyhow::Result<SystemSnapshot> {
        let (cpu, memory, disk, network) = tokio::try_join!(
            self.get_cpu(),
            self.get_memory(),
            self.get_disks(),
            self.get_network(),
        )?;
        Ok(SystemSnapshot {
            cpu,
            memory,
            disk,
            network,
            uptime: System::uptime(),
            os: Self::os_info(),
        })
    }
}
