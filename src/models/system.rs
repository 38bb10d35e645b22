// System snapshot models (CPU, memory, disks, network, OS identity)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuSnapshot {
    /// Whole-percent global usage.
    pub usage: f64,
    pub cores: u32,
    /// Celsius; 0 when no CPU sensor is exposed.
    pub temperature: f64,
    /// 1, 5 and 15 minute load averages.
    pub load_average: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapSnapshot {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub cached: u64,
    pub swap: SwapSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskUsage {
    pub mount: String,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    /// Whole-percent used space.
    pub usage: f64,
}

impl DiskUsage {
    pub fn new(mount: String, total: u64, free: u64) -> Self {
        let used = total.saturating_sub(free);
        let usage = if total > 0 {
            ((used as f64 / total as f64) * 100.0).round()
        } else {
            0.0
        };
        Self {
            mount,
            total,
            used,
            free,
            usage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRate {
    pub interface: String,
    /// Received bytes per second since the previous sample.
    pub rx_sec: f64,
    /// Transmitted bytes per second since the previous sample.
    pub tx_sec: f64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsInfo {
    pub platform: String,
    pub distro: String,
    pub release: String,
    pub arch: String,
}

/// One point-in-time read of the host. Pushed as `system:stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    pub cpu: CpuSnapshot,
    pub memory: MemorySnapshot,
    pub disk: Vec<DiskUsage>,
    pub network: Vec<InterfaceRate>,
    /// Seconds since boot.
    pub uptime: u64,
    pub os: OsInfo,
}
