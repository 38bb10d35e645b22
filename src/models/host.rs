// Host-level models: alerts, login sessions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertThresholds {
    /// 1-minute load average.
    pub cpu_load_warn: f64,
    pub mem_usage_warn_pct: f64,
    pub disk_usage_warn_pct: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            cpu_load_warn: 2.0,
            mem_usage_warn_pct: 85.0,
            disk_usage_warn_pct: 85.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertMetrics {
    pub cpu_load1: f64,
    pub used_mem_pct: f64,
    /// None when no root filesystem could be found.
    pub disk_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertReport {
    pub thresholds: AlertThresholds,
    pub metrics: AlertMetrics,
    pub alerts: Vec<Alert>,
}

/// One line of `who` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: String,
    pub tty: String,
    pub date: String,
    pub host: Option<String>,
}
