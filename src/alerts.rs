// Threshold alerts over a system snapshot

use crate::models::{
    Alert, AlertLevel, AlertMetrics, AlertReport, AlertThresholds, DiskUsage, SystemSnapshot,
};

/// Root filesystem usage, or the largest disk when nothing is mounted at `/`.
pub fn root_disk(disks: &[DiskUsage]) -> Option<&DiskUsage> {
    disks
        .iter()
        .find(|d| d.mount == "/")
        .or_else(|| disks.iter().max_by_key(|d| d.total))
}

pub fn metrics_from_snapshot(snapshot: &SystemSnapshot) -> AlertMetrics {
    let mem = &snapshot.memory;
    let used_mem_pct = if mem.total == 0 {
        0.0
    } else {
        (mem.used as f64 / mem.total as f64 * 100.0).round()
    };
    AlertMetrics {
        cpu_load1: snapshot.cpu.load_average[0],
        used_mem_pct,
        disk_pct: root_disk(&snapshot.disk).map(|d| d.usage),
    }
}

/// Each metric strictly above its threshold yields one warning.
pub fn evaluate(thresholds: AlertThresholds, metrics: AlertMetrics) -> AlertReport {
    let mut alerts = Vec::new();
    if metrics.cpu_load1 > thresholds.cpu_load_warn {
        alerts.push(Alert {
            level: AlertLevel::Warning,
            message: format!("High CPU load: {:.2} (1m)", metrics.cpu_load1),
        });
    }
    if metrics.used_mem_pct > thresholds.mem_usage_warn_pct {
        alerts.push(Alert {
            level: AlertLevel::Warning,
            message: format!("High memory usage: {}%", metrics.used_mem_pct),
        });
    }
    if let Some(disk) = metrics.disk_pct
        && disk > thresholds.disk_usage_warn_pct
    {
        alerts.push(Alert {
            level: AlertLevel::Warning,
            message: format!("High disk usage on /: {}%", disk),
        });
    }
    AlertReport {
        thresholds,
        metrics,
        alerts,
    }
}
