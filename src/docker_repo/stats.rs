// Process raw Docker stats API response into ContainerStats.

use crate::models::ContainerStats;
use bollard::models::{ContainerBlkioStatEntry, ContainerStatsResponse};

/// CPU usage in percent (two decimals) from the container and host deltas between the
/// current and previous samples of one stats response. A non-positive host delta gives 0.
pub fn cpu_percent(cpu_delta: i64, system_delta: i64) -> f64 {
    if system_delta <= 0 {
        return 0.0;
    }
    let pct = (cpu_delta as f64 / system_delta as f64) * 100.0;
    ((pct * 100.0).round() / 100.0).max(0.0)
}

fn sum_blkio(entries: &[ContainerBlkioStatEntry], op: &str) -> u64 {
    entries
        .iter()
        .filter(|e| e.op.as_ref().is_some_and(|o| o.eq_ignore_ascii_case(op)))
        .map(|e| e.value.unwrap_or(0))
        .sum()
}

/// Process a raw Docker stats response into our ContainerStats. Missing sections count as 0.
pub fn process_statistics(s: &ContainerStatsResponse, id: &str) -> ContainerStats {
    let total_usage = |c: &Option<bollard::models::ContainerCpuStats>| {
        c.as_ref()
            .and_then(|c| c.cpu_usage.as_ref())
            .and_then(|u| u.total_usage)
            .unwrap_or(0) as i64
    };
    let system_usage = |c: &Option<bollard::models::ContainerCpuStats>| {
        c.as_ref().and_then(|c| c.system_cpu_usage).unwrap_or(0) as i64
    };
    let cpu_delta = total_usage(&s.cpu_stats) - total_usage(&s.precpu_stats);
    let system_delta = system_usage(&s.cpu_stats) - system_usage(&s.precpu_stats);

    let memory_usage = s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0);
    let memory_limit = s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0);

    let (network_rx, network_tx) = s.networks.as_ref().map_or((0, 0), |n| {
        n.values().fold((0u64, 0u64), |(rx, tx), v| {
            (rx + v.rx_bytes.unwrap_or(0), tx + v.tx_bytes.unwrap_or(0))
        })
    });

    let blkio = s
        .blkio_stats
        .as_ref()
        .and_then(|b| b.io_service_bytes_recursive.as_deref())
        .unwrap_or(&[]);

    ContainerStats {
        id: id.to_string(),
        cpu_usage: cpu_percent(cpu_delta, system_delta),
        memory_usage,
        memory_limit,
        network_rx,
        network_tx,
        block_read: sum_blkio(blkio, "read"),
        block_write: sum_blkio(blkio, "write"),
    }
}
