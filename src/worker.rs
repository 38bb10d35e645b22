// Background app-stats logger: live connections and running subscription timers.

use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{Duration, interval};

use crate::telemetry::ConnectionRegistry;

/// Logs registry counts every `stats_log_interval_secs` until `shutdown_rx` fires.
pub fn spawn(
    registry: Arc<ConnectionRegistry>,
    stats_log_interval_secs: u64,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    let period = Duration::from_secs(stats_log_interval_secs);
    tokio::spawn(async move {
        let mut stats_log_tick = interval(period);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately; skip it so the first line comes after one period.
        stats_log_tick.tick().await;

        loop {
            tokio::select! {
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        ws_clients = registry.connection_count(),
                        subscription_timers = registry.total_timers(),
                        "app stats"
                    );
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Stats logger shutting down");
                    break;
                }
            }
        }
    })
}
