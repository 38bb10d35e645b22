// Per-interface byte counters remembered between samples, turned into bytes/sec.

use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
struct CounterSample {
    rx_bytes: u64,
    tx_bytes: u64,
    at: Instant,
}

/// Previous (rx, tx, time) per interface name. Lives as long as its provider.
#[derive(Debug, Default)]
pub struct NetworkRateTracker {
    previous: HashMap<String, CounterSample>,
}

impl NetworkRateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the counters for `interface` and returns `(rx_sec, tx_sec)` relative to
    /// the previous observation. The first observation of an interface yields zero rates.
    pub fn observe(
        &mut self,
        interface: &str,
        rx_bytes: u64,
        tx_bytes: u64,
        now: Instant,
    ) -> (f64, f64) {
        let current = CounterSample {
            rx_bytes,
            tx_bytes,
            at: now,
        };
        match self.previous.insert(interface.to_string(), current) {
            Some(prev) => {
                let elapsed = now.saturating_duration_since(prev.at).as_secs_f64();
                (
                    rate(prev.rx_bytes, rx_bytes, elapsed),
                    rate(prev.tx_bytes, tx_bytes, elapsed),
                )
            }
            None => (0.0, 0.0),
        }
    }

    pub fn tracked_interfaces(&self) -> usize {
        self.previous.len()
    }
}

/// Bytes per second between two cumulative counters. A counter reset or a
/// non-positive interval gives 0.
pub fn rate(previous: u64, current: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    current.saturating_sub(previous) as f64 / elapsed_secs
}
