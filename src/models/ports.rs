// Port scan models

use serde::{Deserialize, Serialize};

/// Only confirmed-open ports are reported; refused and timed-out probes are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedService {
    pub port: u16,
    pub service: String,
    pub status: PortStatus,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommonPort {
    pub port: u16,
    pub service: &'static str,
}
