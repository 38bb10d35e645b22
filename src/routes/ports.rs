// /api/ports: scan, local address, port table

use axum::{Json, extract::Query};
use serde::Deserialize;
use serde_json::{Value, json};

use super::ApiError;
use crate::port_scanner::{self, DISPLAY_PORTS, SCAN_TIMEOUT};

#[derive(Debug, Deserialize)]
pub(super) struct ScanQuery {
    host: Option<String>,
    ports: Option<String>,
}

pub(super) async fn scan(Query(q): Query<ScanQuery>) -> Result<Json<Value>, ApiError> {
    let host = q
        .host
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    let ports = match q.ports.as_deref() {
        Some(p) if !p.trim().is_empty() => Some(port_scanner::parse_port_list(p)?),
        _ => None,
    };
    let services = port_scanner::scan(&host, ports.as_deref(), SCAN_TIMEOUT).await;
    let count = services.len();
    Ok(Json(json!({ "host": host, "services": services, "count": count })))
}

pub(super) async fn local_ip() -> Result<Json<Value>, ApiError> {
    let ip = port_scanner::local_ipv4().await?;
    Ok(Json(json!({ "ip": ip.to_string() })))
}

pub(super) async fn common_ports() -> Json<Value> {
    Json(json!({ "ports": DISPLAY_PORTS }))
}
