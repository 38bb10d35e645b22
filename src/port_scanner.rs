// TCP connect probes against well-known ports, plus local address lookup.

use futures_util::stream::{self, StreamExt};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::{debug, instrument, warn};

use crate::models::{CommonPort, DetectedService, PortStatus};

/// Per-socket connect timeout.
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(2);

/// Longest explicit port list a caller may ask for.
pub const MAX_SCAN_PORTS: usize = 1024;

/// Sockets held open at once during a scan.
const SCAN_CONCURRENCY: usize = 256;

const fn port(port: u16, service: &'static str) -> CommonPort {
    CommonPort { port, service }
}

/// Ports probed when the caller gives none. 3001 appears twice; scans de-duplicate.
pub const COMMON_PORTS: &[CommonPort] = &[
    port(80, "HTTP"),
    port(443, "HTTPS"),
    port(3000, "React Dev Server"),
    port(3001, "Node.js App"),
    port(8080, "HTTP Alt"),
    port(8081, "HTTP Alt"),
    port(9000, "SonarQube"),
    port(8000, "HTTP Alt"),
    port(5000, "Flask Dev"),
    port(4000, "Node.js App"),
    port(3200, "Dashboard"),
    port(5200, "Dashboard API"),
    port(8001, "HTTP Alt"),
    port(9001, "HTTP Alt"),
    port(9443, "HTTPS Alt"),
    port(8888, "Jupyter"),
    port(8889, "Jupyter Alt"),
    port(5001, "Flask Alt"),
    port(6000, "HTTP Alt"),
    port(7000, "HTTP Alt"),
    port(8002, "HTTP Alt"),
    port(9002, "HTTP Alt"),
    port(10000, "Webmin"),
    port(10001, "HTTP Alt"),
    port(11000, "HTTP Alt"),
    port(12000, "HTTP Alt"),
    port(13000, "HTTP Alt"),
    port(14000, "HTTP Alt"),
    port(15000, "HTTP Alt"),
    port(3001, "Node.js App"),
];

/// Shorter list shown in the dashboard's port picker.
pub const DISPLAY_PORTS: &[CommonPort] = &[
    port(80, "HTTP"),
    port(443, "HTTPS"),
    port(3000, "React Dev Server"),
    port(3001, "Node.js App"),
    port(8080, "HTTP Alt"),
    port(8081, "HTTP Alt"),
    port(9000, "SonarQube"),
    port(8000, "HTTP Alt"),
    port(5000, "Flask Dev"),
    port(4000, "Node.js App"),
    port(3200, "Dashboard"),
    port(5200, "Dashboard API"),
    port(8001, "HTTP Alt"),
    port(9001, "HTTP Alt"),
    port(9443, "HTTPS Alt"),
    port(8888, "Jupyter"),
    port(8889, "Jupyter Alt"),
    port(10000, "Webmin"),
];

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("No external IPv4 address found")]
    NoLocalAddress,
    #[error("invalid port list: {0}")]
    InvalidPorts(String),
}

pub fn service_name(port: u16) -> &'static str {
    COMMON_PORTS
        .iter()
        .find(|p| p.port == port)
        .map(|p| p.service)
        .unwrap_or("Unknown")
}

/// `https` for 443 and 9443, `http` otherwise.
pub fn service_url(host: &str, port: u16) -> String {
    let scheme = if port == 443 || port == 9443 {
        "https"
    } else {
        "http"
    };
    if host.contains(':') && !host.starts_with('[') {
        format!("{}://[{}]:{}", scheme, host, port)
    } else {
        format!("{}://{}:{}", scheme, host, port)
    }
}

/// Parses "80,443, 8080" into ports. Empty entries are skipped; anything else that is not
/// a port number in 1..=65535 rejects the whole list, as does a list longer than
/// [`MAX_SCAN_PORTS`].
pub fn parse_port_list(s: &str) -> Result<Vec<u16>, ScanError> {
    let ports = s
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| match p.parse::<u16>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ScanError::InvalidPorts(p.to_string())),
        })
        .collect::<Result<Vec<u16>, ScanError>>()?;
    if ports.len() > MAX_SCAN_PORTS {
        return Err(ScanError::InvalidPorts(format!(
            "{} ports given, at most {} allowed",
            ports.len(),
            MAX_SCAN_PORTS
        )));
    }
    Ok(ports)
}

/// Connects once and closes immediately. Refusal, timeout and resolution failure all
/// yield None.
pub async fn probe(host: &str, port: u16, timeout: Duration) -> Option<DetectedService> {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            Some(DetectedService {
                port,
                service: service_name(port).to_string(),
                status: PortStatus::Open,
                url: service_url(host, port),
            })
        }
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
            debug!(host, port, "port closed");
            None
        }
        Ok(Err(e)) => {
            warn!(host, port, error = %e, "port probe failed");
            None
        }
        Err(_) => {
            debug!(host, port, "port probe timed out");
            None
        }
    }
}

/// Probes ports concurrently, at most `SCAN_CONCURRENCY` sockets at a time; returns only
/// open ones, ascending and de-duplicated.
#[instrument(skip(ports), fields(operation = "scan_ports"))]
pub async fn scan(host: &str, ports: Option<&[u16]>, timeout: Duration) -> Vec<DetectedService> {
    let mut targets: Vec<u16> = match ports {
        Some(p) => p.to_vec(),
        None => COMMON_PORTS.iter().map(|p| p.port).collect(),
    };
    targets.sort_unstable();
    targets.dedup();

    let mut open: Vec<DetectedService> = stream::iter(targets)
        .map(|p| probe(host, p, timeout))
        .buffer_unordered(SCAN_CONCURRENCY)
        .filter_map(|found| async move { found })
        .collect()
        .await;
    open.sort_by_key(|s| s.port);
    open
}

/// First non-loopback IPv4 address, interfaces taken in name order.
pub async fn local_ipv4() -> Result<Ipv4Addr, ScanError> {
    tokio::task::spawn_blocking(|| {
        let networks = sysinfo::Networks::new_with_refreshed_list();
        let mut names: Vec<&String> = networks.list().keys().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| networks.list().get(name))
            .flat_map(|data| data.ip_networks().iter().map(|n| n.addr))
            .find_map(|addr| match addr {
                IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4),
                _ => None,
            })
    })
    .await
    .ok()
    .flatten()
    .ok_or(ScanError::NoLocalAddress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn url_scheme_follows_port() {
        assert_eq!(service_url("host", 443), "https://host:443");
        assert_eq!(service_url("host", 9443), "https://host:9443");
        assert_eq!(service_url("host", 8080), "http://host:8080");
        assert_eq!(service_url("::1", 80), "http://[::1]:80");
    }

    #[test]
    fn service_names_come_from_the_table() {
        assert_eq!(service_name(8888), "Jupyter");
        assert_eq!(service_name(31337), "Unknown");
    }

    #[test]
    fn port_list_parsing() {
        assert_eq!(parse_port_list("80, 443,,8080").unwrap(), vec![80, 443, 8080]);
        assert!(parse_port_list("80,http").is_err());
        assert!(parse_port_list("0").is_err());
        assert!(parse_port_list("70000").is_err());
    }

    #[test]
    fn port_list_length_is_capped() {
        let at_cap = (1..=MAX_SCAN_PORTS as u16).map(|p| p.to_string()).collect::<Vec<_>>();
        assert_eq!(parse_port_list(&at_cap.join(",")).unwrap().len(), MAX_SCAN_PORTS);

        let over = (1..=MAX_SCAN_PORTS as u16 + 1)
            .map(|p| p.to_string())
            .collect::<Vec<_>>();
        assert!(matches!(
            parse_port_list(&over.join(",")),
            Err(ScanError::InvalidPorts(_))
        ));
    }

    #[test]
    fn common_ports_table_is_thirty_entries() {
        assert_eq!(COMMON_PORTS.len(), 30);
        assert_eq!(DISPLAY_PORTS.len(), 18);
        let mut unique: Vec<u16> = COMMON_PORTS.iter().map(|p| p.port).collect();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 29);
        assert!(!unique.contains(&22));
    }

    #[tokio::test]
    async fn scan_reports_only_the_listening_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open_port = listener.local_addr().unwrap().port();
        // Bind then release to get a port with nothing behind it.
        let closed_port = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap().port()
        };

        let found = scan("127.0.0.1", Some(&[closed_port, open_port]), SCAN_TIMEOUT).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].port, open_port);
        assert_eq!(found[0].status, PortStatus::Open);
        assert_eq!(found[0].url, format!("http://127.0.0.1:{}", open_port));
        drop(listener);
    }

    #[tokio::test]
    async fn scan_results_are_sorted_and_deduplicated() {
        let a = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let b = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let pa = a.local_addr().unwrap().port();
        let pb = b.local_addr().unwrap().port();
        let (hi, lo) = (pa.max(pb), pa.min(pb));

        let found = scan("127.0.0.1", Some(&[hi, lo, hi]), SCAN_TIMEOUT).await;
        let ports: Vec<u16> = found.iter().map(|s| s.port).collect();
        assert_eq!(ports, vec![lo, hi]);
    }

    #[tokio::test]
    async fn scan_wider_than_the_socket_limit_still_finds_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open_port = listener.local_addr().unwrap().port();

        let mut targets: Vec<u16> = (1..=(SCAN_CONCURRENCY as u16 * 3))
            .map(|i| open_port.wrapping_add(i).max(1))
            .collect();
        targets.push(open_port);
        assert!(targets.len() > SCAN_CONCURRENCY);

        let found = scan("127.0.0.1", Some(&targets), SCAN_TIMEOUT).await;
        assert!(found.iter().any(|s| s.port == open_port));
        assert!(found.windows(2).all(|w| w[0].port < w[1].port));
        drop(listener);
    }
}
