// Shape `docker ps -a` entries into ContainerInfo.

use crate::models::{ContainerInfo, ContainerState};
use bollard::models::ContainerSummary;

pub fn container_info(c: &ContainerSummary) -> ContainerInfo {
    let id = c.id.clone().unwrap_or_default();
    let name = c
        .names
        .as_ref()
        .and_then(|n| n.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Unknown".into());

    let mut ports: Vec<String> = Vec::new();
    for p in c.ports.iter().flatten() {
        let mapping = match p.public_port {
            Some(public) => format!("{}:{}", p.private_port, public),
            None => p.private_port.to_string(),
        };
        // IPv4 and IPv6 bindings of the same mapping are listed separately
        if !ports.contains(&mapping) {
            ports.push(mapping);
        }
    }

    ContainerInfo {
        id,
        name,
        image: c.image.clone().unwrap_or_default(),
        status: c.status.clone().unwrap_or_default(),
        state: c
            .state
            .as_ref()
            .map(|s| ContainerState::from_docker(&s.to_string()))
            .unwrap_or(ContainerState::Unknown),
        created: c.created.unwrap_or(0),
        ports,
    }
}
