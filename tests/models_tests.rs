// Model serialization tests (JSON wire shape seen by the dashboard)

mod common;

use common::{container, sample_snapshot, stats_for};
use homedash::models::*;
use serde_json::{Value, json};

#[test]
fn test_system_snapshot_serialization_camel_case() {
    let json = serde_json::to_value(sample_snapshot()).unwrap();
    assert_eq!(json["cpu"]["loadAverage"], json!([0.5, 0.4, 0.3]));
    assert_eq!(json["memory"]["swap"]["total"], 0);
    assert_eq!(json["disk"][0]["usage"], 50.0);
    assert_eq!(json["os"]["distro"], "Test Linux");
    assert!(json.get("load_average").is_none());
}

#[test]
fn test_disk_usage_rounds_and_saturates() {
    let d = DiskUsage::new("/data".into(), 3, 2);
    assert_eq!(d.used, 1);
    assert_eq!(d.usage, 33.0);

    let empty = DiskUsage::new("/empty".into(), 0, 0);
    assert_eq!(empty.usage, 0.0);

    let odd = DiskUsage::new("/odd".into(), 10, 20);
    assert_eq!(odd.used, 0);
}

#[test]
fn test_container_serialization() {
    let json = serde_json::to_value(container("abc123", ContainerState::Running)).unwrap();
    assert_eq!(json["state"], "running");
    assert_eq!(json["ports"], json!(["80:8080"]));

    let stats = serde_json::to_value(stats_for("abc123")).unwrap();
    assert_eq!(stats["cpuUsage"], 1.5);
    assert_eq!(stats["memoryLimit"], 1000);
    assert!(stats.get("blockWrite").is_some());
}

#[test]
fn test_unknown_container_state_deserializes() {
    let s: ContainerState = serde_json::from_str("\"removing\"").unwrap();
    assert_eq!(s, ContainerState::Unknown);
    assert_eq!(ContainerState::from_docker("Paused"), ContainerState::Paused);
}

#[test]
fn test_server_event_envelopes() {
    let ev = ServerEvent::DockerStats(ContainerStatsEvent {
        container_id: "c1".into(),
        stats: stats_for("c1"),
    });
    let json: Value = serde_json::to_value(&ev).unwrap();
    assert_eq!(json["event"], ev.name());
    assert_eq!(json["data"]["containerId"], "c1");
    assert_eq!(json["data"]["stats"]["id"], "c1");

    let ev = ServerEvent::DockerLogsStopped(LogStreamStopped {
        container_id: "c1".into(),
    });
    assert_eq!(
        serde_json::to_value(&ev).unwrap(),
        json!({ "event": "docker:logs:stopped", "data": { "containerId": "c1" } })
    );

    let ev = ServerEvent::SystemError(ErrorMessage::new("Failed to get system stats"));
    assert_eq!(
        serde_json::to_value(&ev).unwrap(),
        json!({ "event": "system:error", "data": { "message": "Failed to get system stats" } })
    );
}

#[test]
fn test_client_events_parse() {
    let ev: ClientEvent = serde_json::from_str(r#"{"event":"unsubscribe:system"}"#).unwrap();
    assert_eq!(ev, ClientEvent::UnsubscribeSystem);
    let ev: ClientEvent = serde_json::from_str(r#"{"event":"stop:logs","data":"c1"}"#).unwrap();
    assert_eq!(ev, ClientEvent::StopLogs("c1".into()));
    assert!(serde_json::from_str::<ClientEvent>(r#"{"event":"stream:logs"}"#).is_err());
}

#[test]
fn test_detected_service_serialization() {
    let s = DetectedService {
        port: 443,
        service: "HTTPS".into(),
        status: PortStatus::Open,
        url: "https://localhost:443".into(),
    };
    assert_eq!(
        serde_json::to_value(&s).unwrap(),
        json!({ "port": 443, "service": "HTTPS", "status": "open", "url": "https://localhost:443" })
    );
}

#[test]
fn test_alert_report_serialization() {
    let report = AlertReport {
        thresholds: AlertThresholds::default(),
        metrics: AlertMetrics {
            cpu_load1: 0.5,
            used_mem_pct: 40.0,
            disk_pct: None,
        },
        alerts: vec![],
    };
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["thresholds"]["memUsageWarnPct"], 85.0);
    assert_eq!(json["metrics"]["cpuLoad1"], 0.5);
    assert_eq!(json["metrics"]["diskPct"], Value::Null);
    assert_eq!(json["alerts"], json!([]));
}

#[test]
fn test_upstream_status_serialization() {
    let s = UpstreamStatus {
        service: "GitHub".into(),
        status: UpstreamState::Offline,
        response_time: 5000,
    };
    assert_eq!(
        serde_json::to_value(&s).unwrap(),
        json!({ "service": "GitHub", "status": "offline", "responseTime": 5000 })
    );
}
