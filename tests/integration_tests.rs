// Integration tests: HTTP and WebSocket endpoints against fake collaborators

mod common;

use axum_test::TestServer;
use common::*;
use homedash::config::AppConfig;
use homedash::models::{ContainerState, DiskUsage};
use homedash::routes::{self, AppState};
use serde_json::{Value, json};
use std::sync::Arc;

struct Harness {
    server: TestServer,
    runner: Arc<RecordingRunner>,
    runtime: Arc<FakeRuntime>,
}

fn build(
    provider: FakeProvider,
    runtime: FakeRuntime,
    runner: RecordingRunner,
    config: AppConfig,
    http_transport: bool,
) -> Harness {
    let runner = Arc::new(runner);
    let runtime = Arc::new(runtime);
    let state = AppState::new(
        Arc::new(provider),
        runtime.clone(),
        runner.clone(),
        config,
    )
    .unwrap();
    let app = routes::app(state);
    let server = if http_transport {
        TestServer::builder().http_transport().build(app)
    } else {
        TestServer::new(app)
    };
    Harness {
        server,
        runner,
        runtime,
    }
}

fn harness() -> Harness {
    build(
        FakeProvider::new(sample_snapshot()),
        FakeRuntime {
            containers: vec![
                container("c1", ContainerState::Running),
                container("c2", ContainerState::Exited),
            ],
            ..Default::default()
        },
        RecordingRunner::new("", 0),
        test_config(),
        false,
    )
}

fn harness_with_runner(runner: RecordingRunner) -> Harness {
    build(
        FakeProvider::new(sample_snapshot()),
        FakeRuntime::default(),
        runner,
        test_config(),
        false,
    )
}

#[tokio::test]
async fn test_health_endpoint() {
    let h = harness();
    let response = h.server.get("/api/health").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "ok");
    assert!(json["timestamp"].as_str().is_some());
    assert!(json["uptime"].as_f64().is_some());
}

#[tokio::test]
async fn test_version_endpoint() {
    let h = harness();
    let response = h.server.get("/api/version/current").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["name"], "homedash");
    assert!(json["version"].as_str().is_some());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let h = harness();
    let response = h.server.get("/api/nope").await;
    response.assert_status_not_found();
    response.assert_json(&json!({ "error": "Route not found" }));
}

#[tokio::test]
async fn test_system_stats_and_views() {
    let h = harness();
    let stats: Value = h.server.get("/api/system/stats").await.json();
    assert_eq!(stats["cpu"]["cores"], 4);
    assert_eq!(stats["memory"]["total"], 1000);

    let cpu: Value = h.server.get("/api/system/cpu-history").await.json();
    assert_eq!(cpu["loadAverage"][0], 0.5);
    assert!(cpu["timestamp"].as_i64().is_some());

    let disks: Value = h.server.get("/api/system/disk-usage").await.json();
    assert_eq!(disks["disks"][0]["mount"], "/");
}

#[tokio::test]
async fn test_system_stats_failure_is_500() {
    let h = build(
        FakeProvider::new(sample_snapshot()).failing(),
        FakeRuntime::default(),
        RecordingRunner::new("", 0),
        test_config(),
        false,
    );
    let response = h.server.get("/api/system/stats").await;
    response.assert_status_internal_server_error();
    let json: Value = response.json();
    assert_eq!(json["error"], "Failed to get system stats");
}

#[tokio::test]
async fn test_alerts_report_cpu_and_memory_only() {
    let mut snapshot = sample_snapshot();
    snapshot.cpu.load_average = [2.5, 1.0, 1.0];
    snapshot.memory.used = 900;
    snapshot.disk = vec![DiskUsage::new("/".into(), 1000, 500)];
    let h = build(
        FakeProvider::new(snapshot),
        FakeRuntime::default(),
        RecordingRunner::new("", 0),
        test_config(),
        false,
    );
    let json: Value = h.server.get("/api/alerts").await.json();
    assert_eq!(json["metrics"]["usedMemPct"], 90.0);
    assert_eq!(json["metrics"]["diskPct"], 50.0);
    assert_eq!(json["thresholds"]["cpuLoadWarn"], 2.0);
    let alerts = json["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0]["level"], "warning");
    assert_eq!(alerts[0]["message"], "High CPU load: 2.50 (1m)");
    assert_eq!(alerts[1]["message"], "High memory usage: 90%");
}

// --- docker ---

#[tokio::test]
async fn test_docker_list_and_actions() {
    let h = harness();
    let list: Value = h.server.get("/api/docker/containers").await.json();
    assert_eq!(list.as_array().unwrap().len(), 2);
    assert_eq!(list[0]["state"], "running");

    let response = h.server.post("/api/docker/containers/c1/restart").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "message": "Container restarted successfully" }));
    assert_eq!(*h.runtime.actions.lock().unwrap(), vec!["restart c1"]);

    let logs: Value = h.server.get("/api/docker/containers/c1/logs").await.json();
    assert_eq!(logs["logs"], "last 100 lines of c1");
}

#[tokio::test]
async fn test_docker_unknown_container_is_404() {
    let h = harness();
    h.server
        .get("/api/docker/containers/missing/stats")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_docker_unavailable_is_503() {
    let h = build(
        FakeProvider::new(sample_snapshot()),
        FakeRuntime {
            unavailable: true,
            ..Default::default()
        },
        RecordingRunner::new("", 0),
        test_config(),
        false,
    );
    let response = h.server.get("/api/docker/containers").await;
    response.assert_status_service_unavailable();
    let json: Value = response.json();
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to connect to Docker daemon")
    );
}

// --- ports ---

#[tokio::test]
async fn test_common_ports_table() {
    let h = harness();
    let json: Value = h.server.get("/api/ports/common-ports").await.json();
    let ports = json["ports"].as_array().unwrap();
    assert_eq!(ports.len(), 18);
    assert_eq!(ports[0], json!({ "port": 80, "service": "HTTP" }));
}

#[tokio::test]
async fn test_port_scan_rejects_bad_list() {
    let h = harness();
    h.server
        .get("/api/ports/scan")
        .add_query_param("ports", "80,http")
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_port_scan_rejects_oversized_list() {
    let h = harness();
    let ports: Vec<String> = (1..=2000u16).map(|p| p.to_string()).collect();
    h.server
        .get("/api/ports/scan")
        .add_query_param("host", "127.0.0.1")
        .add_query_param("ports", ports.join(","))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_port_scan_reports_listener() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let h = harness();
    let json: Value = h
        .server
        .get("/api/ports/scan")
        .add_query_param("host", "127.0.0.1")
        .add_query_param("ports", port.to_string())
        .await
        .json();
    assert_eq!(json["host"], "127.0.0.1");
    assert_eq!(json["count"], 1);
    assert_eq!(json["services"][0]["status"], "open");
    assert_eq!(json["services"][0]["port"], port);
}

// --- host commands ---

#[tokio::test]
async fn test_invalid_service_action_runs_nothing() {
    let h = harness();
    let response = h.server.post("/api/services/nginx/explode").await;
    response.assert_status_bad_request();
    response.assert_json(&json!({ "error": "Invalid action" }));
    assert_eq!(h.runner.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_service_name_runs_nothing() {
    let h = harness();
    h.server
        .post("/api/services/nginx%20x/restart")
        .await
        .assert_status_bad_request();
    assert_eq!(h.runner.call_count(), 0);
}

#[tokio::test]
async fn test_service_control_runs_systemctl() {
    let h = harness_with_runner(RecordingRunner::new("restarted\n", 0));
    let response = h.server.post("/api/services/nginx/restart").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["success"], true);
    assert_eq!(json["output"], "restarted\n");
    assert_eq!(h.runner.commands(), vec!["systemctl restart nginx"]);
}

#[tokio::test]
async fn test_service_status_non_zero_keeps_output() {
    let h = harness_with_runner(RecordingRunner::new("inactive (dead)\n", 3));
    let json: Value = h.server.post("/api/services/nginx/status").await.json();
    assert_eq!(json["success"], false);
    assert_eq!(json["output"], "inactive (dead)\n");
}

#[tokio::test]
async fn test_service_list_filters_and_rejects_bad_pattern() {
    let h = harness_with_runner(RecordingRunner::new(
        "nginx.service loaded active\ncron.service loaded active\n",
        0,
    ));
    let json: Value = h.server.get("/api/services").await.json();
    assert_eq!(json["output"], "nginx.service loaded active\n");

    h.server
        .get("/api/services")
        .add_query_param("q", "(")
        .await
        .assert_status_bad_request();
    assert_eq!(h.runner.call_count(), 1);
}

#[tokio::test]
async fn test_system_logs_fall_back_to_syslog() {
    let h = harness_with_runner(RecordingRunner::new("log line\n", 0));
    let json: Value = h
        .server
        .get("/api/logs/system")
        .add_query_param("lines", 50)
        .await
        .json();
    assert_eq!(json["source"], "system");
    assert_eq!(json["lines"], 50);
    assert_eq!(h.runner.commands(), vec!["tail -n 50 /var/log/syslog"]);

    let h = harness_with_runner(RecordingRunner::new("", 0).with_programs(&["journalctl"]));
    h.server.get("/api/logs/system").await.assert_status_ok();
    assert_eq!(h.runner.commands(), vec!["journalctl -n 200 --no-pager"]);
}

#[tokio::test]
async fn test_docker_cli_logs_require_container() {
    let h = harness();
    h.server
        .get("/api/logs/docker")
        .await
        .assert_status_bad_request();
    assert_eq!(h.runner.call_count(), 0);
}

#[tokio::test]
async fn test_sessions_parse_who() {
    let h = harness_with_runner(RecordingRunner::new(
        "alice pts/0 2025-10-14 12:34 (10.0.0.2)\n",
        0,
    ));
    let json: Value = h.server.get("/api/users/sessions").await.json();
    assert_eq!(
        json["sessions"][0],
        json!({ "user": "alice", "tty": "pts/0", "date": "2025-10-14 12:34", "host": "10.0.0.2" })
    );
}

#[tokio::test]
async fn test_ssh_history_reads_only_the_log_tail() {
    let dir = tempfile::tempdir().unwrap();
    let auth_log = dir.path().join("auth.log");
    let mut content = String::from("Oct 13 sshd[1]: Accepted password for early\n");
    content.push_str(&"Oct 14 cron[2]: filler entry\n".repeat(200));
    content.push_str("Oct 15 sshd[3]: Accepted publickey for late\n");
    std::fs::write(&auth_log, content).unwrap();

    let mut config = test_config();
    config.commands.auth_log_path = auth_log.to_string_lossy().into_owned();
    config.commands.max_output_bytes = 256;
    let h = build(
        FakeProvider::new(sample_snapshot()),
        FakeRuntime::default(),
        RecordingRunner::new("", 0),
        config,
        false,
    );

    let json: Value = h
        .server
        .get("/api/users/ssh-history")
        .add_query_param("lines", 10)
        .await
        .json();
    assert_eq!(json["log"], "Oct 15 sshd[3]: Accepted publickey for late\n");
    assert_eq!(h.runner.call_count(), 0);
}

// --- self-update ---

#[tokio::test]
async fn test_update_requires_confirmation() {
    let h = harness();
    h.server
        .post("/api/update/perform")
        .await
        .assert_status_bad_request();
    h.server
        .post("/api/version/restart")
        .json(&json!({ "confirm": false }))
        .await
        .assert_status_bad_request();
    assert_eq!(h.runner.call_count(), 0);
}

#[tokio::test]
async fn test_update_disabled_is_403() {
    let mut config = test_config();
    config.update.allow_destructive = false;
    let h = build(
        FakeProvider::new(sample_snapshot()),
        FakeRuntime::default(),
        RecordingRunner::new("", 0),
        config,
        false,
    );
    h.server
        .post("/api/update/perform")
        .json(&json!({ "confirm": true }))
        .await
        .assert_status_forbidden();
    assert_eq!(h.runner.call_count(), 0);
}

#[tokio::test]
async fn test_update_runs_every_step() {
    let h = harness_with_runner(RecordingRunner::new("", 0));
    let response = h
        .server
        .post("/api/update/perform")
        .json(&json!({ "confirm": true }))
        .await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["success"], true);
    assert_eq!(
        h.runner.commands(),
        vec![
            "git -C . status --porcelain",
            "git -C . pull origin main",
            "docker compose --project-directory . down",
            "docker compose --project-directory . up -d --build",
        ]
    );
}

#[tokio::test]
async fn test_update_refuses_dirty_tree() {
    let h = harness_with_runner(RecordingRunner::new(" M src/main.rs\n", 0));
    let response = h
        .server
        .post("/api/update/perform")
        .json(&json!({ "confirm": true }))
        .await;
    response.assert_status_internal_server_error();
    let json: Value = response.json();
    assert_eq!(json["success"], false);
    assert_eq!(json["step"], "git status");
    assert_eq!(h.runner.call_count(), 1);
}

#[tokio::test]
async fn test_version_check_lists_pending_commits() {
    let h = harness_with_runner(RecordingRunner::new("abc123 fix\ndef456 feat\n", 0));
    let json: Value = h.server.get("/api/version/check").await.json();
    assert_eq!(json["hasUpdates"], true);
    assert_eq!(json["pendingCommits"], json!(["abc123 fix", "def456 feat"]));
    assert_eq!(
        h.runner.commands(),
        vec![
            "git -C . fetch origin",
            "git -C . log HEAD..origin/main --oneline",
        ]
    );
}

// --- widgets (no network: only paths that fail before any request) ---

#[tokio::test]
async fn test_github_widget_requires_username() {
    let h = harness();
    let response = h.server.get("/api/widgets/github").await;
    response.assert_status_bad_request();
    response.assert_json(&json!({ "error": "Username is required" }));
}

#[tokio::test]
async fn test_weather_widget_without_key() {
    let h = harness();
    let response = h.server.get("/api/widgets/weather").await;
    response.assert_status_internal_server_error();
    let json: Value = response.json();
    assert_eq!(json["error"], "Failed to get weather data");
    assert_eq!(json["details"], "OpenWeather API key not configured");
}

// --- WebSocket (requires http_transport + ws feature) ---
// Skip events pushed before the one under test.

async fn receive_event(ws: &mut axum_test::TestWebSocket, event: &str) -> Value {
    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(3);
    loop {
        let text = ws.receive_text().await;
        if let Ok(v) = serde_json::from_str::<Value>(&text)
            && v["event"] == event
        {
            return v;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {}",
            event
        );
    }
}

fn ws_harness() -> Harness {
    build(
        FakeProvider::new(sample_snapshot()),
        FakeRuntime {
            containers: vec![container("c1", ContainerState::Running)],
            log_chunks: vec!["hello\n".into()],
            follow: true,
            ..Default::default()
        },
        RecordingRunner::new("", 0),
        test_config(),
        true,
    )
}

#[tokio::test]
async fn test_ws_subscribe_system_receives_stats() {
    let h = ws_harness();
    let mut ws = h.server.get_websocket("/ws").await.into_websocket().await;
    ws.send_json(&json!({ "event": "subscribe:system" })).await;
    let v = receive_event(&mut ws, "system:stats").await;
    assert_eq!(v["data"]["cpu"]["cores"], 4);
    assert_eq!(v["data"]["os"]["distro"], "Test Linux");
}

#[tokio::test]
async fn test_ws_subscribe_docker_receives_containers_and_stats() {
    let h = ws_harness();
    let mut ws = h.server.get_websocket("/ws").await.into_websocket().await;
    ws.send_json(&json!({ "event": "subscribe:docker" })).await;
    let containers = receive_event(&mut ws, "docker:containers").await;
    assert_eq!(containers["data"][0]["id"], "c1");
    let stats = receive_event(&mut ws, "docker:stats").await;
    assert_eq!(stats["data"]["containerId"], "c1");
}

#[tokio::test]
async fn test_ws_log_stream_and_stop() {
    let h = ws_harness();
    let mut ws = h.server.get_websocket("/ws").await.into_websocket().await;
    ws.send_json(&json!({ "event": "stream:logs", "data": "c1" })).await;
    let chunk = receive_event(&mut ws, "docker:logs").await;
    assert_eq!(chunk["data"], json!({ "containerId": "c1", "data": "hello\n" }));

    ws.send_json(&json!({ "event": "stop:logs", "data": "c1" })).await;
    let stopped = receive_event(&mut ws, "docker:logs:stopped").await;
    assert_eq!(stopped["data"]["containerId"], "c1");
}

#[tokio::test]
async fn test_ws_bad_frame_gets_error_event() {
    let h = ws_harness();
    let mut ws = h.server.get_websocket("/ws").await.into_websocket().await;
    ws.send_text("not json").await;
    let v = receive_event(&mut ws, "error").await;
    assert!(v["data"]["message"].as_str().unwrap().starts_with("Invalid message"));
}
