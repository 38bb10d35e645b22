// WebSocket endpoint: one registry connection per socket

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};
use tracing::{debug, info};

use super::AppState;
use crate::models::{ClientEvent, ErrorMessage, ServerEvent};
use crate::telemetry::{ConnectionId, ConnectionRegistry};

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Tears the connection out of the registry on drop, however the socket loop ends.
struct ConnectionGuard {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.on_disconnect(self.id);
    }
}

pub(super) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let registry = state.registry.clone();
    let capacity = state.config.telemetry.queue_capacity;
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = serve_connection(socket, registry, capacity).await {
            info!(error = %e, "WebSocket connection error");
        }
    })
}

/// False when the peer is gone or too slow to take the frame.
async fn send(socket: &mut WebSocket, msg: Message) -> bool {
    matches!(timeout(WS_SEND_TIMEOUT, socket.send(msg)).await, Ok(Ok(())))
}

async fn serve_connection(
    mut socket: WebSocket,
    registry: Arc<ConnectionRegistry>,
    capacity: usize,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(capacity);
    let id = registry.on_connect(tx);
    let _guard = ConnectionGuard {
        registry: registry.clone(),
        id,
    };

    let mut ping_interval =
        tokio::time::interval_at(tokio::time::Instant::now() + WS_PING_INTERVAL, WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                let json = serde_json::to_string(&event)?;
                if !send(&mut socket, Message::Text(json.into())).await {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(text.as_str()) {
                            Ok(event) => registry.handle(id, event),
                            Err(e) => {
                                debug!(connection = %id, error = %e, "unparseable client frame");
                                registry.send(
                                    id,
                                    ServerEvent::Error(ErrorMessage::new(format!(
                                        "Invalid message: {}",
                                        e
                                    ))),
                                );
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        registry.send(
                            id,
                            ServerEvent::Error(ErrorMessage::new("Binary frames are not supported")),
                        );
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Pings are answered by the protocol layer.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(connection = %id, error = %e, "WebSocket receive failed");
                        break;
                    }
                }
            }
            _ = ping_interval.tick() => {
                if !send(&mut socket, Message::Ping(Bytes::new())).await {
                    break;
                }
            }
        }
    }
    Ok(())
}
