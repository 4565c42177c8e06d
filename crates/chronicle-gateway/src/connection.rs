use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use chronicle_types::frames::{ChatEvent, ChatFrame};

use crate::hub::ChatHub;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Handle a single chat WebSocket connection. No credential check happens
/// here — the channel is open to any client that completes the upgrade.
pub async fn handle_connection(socket: WebSocket, hub: ChatHub) {
    handle_connection_with_heartbeat(socket, hub, HEARTBEAT_INTERVAL).await
}

/// Same as [`handle_connection`] with the heartbeat interval exposed, so
/// tests can exercise the timeout path without waiting out 15s ticks.
pub async fn handle_connection_with_heartbeat(
    socket: WebSocket,
    hub: ChatHub,
    heartbeat_interval: Duration,
) {
    let (mut sender, mut receiver) = socket.split();

    let (conn_id, mut hub_rx) = hub.register().await;
    info!("chat connection {} joined", conn_id);

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward hub frames to this client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(heartbeat_interval);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = hub_rx.recv() => {
                    let text = match result {
                        Some(text) => text,
                        None => break,
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read frames from the client, in arrival order
    let recv_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let frame: ChatFrame = match serde_json::from_str(&text) {
                        Ok(frame) => frame,
                        Err(err) => {
                            warn!("unparseable chat frame dropped: {}", err);
                            continue;
                        }
                    };
                    match frame.event {
                        ChatEvent::Chat => recv_hub.broadcast_all(&frame).await,
                        ChatEvent::Typing => recv_hub.broadcast_except(conn_id, &frame).await,
                    }
                }
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                // Binary and Ping frames carry nothing for the chat channel
                _ => {}
            }
        }
    });

    // Whichever half finishes first tears down the other
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.unregister(conn_id).await;
    debug!("chat connection {} left", conn_id);
}
