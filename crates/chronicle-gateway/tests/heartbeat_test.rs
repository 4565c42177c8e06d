use std::net::SocketAddr;
use std::time::Duration;

use axum::{Router, extract::WebSocketUpgrade, routing::get};
use futures_util::StreamExt;

use chronicle_gateway::{ChatHub, connection};

const FAST_HEARTBEAT: Duration = Duration::from_millis(100);

/// Gateway-only server with a fast heartbeat so timeout behavior is
/// observable within a test run.
async fn spawn_gateway(hub: ChatHub) -> SocketAddr {
    let handler_hub = hub.clone();
    let app = Router::new().route(
        "/gateway",
        get(move |ws: WebSocketUpgrade| {
            let hub = handler_hub.clone();
            async move {
                ws.on_upgrade(move |socket| {
                    connection::handle_connection_with_heartbeat(socket, hub, FAST_HEARTBEAT)
                })
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

async fn wait_for_count(hub: &ChatHub, expected: usize) -> bool {
    for _ in 0..50 {
        if hub.connection_count().await == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn silent_client_is_dropped_after_two_missed_pongs() {
    let hub = ChatHub::new();
    let addr = spawn_gateway(hub.clone()).await;

    // never poll the socket: pings are never answered
    let (_ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/gateway"))
        .await
        .expect("gateway connect");
    assert!(wait_for_count(&hub, 1).await, "connection never registered");

    assert!(
        wait_for_count(&hub, 0).await,
        "silent connection was not dropped"
    );
}

#[tokio::test]
async fn responsive_client_outlives_many_heartbeats() {
    let hub = ChatHub::new();
    let addr = spawn_gateway(hub.clone()).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/gateway"))
        .await
        .expect("gateway connect");
    assert!(wait_for_count(&hub, 1).await, "connection never registered");

    // keep polling the stream; the transport answers pings as they arrive
    let reader = tokio::spawn(async move { while let Some(Ok(_)) = ws.next().await {} });

    // six intervals is well past the two-missed-pongs cutoff
    tokio::time::sleep(FAST_HEARTBEAT * 6).await;
    assert_eq!(hub.connection_count().await, 1);

    reader.abort();
}
