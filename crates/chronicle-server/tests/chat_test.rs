mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

use common::spawn_app;

type WsClient = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn connect(addr: std::net::SocketAddr) -> WsClient {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/gateway"))
        .await
        .expect("gateway connect");
    ws
}

/// Next text frame, skipping transport-level ping/pong traffic.
async fn next_json(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("transport error");
        match msg {
            Message::Text(text) => return serde_json::from_str(&text).expect("json frame"),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn send_frame(ws: &mut WsClient, event: &str, data: Value) {
    let frame = json!({"event": event, "data": data}).to_string();
    ws.send(Message::Text(frame.into())).await.expect("send");
}

#[tokio::test]
async fn chat_fans_out_to_all_and_typing_to_all_but_sender() {
    let addr = spawn_app().await;

    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    // let both registrations land before broadcasting
    tokio::time::sleep(Duration::from_millis(200)).await;

    // chat reaches everyone, the sender included
    send_frame(&mut a, "chat", json!({"msg": "hi"})).await;
    let expected = json!({"event": "chat", "data": {"msg": "hi"}});
    assert_eq!(next_json(&mut a).await, expected);
    assert_eq!(next_json(&mut b).await, expected);

    // typing reaches everyone but the sender
    send_frame(&mut a, "typing", json!({"user": "A"})).await;
    assert_eq!(
        next_json(&mut b).await,
        json!({"event": "typing", "data": {"user": "A"}})
    );

    // A's next delivery is the follow-up chat, proving A never saw the
    // typing frame and frames from one connection arrive in send order
    send_frame(&mut a, "chat", json!({"msg": "still here"})).await;
    let follow_up = json!({"event": "chat", "data": {"msg": "still here"}});
    assert_eq!(next_json(&mut a).await, follow_up);
    assert_eq!(next_json(&mut b).await, follow_up);
}

#[tokio::test]
async fn malformed_frames_are_dropped_without_killing_the_connection() {
    let addr = spawn_app().await;

    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    a.send(Message::Text("not json".into())).await.unwrap();
    a.send(Message::Text(r#"{"event":"join","data":1}"#.into()))
        .await
        .unwrap();

    // the connection still works afterwards
    send_frame(&mut a, "chat", json!({"msg": "alive"})).await;
    let expected = json!({"event": "chat", "data": {"msg": "alive"}});
    assert_eq!(next_json(&mut a).await, expected);
    assert_eq!(next_json(&mut b).await, expected);
}

#[tokio::test]
async fn disconnected_participant_misses_frames() {
    let addr = spawn_app().await;

    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    b.close(None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    // no history, no replay: only connected participants hear anything
    send_frame(&mut a, "chat", json!({"msg": "to the void"})).await;
    assert_eq!(
        next_json(&mut a).await,
        json!({"event": "chat", "data": {"msg": "to the void"}})
    );
}
