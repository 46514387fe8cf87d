//! Real sockets against the axum router.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use cuproom_gateway::app_state::AppState;
use cuproom_gateway::config;
use cuproom_gateway::router::build_router;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CONFIG: &str = r#"
version: 1
gateway:
  listen: "127.0.0.1:0"
  pong_wait_ms: 5000
auth:
  tokens:
    - { token: "tx", user_id: "X", user_name: "Xavier" }
    - { token: "ty", user_id: "Y", user_name: "Yuki" }
"#;

async fn serve() -> (SocketAddr, AppState) {
    let state = AppState::new(config::load_from_str(CONFIG).unwrap()).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn dial(addr: SocketAddr, token: &str) -> Socket {
    let (ws, _resp) = connect_async(format!("ws://{addr}/v1/ws?token={token}"))
        .await
        .expect("upgrade");
    ws
}

async fn send(ws: &mut Socket, frame: &str) {
    ws.send(Message::Text(frame.to_string())).await.unwrap();
}

/// Next event frame, skipping control frames.
async fn next_event(ws: &mut Socket) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("socket ended")
            .expect("socket error");
        match msg {
            Message::Text(t) => return serde_json::from_str(&t).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn wait_for_room(state: &AppState, room: &str) {
    for _ in 0..100 {
        if state.hub().leader_of(room).await.unwrap().is_some() {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("room {room} never appeared");
}

#[tokio::test]
async fn create_join_mark_round_over_sockets() {
    let (addr, state) = serve().await;
    let mut x = dial(addr, "tx").await;
    let mut y = dial(addr, "ty").await;

    send(&mut x, r#"{"type":"create_event","payload":{"event_id":"e1"}}"#).await;
    wait_for_room(&state, "e1").await;

    send(&mut y, r#"{"type":"join_event","payload":{"event_id":"e1"}}"#).await;
    for ws in [&mut x, &mut y] {
        let v = next_event(ws).await;
        assert_eq!(v["type"], "new_join_event");
        assert_eq!(v["payload"]["user_id"], "Y");
        assert_eq!(v["payload"]["user_name"], "Yuki");
    }

    send(&mut x, r#"{"type":"mark_round","payload":{"event_id":"e1","time":"00:05:00"}}"#).await;
    for ws in [&mut x, &mut y] {
        let v = next_event(ws).await;
        assert_eq!(v["type"], "new_mark_round");
        assert_eq!(v["payload"]["event_id"], "e1");
        assert_eq!(v["payload"]["time"], "00:05:00");
    }
}

#[tokio::test]
async fn foreign_origin_is_forbidden() {
    let (addr, _state) = serve().await;
    let mut req = format!("ws://{addr}/v1/ws?token=tx")
        .into_client_request()
        .unwrap();
    req.headers_mut()
        .insert("Origin", HeaderValue::from_static("https://evil.example"));

    match connect_async(req).await {
        Err(WsError::Http(resp)) => assert_eq!(resp.status().as_u16(), 403),
        other => panic!("expected 403, got {:?}", other.map(|(_, r)| r.status())),
    }
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let (addr, _state) = serve().await;
    match connect_async(format!("ws://{addr}/v1/ws?token=nope")).await {
        Err(WsError::Http(resp)) => assert_eq!(resp.status().as_u16(), 401),
        other => panic!("expected 401, got {:?}", other.map(|(_, r)| r.status())),
    }
}

#[tokio::test]
async fn oversized_frame_ends_the_session() {
    let (addr, state) = serve().await;
    let mut x = dial(addr, "tx").await;

    let big = format!(
        r#"{{"type":"send_message","payload":{{"message":"{}","from":"X"}}}}"#,
        "a".repeat(1024)
    );
    let _ = x.send(Message::Text(big)).await;

    let ended = timeout(Duration::from_secs(2), async {
        loop {
            match x.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "server kept the oversized session open");

    for _ in 0..100 {
        if state.hub().counts().await.unwrap().0 == 0 {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("oversized session still registered");
}

#[tokio::test]
async fn probes_report_hub_state() {
    let (addr, state) = serve().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let status = http_get_status(&mut stream, "/readyz").await;
    assert_eq!(status, 200);

    state.hub().close();
    let mut stream = TcpStream::connect(addr).await.unwrap();
    assert_eq!(http_get_status(&mut stream, "/readyz").await, 503);
    let mut stream = TcpStream::connect(addr).await.unwrap();
    assert_eq!(http_get_status(&mut stream, "/healthz").await, 200);
}

async fn http_get_status(stream: &mut TcpStream, path: &str) -> u16 {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    let head = String::from_utf8_lossy(&buf);
    head.split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status line")
}
