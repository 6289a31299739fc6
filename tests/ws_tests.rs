//! WebSocket chat scenario tests against a running server.

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};

mod common;
use common::test_app;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (SocketAddr, chathub::AppState, tempfile::TempDir) {
    let (app, state, dir) = test_app().await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state, dir)
}

async fn connect(addr: SocketAddr, username: &str) -> WsClient {
    let (stream, _) = connect_async(format!("ws://{addr}/ws?username={username}"))
        .await
        .expect("websocket connect failed");
    stream
}

/// Next text frame parsed as JSON; skips control frames.
async fn next_json(client: &mut WsClient) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if let WsMessage::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn wait_for_client_count(state: &chathub::AppState, expected: usize) {
    for _ in 0..100 {
        if state.hub.client_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!(
        "client count never reached {expected}, still {}",
        state.hub.client_count()
    );
}

/// The full connect / chat / disconnect flow between two clients.
#[tokio::test]
async fn test_chat_scenario() {
    let (addr, state, _dir) = spawn_server().await;

    // Alice connects: a private welcome, then her own join notice.
    let mut alice = connect(addr, "alice").await;
    let welcome = next_json(&mut alice).await;
    assert_eq!(welcome["username"], "System");
    assert_eq!(welcome["content"], "Welcome, alice! You are now connected.");
    assert!(welcome["id"].is_string());

    let join = next_json(&mut alice).await;
    assert_eq!(join["username"], "System");
    assert_eq!(join["content"], "alice has joined the chat");

    // Bob connects: both sides hear about it.
    let mut bob = connect(addr, "bob").await;
    let bob_welcome = next_json(&mut bob).await;
    assert_eq!(bob_welcome["content"], "Welcome, bob! You are now connected.");
    assert_eq!(next_json(&mut bob).await["content"], "bob has joined the chat");
    assert_eq!(
        next_json(&mut alice).await["content"],
        "bob has joined the chat"
    );

    // Alice speaks; server-side stamping overrides anything she claims.
    alice
        .send(WsMessage::Text(
            r#"{"content":"hi","id":"spoofed","username":"admin"}"#.into(),
        ))
        .await
        .unwrap();

    let to_alice = next_json(&mut alice).await;
    let to_bob = next_json(&mut bob).await;
    assert_eq!(to_alice["username"], "alice");
    assert_eq!(to_alice["content"], "hi");
    assert_ne!(to_alice["id"], "spoofed");
    // Same stamped message on both delivery paths.
    assert_eq!(to_alice["id"], to_bob["id"]);
    assert_eq!(to_bob["username"], "alice");

    // Bob leaves; alice is told and bob drops out of the registry.
    bob.close(None).await.unwrap();
    assert_eq!(
        next_json(&mut alice).await["content"],
        "bob has left the chat"
    );
    wait_for_client_count(&state, 1).await;

    // The room still works for alice.
    alice
        .send(WsMessage::Text(r#"{"content":"still here"}"#.into()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut alice).await["content"], "still here");
}

/// Connecting without a username yields a generated pseudonymous one.
#[tokio::test]
async fn test_anonymous_fallback_name() {
    let (addr, _state, _dir) = spawn_server().await;

    let (mut client, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("websocket connect failed");

    let welcome = next_json(&mut client).await;
    let content = welcome["content"].as_str().unwrap();
    assert!(content.starts_with("Welcome, anonymous-"));
}

/// A malformed payload terminates the offending session only.
#[tokio::test]
async fn test_malformed_payload_terminates_session() {
    let (addr, state, _dir) = spawn_server().await;

    let mut alice = connect(addr, "alice").await;
    next_json(&mut alice).await; // welcome
    next_json(&mut alice).await; // join

    let mut mallory = connect(addr, "mallory").await;
    next_json(&mut mallory).await; // welcome
    next_json(&mut mallory).await; // join
    assert_eq!(
        next_json(&mut alice).await["content"],
        "mallory has joined the chat"
    );

    mallory
        .send(WsMessage::Text("this is not json".into()))
        .await
        .unwrap();

    // Exactly one leave notice, and alice's session is untouched.
    assert_eq!(
        next_json(&mut alice).await["content"],
        "mallory has left the chat"
    );
    wait_for_client_count(&state, 1).await;

    alice
        .send(WsMessage::Text(r#"{"content":"unaffected"}"#.into()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut alice).await["content"], "unaffected");
}

/// Messages published while N clients are connected reach all N.
#[tokio::test]
async fn test_fan_out_to_many_clients() {
    let (addr, _state, _dir) = spawn_server().await;

    let mut clients = Vec::new();
    for i in 0..5 {
        let mut client = connect(addr, &format!("user-{i}")).await;
        next_json(&mut client).await; // welcome
        // Reading our own join notice ensures it was fanned out before the
        // next client registers.
        assert_eq!(
            next_json(&mut client).await["content"],
            format!("user-{i} has joined the chat")
        );
        clients.push(client);
    }

    // Each client then sees every later join, in order.
    for (i, client) in clients.iter_mut().enumerate() {
        for j in i + 1..5 {
            assert_eq!(
                next_json(client).await["content"],
                format!("user-{j} has joined the chat")
            );
        }
    }

    clients[0]
        .send(WsMessage::Text(r#"{"content":"hello all"}"#.into()))
        .await
        .unwrap();

    for client in clients.iter_mut() {
        let msg = next_json(client).await;
        assert_eq!(msg["username"], "user-0");
        assert_eq!(msg["content"], "hello all");
    }
}
