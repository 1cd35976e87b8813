//! End-to-end tests over a real WebSocket connection

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use diagram_sync::api::{create_router, AppState};
use diagram_sync::{ServerEvent, WsMessage};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve() -> (SocketAddr, Arc<AppState>) {
    let state = Arc::new(AppState::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(Arc::clone(&state));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr, query: &str) -> Client {
    let (client, _) = connect_async(format!("ws://{}/ws{}", addr, query))
        .await
        .unwrap();
    client
}

async fn send(client: &mut Client, value: Value) {
    client.send(Message::Text(value.to_string())).await.unwrap();
}

async fn next_message(client: &mut Client) -> WsMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a message")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn eventually(what: &str, check: impl Fn() -> bool) {
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("condition never held: {}", what);
}

fn members(msg: &WsMessage) -> Vec<String> {
    match &msg.event {
        ServerEvent::Snapshot { members, .. } | ServerEvent::PresenceUpdate { members } => {
            members.clone()
        }
        other => panic!("expected a roster, got {:?}", other),
    }
}

#[tokio::test]
async fn test_query_join_relays_between_members() {
    let (addr, state) = serve().await;

    let mut alice = connect(addr, "?room=r1&user=alice").await;
    let first = next_message(&mut alice).await;
    assert!(first.is_snapshot());
    assert_eq!(members(&first), vec!["alice"]);

    let mut bob = connect(addr, "?room=r1&user=bob").await;
    let first = next_message(&mut bob).await;
    assert!(first.is_snapshot());
    assert_eq!(members(&first), vec!["alice", "bob"]);

    assert_eq!(
        next_message(&mut alice).await.event,
        ServerEvent::MemberJoined { username: "bob".into() }
    );
    assert_eq!(members(&next_message(&mut alice).await), vec!["alice", "bob"]);

    send(
        &mut alice,
        json!({
            "type": "node_upsert",
            "node": {"id": "n1", "label": "Node 1", "position": {"x": 0.0, "y": 0.0}}
        }),
    )
    .await;

    let ack = next_message(&mut alice).await;
    assert_eq!(ack.event, ServerEvent::Ack);
    let relayed = next_message(&mut bob).await;
    assert!(matches!(relayed.event, ServerEvent::NodeUpsert { ref node } if node.id == "n1"));
    assert_eq!(relayed.sequence_id, ack.sequence_id);
    assert_eq!(state.sessions.session_count(), 2);
}

#[tokio::test]
async fn test_join_room_after_rejected_attempts() {
    let (addr, state) = serve().await;
    let mut client = connect(addr, "").await;

    send(&mut client, json!({"type": "ping"})).await;
    assert_eq!(next_message(&mut client).await.event, ServerEvent::Pong);

    // Not joined yet
    send(&mut client, json!({"type": "node_delete", "nodeId": "n1"})).await;
    assert!(matches!(
        next_message(&mut client).await.event,
        ServerEvent::ConnectionError { .. }
    ));

    // Missing username
    send(&mut client, json!({"type": "join_room", "roomId": "r1", "username": "  "})).await;
    assert!(matches!(
        next_message(&mut client).await.event,
        ServerEvent::ConnectionError { .. }
    ));

    client.send(Message::Text("not json".into())).await.unwrap();
    assert!(matches!(
        next_message(&mut client).await.event,
        ServerEvent::ConnectionError { .. }
    ));
    assert_eq!(state.sessions.session_count(), 0);

    send(&mut client, json!({"type": "join_room", "roomId": "r1", "username": "carol"})).await;
    let snapshot = next_message(&mut client).await;
    assert!(snapshot.is_snapshot());
    assert_eq!(members(&snapshot), vec!["carol"]);
    assert_eq!(state.sessions.session_count(), 1);
}

#[tokio::test]
async fn test_closing_socket_leaves_room() {
    let (addr, state) = serve().await;

    let mut alice = connect(addr, "?room=r1&user=alice").await;
    next_message(&mut alice).await;
    let mut bob = connect(addr, "?room=r1&user=bob").await;
    next_message(&mut bob).await;

    alice.close(None).await.unwrap();
    assert_eq!(
        next_message(&mut bob).await.event,
        ServerEvent::MemberLeft { username: "alice".into() }
    );
    assert_eq!(members(&next_message(&mut bob).await), vec!["bob"]);
    assert_eq!(state.sessions.session_count(), 1);

    bob.close(None).await.unwrap();
    eventually("room discarded", || {
        state.sessions.session_count() == 0 && !state.registry().room_exists("r1")
    })
    .await;
}
