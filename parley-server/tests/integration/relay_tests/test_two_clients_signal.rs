use parley_core::{ClientMessage, Envelope, RawPayload, RoomId, ServerMessage};

use crate::integration::{init_tracing, spawn_relay};
use crate::utils::{WsTestClient, connection_ids};

#[tokio::test]
async fn test_attach_sends_welcome_then_ice_config() {
    init_tracing();

    let addr = spawn_relay().await;
    let mut client = WsTestClient::connect(addr).await.expect("connect");

    match client.recv().await.expect("ice config") {
        ServerMessage::IceConfig { ice_servers } => assert!(!ice_servers.is_empty()),
        other => panic!("Expected ice-config, got {:?}", other),
    }
}

#[tokio::test]
async fn test_two_clients_join_and_relay_offer() {
    init_tracing();

    let addr = spawn_relay().await;
    let mut c1 = WsTestClient::connect(addr).await.expect("connect c1");
    let mut c2 = WsTestClient::connect(addr).await.expect("connect c2");
    assert_ne!(c1.connection_id, c2.connection_id);

    c1.join("R", "one").await.expect("c1 join");
    let (_, first) = c1.recv_members().await.expect("c1 first snapshot");
    assert_eq!(connection_ids(&first), vec![c1.connection_id.to_string()]);

    c2.join("R", "two").await.expect("c2 join");
    let expected = vec![c1.connection_id.to_string(), c2.connection_id.to_string()];
    let (room, seen_by_c1) = c1.recv_members().await.expect("c1 snapshot");
    let (_, seen_by_c2) = c2.recv_members().await.expect("c2 snapshot");
    assert_eq!(room, RoomId::from("R"));
    assert_eq!(connection_ids(&seen_by_c1), expected);
    assert_eq!(connection_ids(&seen_by_c2), expected);

    // The relay must not care what the payload looks like.
    let mut payload = RawPayload::new();
    payload.insert(
        "description".to_string(),
        serde_json::json!({"type": "offer", "sdp": "v=0 fake"}),
    );
    payload.insert("experimental".to_string(), serde_json::json!({"x": 1}));
    c2.send(&ClientMessage::Signal(Envelope {
        room_id: RoomId::from("R"),
        target: c1.connection_id.clone(),
        sender: c1.connection_id.clone(),
        payload: payload.clone(),
    }))
    .await
    .expect("send signal");

    let relayed = c1.recv_signal().await.expect("relayed signal");
    assert_eq!(relayed.sender, c2.connection_id);
    assert_eq!(relayed.target, c1.connection_id);
    assert_eq!(relayed.payload, payload);
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_alive() {
    init_tracing();

    let addr = spawn_relay().await;
    let mut client = WsTestClient::connect(addr).await.expect("connect");

    client
        .send_text("{\"op\":\"no-such-op\"}".to_string())
        .await
        .expect("send garbage");
    client
        .send_text("not json at all".to_string())
        .await
        .expect("send garbage");
    client.join("R", "one").await.expect("join");

    let (_, members) = client.recv_members().await.expect("snapshot");
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    init_tracing();

    let addr = spawn_relay().await;
    let mut stream = tokio::net::TcpStream::connect(addr).await.expect("connect");
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .expect("write request");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains(r#"{"status":"ok"}"#));
}
