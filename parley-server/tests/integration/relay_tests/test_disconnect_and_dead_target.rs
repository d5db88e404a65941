use parley_core::{ClientMessage, Envelope, RawPayload, RoomId, ServerMessage};

use crate::integration::{init_tracing, spawn_relay};
use crate::utils::{WsTestClient, connection_ids};

#[tokio::test]
async fn test_disconnect_republishes_and_dead_target_is_dropped() {
    init_tracing();

    let addr = spawn_relay().await;
    let mut c1 = WsTestClient::connect(addr).await.expect("connect c1");
    let mut c2 = WsTestClient::connect(addr).await.expect("connect c2");
    let mut c3 = WsTestClient::connect(addr).await.expect("connect c3");

    c1.join("R", "one").await.expect("c1 join");
    c1.recv_members().await.expect("c1 snapshot");
    c2.join("R", "two").await.expect("c2 join");
    c1.recv_members().await.expect("c1 snapshot");
    c3.join("R", "three").await.expect("c3 join");
    c1.recv_members().await.expect("c1 snapshot");
    c3.recv_members().await.expect("c3 snapshot");

    let c2_id = c2.connection_id.clone();
    c2.close().await.expect("close c2");

    let expected = vec![c1.connection_id.to_string(), c3.connection_id.to_string()];
    let (_, seen_by_c1) = c1.recv_members().await.expect("c1 snapshot after leave");
    let (_, seen_by_c3) = c3.recv_members().await.expect("c3 snapshot after leave");
    assert_eq!(connection_ids(&seen_by_c1), expected);
    assert_eq!(connection_ids(&seen_by_c3), expected);

    // Address the departed connection: the relay drops it quietly.
    let mut payload = RawPayload::new();
    payload.insert(
        "candidate".to_string(),
        serde_json::json!({"candidate": "candidate:1 1 udp 1 10.0.0.1 9 typ host"}),
    );
    c1.send(&ClientMessage::Signal(Envelope {
        room_id: RoomId::from("R"),
        target: c2_id,
        sender: c1.connection_id.clone(),
        payload,
    }))
    .await
    .expect("send to departed peer");

    // c1 is still served normally afterwards, and nothing else was queued for it.
    c1.send(&ClientMessage::LeaveRoom {
        room_id: RoomId::from("R"),
    })
    .await
    .expect("leave");
    let (_, seen_by_c3) = c3.recv_members().await.expect("c3 snapshot after c1 leaves");
    assert_eq!(
        connection_ids(&seen_by_c3),
        vec![c3.connection_id.to_string()]
    );

    c1.join("R", "one").await.expect("rejoin");
    match c1.recv().await.expect("frame after rejoin") {
        ServerMessage::Members { participants, .. } => assert_eq!(participants.len(), 2),
        other => panic!("Expected members, got {:?}", other),
    }
}
