use parley_core::{NegotiationPayload, RoomId, ServerMessage, SessionDescription};

use crate::integration::init_tracing;
use crate::utils::{MockMedia, VoiceHarness, drain, participants};

fn offer() -> NegotiationPayload {
    NegotiationPayload::description(SessionDescription::offer("v=0 stray"))
}

#[tokio::test]
async fn test_stray_signals_are_dropped() {
    init_tracing();

    let mut harness = VoiceHarness::spawn(MockMedia::new());
    harness.welcome("m").await.unwrap();
    harness.voice.join("R", "u-m", "M").await.unwrap();
    harness.members("R", &["m"]).await.unwrap();
    drain(&mut harness.outbound);

    // Not a member of the last snapshot.
    harness.signal("R", "x", "m", offer()).unwrap();
    // Meant for someone else.
    harness.signal("R", "a", "someone-else", offer()).unwrap();
    // Wrong room.
    harness.signal("other", "a", "m", offer()).unwrap();
    // Snapshot of a room we are not in.
    harness
        .relay
        .send(ServerMessage::Members {
            room_id: RoomId::from("other"),
            participants: participants(&["m", "x"]),
        })
        .unwrap();

    // The relay channel is ordered, so once this snapshot is seen the rest was handled.
    harness.members("R", &["m"]).await.unwrap();
    assert!(harness.voice.peers().await.unwrap().is_empty());
    assert!(drain(&mut harness.outbound).is_empty());
    assert!(harness.media.log().sessions_created.is_empty());
}

#[tokio::test]
async fn test_member_without_session_gets_a_responder() {
    init_tracing();

    let media = MockMedia::new();
    media.fail_sessions(true);
    let mut harness = VoiceHarness::spawn(media);
    harness.welcome("m").await.unwrap();
    harness.voice.join("R", "u-m", "M").await.unwrap();

    // Session creation fails, so z is a member without a session.
    harness.members("R", &["m", "z"]).await.unwrap();
    assert!(harness.voice.peers().await.unwrap().is_empty());

    harness.media.fail_sessions(false);
    harness.signal("R", "z", "m", offer()).unwrap();

    let answer = harness.next_signal().await.unwrap();
    assert_eq!(answer.target.as_str(), "z");
    assert_eq!(harness.voice.peers().await.unwrap().len(), 1);
}
