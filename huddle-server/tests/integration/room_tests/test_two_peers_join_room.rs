use huddle_core::{RoomId, SignalMessage};

use crate::utils::{TestClient, TestHub, TestHubConfig, init_tracing};

#[tokio::test]
async fn test_two_peers_join_room() {
    init_tracing();

    let hub = TestHub::start(TestHubConfig::default())
        .await
        .expect("Failed to start hub");

    let mut a = TestClient::connect(&hub.ws_url()).await.unwrap();
    let joined_a = a.join("room42").await.expect("A failed to join");
    assert_eq!(joined_a.room_id, "room42");
    assert!(joined_a.peers.is_empty());
    assert!(joined_a.host, "creator of the room is the host");

    let mut b = TestClient::connect(&hub.ws_url()).await.unwrap();
    let joined_b = b.join("room42").await.expect("B failed to join");
    assert_eq!(joined_b.peers, vec![joined_a.client_id]);
    assert!(!joined_b.host);

    // A learns about B
    assert_eq!(
        a.recv().await.unwrap(),
        SignalMessage::PeerJoined {
            peer_id: joined_b.client_id
        }
    );

    let room = RoomId::parse("room42").unwrap();
    assert_eq!(
        hub.signaling.room_members(&room),
        Some(vec![joined_a.client_id, joined_b.client_id])
    );
}

#[tokio::test]
async fn test_invalid_room_id_is_rejected() {
    init_tracing();

    let hub = TestHub::start(TestHubConfig::default()).await.unwrap();
    let mut a = TestClient::connect(&hub.ws_url()).await.unwrap();

    a.send_raw(r#"{"type":"join-room","roomId":""}"#).await.unwrap();
    a.expect_error(huddle_core::ErrorKind::InvalidRoom)
        .await
        .unwrap();

    a.send_raw(r#"{"type":"join-room","roomId":42}"#).await.unwrap();
    a.expect_error(huddle_core::ErrorKind::InvalidRoom)
        .await
        .unwrap();

    assert_eq!(hub.signaling.room_count(), 0);
}

#[tokio::test]
async fn test_second_room_is_refused() {
    init_tracing();

    let hub = TestHub::start(TestHubConfig::default()).await.unwrap();
    let mut a = TestClient::connect(&hub.ws_url()).await.unwrap();

    a.join("first").await.unwrap();
    a.send(&SignalMessage::JoinRoom {
        room_id: "second".to_owned(),
    })
    .await
    .unwrap();
    a.expect_error(huddle_core::ErrorKind::JoinError).await.unwrap();

    assert_eq!(hub.signaling.room_count(), 1);
}
