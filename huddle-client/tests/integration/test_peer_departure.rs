use std::sync::Arc;

use huddle_client::{PeerState, Role, SessionEvent};

use crate::utils::{FakeTransportFactory, TestHub, TestSession, init_tracing};

#[tokio::test]
async fn test_leave_closes_remote_negotiation() {
    init_tracing();

    let hub = TestHub::start(2).await.unwrap();
    let factory = Arc::new(FakeTransportFactory::default());

    let mut a = TestSession::connect(&hub.ws_url(), factory.clone()).await.unwrap();
    let mut b = TestSession::connect(&hub.ws_url(), factory.clone()).await.unwrap();

    a.join("room42").await.unwrap();
    let (_, peers) = b.join("room42").await.unwrap();
    let a_id = peers[0];
    b.wait_for_state(a_id, PeerState::Connected).await.unwrap();

    let b_id = a
        .wait_for(|event| match event {
            SessionEvent::PeerJoined(id) => Some(*id),
            _ => None,
        })
        .await
        .unwrap();

    b.handle.leave().await.unwrap();
    b.wait_for_state(a_id, PeerState::Closed).await.unwrap();

    a.wait_for(|event| match event {
        SessionEvent::PeerLeft(id) if *id == b_id => Some(()),
        _ => None,
    })
    .await
    .unwrap();
    assert!(a.handle.peer_states().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_host_slot_passes_to_next_joiner() {
    init_tracing();

    let hub = TestHub::start(2).await.unwrap();
    let factory = Arc::new(FakeTransportFactory::default());

    let mut a = TestSession::connect(&hub.ws_url(), factory.clone()).await.unwrap();
    let mut b = TestSession::connect(&hub.ws_url(), factory.clone()).await.unwrap();

    assert_eq!(a.join("room42").await.unwrap().0, Role::Host);
    assert_eq!(b.join("room42").await.unwrap().0, Role::Joiner);

    // the host disconnects entirely
    a.handle.shutdown().await;
    b.wait_for(|event| matches!(event, SessionEvent::PeerLeft(_)).then_some(()))
        .await
        .unwrap();

    let mut c = TestSession::connect(&hub.ws_url(), factory.clone()).await.unwrap();
    let (role, peers) = c.join("room42").await.unwrap();
    assert_eq!(role, Role::Host);
    assert_eq!(peers.len(), 1);

    // the new host opens negotiation with the remaining joiner
    c.wait_for_state(peers[0], PeerState::Connected).await.unwrap();
}
