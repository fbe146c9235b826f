use std::sync::Arc;

use huddle_client::{AudioTransportFactory, PeerState, SessionEvent};

use crate::utils::{TestHub, TestSession, init_tracing};

#[tokio::test]
async fn test_audio_negotiation_over_hub() {
    init_tracing();

    let hub = TestHub::start(2).await.unwrap();
    // host candidates only, no STUN needed on loopback
    let factory = Arc::new(AudioTransportFactory::new(vec![]));

    let mut a = TestSession::connect(&hub.ws_url(), factory.clone()).await.unwrap();
    let mut b = TestSession::connect(&hub.ws_url(), factory.clone()).await.unwrap();

    a.join("audio").await.unwrap();
    let (_, peers) = b.join("audio").await.unwrap();
    let a_id = peers[0];

    let b_id = a
        .wait_for(|event| match event {
            SessionEvent::PeerJoined(id) => Some(*id),
            _ => None,
        })
        .await
        .unwrap();

    a.wait_for_state(b_id, PeerState::Connected).await.unwrap();
    b.wait_for_state(a_id, PeerState::Connected).await.unwrap();

    a.handle.leave().await.unwrap();
    a.handle.shutdown().await;
    b.handle.shutdown().await;
}
