use huddle_core::SignalMessage;

use crate::utils::{TestClient, TestHub, TestHubConfig, answer_to, candidate_to, init_tracing, offer_to};

#[tokio::test]
async fn test_offer_answer_round_trip() {
    init_tracing();

    let hub = TestHub::start(TestHubConfig::default()).await.unwrap();

    let mut a = TestClient::connect(&hub.ws_url()).await.unwrap();
    let mut b = TestClient::connect(&hub.ws_url()).await.unwrap();

    let a_id = a.join("room42").await.unwrap().client_id;
    let b_id = b.join("room42").await.unwrap().client_id;
    assert_eq!(a.recv().await.unwrap(), SignalMessage::PeerJoined { peer_id: b_id });

    // host offers
    a.send(&offer_to(b_id)).await.unwrap();
    let offer = b.recv().await.unwrap();
    assert_eq!(offer, offer_to(b_id).with_sender(a_id));

    // joiner answers
    b.send(&answer_to(a_id)).await.unwrap();
    let answer = a.recv().await.unwrap();
    assert_eq!(answer, answer_to(a_id).with_sender(b_id));

    // candidates flow both ways
    a.send(&candidate_to(b_id)).await.unwrap();
    b.send(&candidate_to(a_id)).await.unwrap();
    assert_eq!(b.recv().await.unwrap(), candidate_to(b_id).with_sender(a_id));
    assert_eq!(a.recv().await.unwrap(), candidate_to(a_id).with_sender(b_id));
}

#[tokio::test]
async fn test_forged_sender_is_overwritten() {
    init_tracing();

    let hub = TestHub::start(TestHubConfig::default()).await.unwrap();

    let mut a = TestClient::connect(&hub.ws_url()).await.unwrap();
    let mut b = TestClient::connect(&hub.ws_url()).await.unwrap();

    let a_id = a.join("room42").await.unwrap().client_id;
    let b_id = b.join("room42").await.unwrap().client_id;

    let forged = serde_json::json!({
        "type": "offer",
        "target": b_id,
        "sender": b_id,
        "sdp": {"type": "offer", "sdp": "v=0\r\n"}
    });
    a.send_raw(&forged.to_string()).await.unwrap();

    match b.recv().await.unwrap() {
        SignalMessage::Offer { sender, .. } => assert_eq!(sender, Some(a_id)),
        other => panic!("Expected offer, got {:?}", other),
    }
}
