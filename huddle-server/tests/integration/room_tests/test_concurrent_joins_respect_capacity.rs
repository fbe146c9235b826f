use futures::future::join_all;
use huddle_core::RoomId;

use crate::utils::{TestClient, TestHub, TestHubConfig, init_tracing};

#[tokio::test]
async fn test_concurrent_joins_respect_capacity() {
    init_tracing();

    let hub = TestHub::start(TestHubConfig {
        max_room_size: 3,
        ..Default::default()
    })
    .await
    .unwrap();

    let mut clients = Vec::new();
    for _ in 0..8 {
        clients.push(TestClient::connect(&hub.ws_url()).await.unwrap());
    }

    let results = join_all(clients.iter_mut().map(|c| c.join("busy"))).await;
    let admitted: Vec<_> = results.into_iter().filter_map(Result::ok).collect();

    assert_eq!(admitted.len(), 3);
    assert_eq!(admitted.iter().filter(|j| j.host).count(), 1);

    let room = RoomId::parse("busy").unwrap();
    assert_eq!(hub.signaling.room_members(&room).map(|m| m.len()), Some(3));
}
