use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use huddle_client::{
    ChannelObserver, MediaTransportFactory, PeerState, SessionCoordinator, SessionEvent,
    SessionHandle, WsSignalingClient,
};
use huddle_core::ParticipantId;
use huddle_server::{AppState, SignalingService, router};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Level;

/// Timeout for a single expected session event (ms).
pub const EVENT_TIMEOUT_MS: u64 = 5000;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A signaling hub on an ephemeral local port.
pub struct TestHub {
    pub addr: SocketAddr,
    pub signaling: SignalingService,
    server: JoinHandle<()>,
}

impl TestHub {
    pub async fn start(max_room_size: usize) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = AppState {
            signaling: SignalingService::new(max_room_size),
            idle_timeout: None,
        };
        let signaling = state.signaling.clone();

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router(state)).await {
                tracing::error!("[TestHub] Server stopped: {}", e);
            }
        });

        Ok(Self {
            addr,
            signaling,
            server,
        })
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

impl Drop for TestHub {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A session connected to a hub, with its observer events.
pub struct TestSession {
    pub handle: SessionHandle,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl TestSession {
    pub async fn connect(url: &str, factory: Arc<dyn MediaTransportFactory>) -> Result<Self> {
        let (signaling, inbound) = WsSignalingClient::connect(url)
            .await
            .context("Failed to reach hub")?;
        let (observer, events) = ChannelObserver::new();

        let handle =
            SessionCoordinator::new(Arc::new(signaling), factory, Arc::new(observer)).spawn(inbound);

        Ok(Self { handle, events })
    }

    pub async fn next_event(&mut self) -> Result<SessionEvent> {
        tokio::time::timeout(Duration::from_millis(EVENT_TIMEOUT_MS), self.events.recv())
            .await
            .context("Timed out waiting for a session event")?
            .context("Observer channel closed")
    }

    /// Skips events until `pick` returns a value.
    pub async fn wait_for<T>(&mut self, mut pick: impl FnMut(&SessionEvent) -> Option<T>) -> Result<T> {
        loop {
            let event = self.next_event().await?;
            if let Some(found) = pick(&event) {
                return Ok(found);
            }
        }
    }

    pub async fn wait_for_state(&mut self, peer: ParticipantId, state: PeerState) -> Result<()> {
        self.wait_for(|event| match event {
            SessionEvent::PeerState { peer: p, state: s } if *p == peer && *s == state => Some(()),
            _ => None,
        })
        .await
    }

    /// Joins `room` and returns the local role and roster from room-joined.
    pub async fn join(&mut self, room: &str) -> Result<(huddle_client::Role, Vec<ParticipantId>)> {
        self.handle.join(room).await?;
        self.wait_for(|event| match event {
            SessionEvent::RoomJoined { role, peers, .. } => Some((*role, peers.clone())),
            _ => None,
        })
        .await
    }
}
