use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::Level;

use huddle_server::{AppState, SignalingService, router, spawn_heartbeat};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Settings for a hub started by a test.
#[derive(Clone)]
pub struct TestHubConfig {
    pub max_room_size: usize,
    pub heartbeat_interval: Option<Duration>,
    pub idle_timeout: Option<Duration>,
}

impl Default for TestHubConfig {
    fn default() -> Self {
        Self {
            max_room_size: 2,
            heartbeat_interval: None,
            idle_timeout: None,
        }
    }
}

/// A hub listening on an ephemeral local port.
pub struct TestHub {
    pub addr: SocketAddr,
    pub signaling: SignalingService,
    server: JoinHandle<()>,
    heartbeat: Option<JoinHandle<()>>,
}

impl TestHub {
    pub async fn start(config: TestHubConfig) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = AppState {
            signaling: SignalingService::new(config.max_room_size),
            idle_timeout: config.idle_timeout,
        };
        let signaling = state.signaling.clone();

        let heartbeat = config
            .heartbeat_interval
            .map(|period| spawn_heartbeat(signaling.clone(), period));

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router(state)).await {
                tracing::error!("[TestHub] Server stopped: {}", e);
            }
        });

        Ok(Self {
            addr,
            signaling,
            server,
            heartbeat,
        })
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

impl Drop for TestHub {
    fn drop(&mut self) {
        self.server.abort();
        if let Some(heartbeat) = &self.heartbeat {
            heartbeat.abort();
        }
    }
}

/// Polls `check` until it holds or `timeout_ms` elapses.
pub async fn wait_until(timeout_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
