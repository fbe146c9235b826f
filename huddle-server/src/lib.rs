mod config;
mod error;
mod room;
mod signaling;

pub use config::ServerConfig;
pub use error::HubError;
pub use room::*;
pub use signaling::*;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub signaling: SignalingService,
    pub idle_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            signaling: SignalingService::new(config.max_room_size),
            idle_timeout: config.idle_timeout(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/test", get(liveness))
        .with_state(state)
}

async fn liveness() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Runs the hub on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::new(&config);
    let heartbeat = spawn_heartbeat(state.signaling.clone(), config.heartbeat_interval());

    info!(
        "Signaling hub listening on http://{} (max room size {})",
        listener.local_addr()?,
        config.max_room_size
    );

    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    heartbeat.abort();
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    } else {
        std::future::pending::<()>().await;
    }
}
