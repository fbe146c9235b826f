use std::sync::Arc;

use clap::Parser;
use huddle_client::{ClientConfig, NegotiationError, PeerState, Role, SessionObserver};
use huddle_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use huddle_core::{ErrorPayload, ParticipantId, RoomId};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "huddle-client", version, about = "Join a huddle room and negotiate audio with its peers")]
struct Args {
    /// Room to join.
    room: String,

    #[arg(long, env = "HUDDLE_URL", default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// STUN/TURN urls, comma separated.
    #[arg(
        long = "ice-server",
        env = "HUDDLE_ICE_SERVERS",
        value_delimiter = ',',
        default_values_t = [DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()]
    )]
    ice_servers: Vec<String>,
}

struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_room_joined(&self, room: &RoomId, role: Role, peers: &[ParticipantId]) {
        info!("In room {} as {}, {} peer(s) present", room, role, peers.len());
    }

    fn on_peer_state(&self, peer: ParticipantId, state: PeerState) {
        info!("{} is {}", peer, state);
    }

    fn on_peer_failed(&self, peer: ParticipantId, error: &NegotiationError) {
        error!("Audio with {} failed: {}", peer, error);
    }

    fn on_peer_left(&self, peer: ParticipantId) {
        info!("{} left", peer);
    }

    fn on_hub_error(&self, error: &ErrorPayload) {
        warn!("Hub refused: {} ({})", error.kind, error.message);
    }

    fn on_disconnected(&self) {
        warn!("Lost the hub connection");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = ClientConfig::new(args.url).with_ice_servers(args.ice_servers);

    let session = huddle_client::connect(config, Arc::new(LogObserver)).await?;
    session.join(&args.room).await?;

    tokio::signal::ctrl_c().await?;
    info!("Leaving {}", args.room);

    if let Err(e) = session.leave().await {
        warn!("Leave failed: {}", e);
    }
    session.shutdown().await;
    Ok(())
}
