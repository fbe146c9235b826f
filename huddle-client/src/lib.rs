mod config;
mod error;
pub mod negotiation;
pub mod session;
pub mod signaling;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use config::ClientConfig;
pub use error::{ClientError, NegotiationError};
pub use negotiation::{PeerState, Role};
pub use session::{
    ChannelObserver, SessionCoordinator, SessionEvent, SessionHandle, SessionObserver,
};
pub use signaling::{SignalingOutput, WsSignalingClient};
pub use transport::{
    AudioTransport, AudioTransportFactory, MediaTransport, MediaTransportFactory, TransportEvent,
    TransportState,
};

use std::sync::Arc;

/// Connects to the hub at `config.url` and starts a session that negotiates
/// webrtc audio with every room peer.
pub async fn connect(
    config: ClientConfig,
    observer: Arc<dyn SessionObserver>,
) -> Result<SessionHandle, ClientError> {
    let (signaling, inbound) = WsSignalingClient::connect(&config.url).await?;
    let factory = AudioTransportFactory::new(config.ice_servers);

    Ok(SessionCoordinator::new(Arc::new(signaling), Arc::new(factory), observer).spawn(inbound))
}
