use huddle_core::RoomId;
use thiserror::Error;

/// Failure of a single peer negotiation. It moves that peer to `Failed` and
/// leaves every other peer alone.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// Opaque failure reported by the media transport.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),

    #[error("signaling link closed")]
    SignalingClosed,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid room id: {0:?}")]
    InvalidRoom(String),

    #[error("already in room {0}")]
    AlreadyInRoom(RoomId),

    #[error("a join request is already pending")]
    JoinPending,

    #[error("failed to reach the hub: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("signaling link closed")]
    SignalingClosed,

    #[error("session has shut down")]
    SessionClosed,
}

impl From<ClientError> for NegotiationError {
    fn from(_: ClientError) -> Self {
        NegotiationError::SignalingClosed
    }
}
