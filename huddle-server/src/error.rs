use huddle_core::{ErrorKind, ParticipantId, RoomId, SignalMessage};
use thiserror::Error;

/// Hub-side request failures. Each one is reported only to the participant
/// whose request triggered it.
#[derive(Debug, Error)]
pub enum HubError {
    /// Missing or malformed room id on `join-room`.
    #[error("invalid room id: {0:?}")]
    InvalidRoom(String),

    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// Relay target is not connected or not in the sender's room.
    #[error("target {0} is not reachable from the sender's room")]
    InvalidTarget(ParticipantId),

    /// Unparseable frame or relayed message with missing sub-fields.
    #[error("malformed {kind} message: {reason}")]
    Signaling { kind: String, reason: String },

    #[error("join failed: {0}")]
    Join(String),
}

impl HubError {
    pub fn signaling(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Signaling {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            HubError::InvalidRoom(_) => ErrorKind::InvalidRoom,
            HubError::RoomFull(_) => ErrorKind::RoomFull,
            HubError::InvalidTarget(_) => ErrorKind::InvalidTarget,
            HubError::Signaling { .. } => ErrorKind::SignalingError,
            HubError::Join(_) => ErrorKind::JoinError,
        }
    }

    /// The `error` frame sent back to the requester.
    pub fn to_signal(&self) -> SignalMessage {
        SignalMessage::error(self.kind(), self.to_string())
    }
}
