use crate::model::participant::ParticipantId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

/// Session description as carried in `offer` / `answer` messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default)]
    pub sdp_m_line_index: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidRoom,
    RoomFull,
    InvalidTarget,
    SignalingError,
    JoinError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorKind::InvalidRoom => "INVALID_ROOM",
            ErrorKind::RoomFull => "ROOM_FULL",
            ErrorKind::InvalidTarget => "INVALID_TARGET",
            ErrorKind::SignalingError => "SIGNALING_ERROR",
            ErrorKind::JoinError => "JOIN_ERROR",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
}

/// Every frame exchanged between a client and the hub.
///
/// `sender` is optional on the way in; the hub always overwrites it with the
/// id of the connection the frame arrived on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMessage {
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String },

    LeaveRoom,

    #[serde(rename_all = "camelCase")]
    RoomJoined {
        room_id: RoomId,
        client_id: ParticipantId,
        peers: Vec<ParticipantId>,
        host: bool,
    },

    #[serde(rename_all = "camelCase")]
    PeerJoined { peer_id: ParticipantId },

    #[serde(rename_all = "camelCase")]
    PeerLeft { peer_id: ParticipantId },

    Offer {
        target: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<ParticipantId>,
        sdp: SessionDescription,
    },

    Answer {
        target: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<ParticipantId>,
        sdp: SessionDescription,
    },

    IceCandidate {
        target: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<ParticipantId>,
        candidate: IceCandidate,
    },

    Error { error: ErrorPayload },

    Heartbeat,
}

impl SignalMessage {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            error: ErrorPayload {
                kind,
                message: message.into(),
            },
        }
    }

    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            SignalMessage::JoinRoom { .. } => "join-room",
            SignalMessage::LeaveRoom => "leave-room",
            SignalMessage::RoomJoined { .. } => "room-joined",
            SignalMessage::PeerJoined { .. } => "peer-joined",
            SignalMessage::PeerLeft { .. } => "peer-left",
            SignalMessage::Offer { .. } => "offer",
            SignalMessage::Answer { .. } => "answer",
            SignalMessage::IceCandidate { .. } => "ice-candidate",
            SignalMessage::Error { .. } => "error",
            SignalMessage::Heartbeat => "heartbeat",
        }
    }

    /// True for the peer-to-peer messages the hub forwards.
    pub fn is_relayed(&self) -> bool {
        matches!(
            self,
            SignalMessage::Offer { .. }
                | SignalMessage::Answer { .. }
                | SignalMessage::IceCandidate { .. }
        )
    }

    pub fn target(&self) -> Option<ParticipantId> {
        match self {
            SignalMessage::Offer { target, .. }
            | SignalMessage::Answer { target, .. }
            | SignalMessage::IceCandidate { target, .. } => Some(*target),
            _ => None,
        }
    }

    pub fn sender(&self) -> Option<ParticipantId> {
        match self {
            SignalMessage::Offer { sender, .. }
            | SignalMessage::Answer { sender, .. }
            | SignalMessage::IceCandidate { sender, .. } => *sender,
            _ => None,
        }
    }

    /// Replaces the `sender` of a relayed message. Other messages are
    /// returned unchanged.
    pub fn with_sender(mut self, id: ParticipantId) -> Self {
        match &mut self {
            SignalMessage::Offer { sender, .. }
            | SignalMessage::Answer { sender, .. }
            | SignalMessage::IceCandidate { sender, .. } => *sender = Some(id),
            _ => {}
        }
        self
    }

    /// Checks the payload sub-fields of a relayed message.
    pub fn validate_payload(&self) -> Result<(), String> {
        match self {
            SignalMessage::Offer { sdp, .. } => check_description(sdp, SdpType::Offer),
            SignalMessage::Answer { sdp, .. } => check_description(sdp, SdpType::Answer),
            SignalMessage::IceCandidate { candidate, .. } => {
                if candidate.sdp_mid.is_none() && candidate.sdp_m_line_index.is_none() {
                    return Err("ice-candidate needs sdpMid or sdpMLineIndex".to_owned());
                }
                Ok(())
            }
            other => Err(format!("'{}' is not a relayed message", other.kind())),
        }
    }
}

fn check_description(desc: &SessionDescription, expected: SdpType) -> Result<(), String> {
    if desc.kind != expected {
        return Err(format!(
            "sdp.type is {:?}, expected {:?}",
            desc.kind, expected
        ));
    }
    if desc.sdp.trim().is_empty() {
        return Err("sdp.sdp is empty".to_owned());
    }
    Ok(())
}
