use huddle_core::{ErrorPayload, ParticipantId, RoomId};
use tokio::sync::mpsc;

use crate::error::NegotiationError;
use crate::negotiation::{PeerState, Role};

/// Session notifications for the application. Every method defaults to a
/// no-op. Calls arrive from the session task and from negotiation tasks, so
/// implementations must not block.
pub trait SessionObserver: Send + Sync {
    fn on_room_joined(&self, _room: &RoomId, _role: Role, _peers: &[ParticipantId]) {}

    fn on_peer_joined(&self, _peer: ParticipantId) {}

    fn on_peer_state(&self, _peer: ParticipantId, _state: PeerState) {}

    fn on_peer_failed(&self, _peer: ParticipantId, _error: &NegotiationError) {}

    fn on_peer_left(&self, _peer: ParticipantId) {}

    /// An `error` frame from the hub.
    fn on_hub_error(&self, _error: &ErrorPayload) {}

    /// The hub link is gone and the session has stopped.
    fn on_disconnected(&self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    RoomJoined {
        room: RoomId,
        role: Role,
        peers: Vec<ParticipantId>,
    },
    PeerJoined(ParticipantId),
    PeerState {
        peer: ParticipantId,
        state: PeerState,
    },
    PeerFailed {
        peer: ParticipantId,
        reason: String,
    },
    PeerLeft(ParticipantId),
    HubError(ErrorPayload),
    Disconnected,
}

/// Forwards every notification as a [`SessionEvent`] on a channel.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}

impl SessionObserver for ChannelObserver {
    fn on_room_joined(&self, room: &RoomId, role: Role, peers: &[ParticipantId]) {
        self.emit(SessionEvent::RoomJoined {
            room: room.clone(),
            role,
            peers: peers.to_vec(),
        });
    }

    fn on_peer_joined(&self, peer: ParticipantId) {
        self.emit(SessionEvent::PeerJoined(peer));
    }

    fn on_peer_state(&self, peer: ParticipantId, state: PeerState) {
        self.emit(SessionEvent::PeerState { peer, state });
    }

    fn on_peer_failed(&self, peer: ParticipantId, error: &NegotiationError) {
        self.emit(SessionEvent::PeerFailed {
            peer,
            reason: error.to_string(),
        });
    }

    fn on_peer_left(&self, peer: ParticipantId) {
        self.emit(SessionEvent::PeerLeft(peer));
    }

    fn on_hub_error(&self, error: &ErrorPayload) {
        self.emit(SessionEvent::HubError(error.clone()));
    }

    fn on_disconnected(&self) {
        self.emit(SessionEvent::Disconnected);
    }
}
