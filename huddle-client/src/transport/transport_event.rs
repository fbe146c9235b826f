use huddle_core::{IceCandidate, ParticipantId};

/// Connection state reported by a media transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Events a transport raises for the session loop. Each one carries the
/// remote participant the transport belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A local ICE candidate to relay to the remote.
    LocalCandidate {
        remote: ParticipantId,
        candidate: IceCandidate,
    },

    StateChanged {
        remote: ParticipantId,
        state: TransportState,
    },

    /// Local media changed and a new offer is required.
    NegotiationNeeded { remote: ParticipantId },
}

impl TransportEvent {
    pub fn remote(&self) -> ParticipantId {
        match self {
            TransportEvent::LocalCandidate { remote, .. }
            | TransportEvent::StateChanged { remote, .. }
            | TransportEvent::NegotiationNeeded { remote } => *remote,
        }
    }
}
