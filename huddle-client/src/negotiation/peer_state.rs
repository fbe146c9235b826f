use std::fmt;

/// Local role in the current room, granted by the hub on `room-joined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sends an offer to every peer it learns about.
    Host,
    /// Only answers offers.
    Joiner,
}

impl Role {
    pub fn from_host_flag(host: bool) -> Self {
        if host { Role::Host } else { Role::Joiner }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => f.write_str("host"),
            Role::Joiner => f.write_str("joiner"),
        }
    }
}

/// Negotiation progress with one remote participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Idle,
    /// Local offer applied and sent, waiting for the answer.
    OfferPending,
    /// Remote offer applied, local answer not sent yet.
    AnswerPending,
    Connected,
    Failed,
    Closed,
}

impl PeerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PeerState::Failed | PeerState::Closed)
    }
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PeerState::Idle => "idle",
            PeerState::OfferPending => "offer-pending",
            PeerState::AnswerPending => "answer-pending",
            PeerState::Connected => "connected",
            PeerState::Failed => "failed",
            PeerState::Closed => "closed",
        };
        f.write_str(name)
    }
}
