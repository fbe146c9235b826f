mod peer_negotiation;
mod peer_state;

pub use peer_negotiation::*;
pub use peer_state::*;
