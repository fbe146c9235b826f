mod heartbeat;
mod signaling_service;
mod ws_handler;

pub use heartbeat::*;
pub use signaling_service::*;
pub use ws_handler::*;
