mod audio_transport;
mod media_transport;
mod transport_event;

pub use audio_transport::*;
pub use media_transport::*;
pub use transport_event::*;
