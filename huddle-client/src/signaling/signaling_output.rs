use async_trait::async_trait;
use huddle_core::SignalMessage;

use crate::error::ClientError;

/// Outbound half of the link to the hub, handed to the session so it can
/// send join requests, descriptions and candidates.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_signal(&self, msg: SignalMessage) -> Result<(), ClientError>;
}
