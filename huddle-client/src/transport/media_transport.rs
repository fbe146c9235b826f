use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use huddle_core::{IceCandidate, ParticipantId, SessionDescription};
use tokio::sync::mpsc;

use crate::transport::TransportEvent;

/// One media connection to one remote participant.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds a transport for a remote participant. The transport reports its
/// events on `events`.
#[async_trait]
pub trait MediaTransportFactory: Send + Sync {
    async fn create(
        &self,
        remote: ParticipantId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn MediaTransport>>;
}
