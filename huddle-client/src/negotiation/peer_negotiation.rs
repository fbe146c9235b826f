use std::sync::Arc;

use anyhow::anyhow;
use huddle_core::{IceCandidate, ParticipantId, SessionDescription, SignalMessage};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::error::NegotiationError;
use crate::negotiation::{PeerState, Role};
use crate::session::SessionObserver;
use crate::signaling::SignalingOutput;
use crate::transport::{MediaTransport, MediaTransportFactory, TransportEvent, TransportState};

/// Steps queued for a negotiation, applied strictly in order.
#[derive(Debug)]
pub enum NegotiationCommand {
    /// Host only: open the negotiation with an offer.
    StartOffer,
    /// The transport asked for a new offer.
    Renegotiate,
    RemoteOffer(SessionDescription),
    RemoteAnswer(SessionDescription),
    RemoteCandidate(IceCandidate),
    TransportState(TransportState),
}

/// A state change reported by the negotiation spawned as `epoch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateUpdate {
    pub remote: ParticipantId,
    pub epoch: u64,
    pub state: PeerState,
}

/// What a negotiation shares with the session that owns it.
#[derive(Clone)]
pub struct NegotiationContext {
    pub signaling: Arc<dyn SignalingOutput>,
    pub factory: Arc<dyn MediaTransportFactory>,
    pub observer: Arc<dyn SessionObserver>,
    /// Handed to every transport the negotiation creates.
    pub transport_events: mpsc::Sender<TransportEvent>,
    /// State changes reported back to the session, which forwards the live
    /// ones to the observer.
    pub updates: mpsc::UnboundedSender<StateUpdate>,
}

/// Session-side handle to a running negotiation task.
pub struct NegotiationHandle {
    epoch: u64,
    commands: mpsc::UnboundedSender<NegotiationCommand>,
    close: Option<oneshot::Sender<()>>,
}

impl NegotiationHandle {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Queues a step. Returns false once the negotiation task has stopped.
    pub fn send(&self, cmd: NegotiationCommand) -> bool {
        self.commands.send(cmd).is_ok()
    }

    /// Stops the negotiation, cancelling any step in flight. The transport is
    /// closed by the negotiation task; this never waits for it.
    pub fn close(mut self) {
        if let Some(close) = self.close.take() {
            let _ = close.send(());
        }
    }
}

/// Offer/answer exchange with one remote participant.
///
/// Runs as its own task. Remote candidates are held back until a remote
/// description has been applied and are then applied in arrival order.
pub struct PeerNegotiation {
    remote: ParticipantId,
    epoch: u64,
    role: Role,
    state: PeerState,
    transport: Option<Arc<dyn MediaTransport>>,
    pending_candidates: Vec<IceCandidate>,
    has_remote_description: bool,
    ctx: NegotiationContext,
}

impl PeerNegotiation {
    /// Starts the negotiation task. `epoch` tags every state update so the
    /// session can tell it apart from an earlier negotiation with `remote`.
    pub fn spawn(
        remote: ParticipantId,
        role: Role,
        epoch: u64,
        ctx: NegotiationContext,
    ) -> NegotiationHandle {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (close, close_rx) = oneshot::channel();

        let negotiation = Self {
            remote,
            epoch,
            role,
            state: PeerState::Idle,
            transport: None,
            pending_candidates: Vec::new(),
            has_remote_description: false,
            ctx,
        };
        debug!("Negotiation with {} started as {}", remote, role);
        tokio::spawn(negotiation.run(commands_rx, close_rx));

        NegotiationHandle {
            epoch,
            commands,
            close: Some(close),
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<NegotiationCommand>,
        mut close: oneshot::Receiver<()>,
    ) {
        loop {
            let next = tokio::select! {
                biased;
                _ = &mut close => None,
                cmd = commands.recv() => cmd,
            };
            let Some(cmd) = next else { break };

            let cancelled = tokio::select! {
                biased;
                _ = &mut close => true,
                _ = self.handle(cmd) => false,
            };
            if cancelled {
                break;
            }
        }

        self.shutdown().await;
    }

    async fn handle(&mut self, cmd: NegotiationCommand) {
        if self.state.is_terminal() {
            debug!("Negotiation with {} is {}, ignoring {:?}", self.remote, self.state, cmd);
            return;
        }

        let result = match cmd {
            NegotiationCommand::StartOffer => self.start_offer().await,
            NegotiationCommand::Renegotiate => self.renegotiate().await,
            NegotiationCommand::RemoteOffer(sdp) => self.accept_offer(sdp).await,
            NegotiationCommand::RemoteAnswer(sdp) => self.accept_answer(sdp).await,
            NegotiationCommand::RemoteCandidate(candidate) => self.add_candidate(candidate).await,
            NegotiationCommand::TransportState(state) => self.on_transport_state(state),
        };

        if let Err(e) = result {
            self.fail(e);
        }
    }

    async fn start_offer(&mut self) -> Result<(), NegotiationError> {
        if self.role != Role::Host {
            warn!("Joiner asked to offer to {}, ignoring", self.remote);
            return Ok(());
        }
        if self.state != PeerState::Idle {
            debug!("Offer to {} already made ({})", self.remote, self.state);
            return Ok(());
        }
        self.send_offer().await
    }

    async fn renegotiate(&mut self) -> Result<(), NegotiationError> {
        if self.role == Role::Host && self.state == PeerState::Connected {
            info!("Renegotiating with {}", self.remote);
            return self.send_offer().await;
        }
        debug!(
            "Negotiation needed with {} ignored ({} in {})",
            self.remote, self.role, self.state
        );
        Ok(())
    }

    async fn send_offer(&mut self) -> Result<(), NegotiationError> {
        let transport = self.transport().await?;

        let offer = transport.create_offer().await?;
        transport.set_local_description(offer.clone()).await?;
        self.ctx
            .signaling
            .send_signal(SignalMessage::Offer {
                target: self.remote,
                sender: None,
                sdp: offer,
            })
            .await?;

        self.set_state(PeerState::OfferPending);
        Ok(())
    }

    async fn accept_offer(&mut self, sdp: SessionDescription) -> Result<(), NegotiationError> {
        if self.role == Role::Host {
            warn!("Host ignoring offer from {}", self.remote);
            return Ok(());
        }
        if !matches!(self.state, PeerState::Idle | PeerState::Connected) {
            warn!("Offer from {} while {}, ignoring", self.remote, self.state);
            return Ok(());
        }

        let transport = self.transport().await?;
        transport.set_remote_description(sdp).await?;
        self.has_remote_description = true;
        self.set_state(PeerState::AnswerPending);
        self.flush_candidates(&transport).await?;

        let answer = transport.create_answer().await?;
        transport.set_local_description(answer.clone()).await?;
        self.ctx
            .signaling
            .send_signal(SignalMessage::Answer {
                target: self.remote,
                sender: None,
                sdp: answer,
            })
            .await?;

        self.set_state(PeerState::Connected);
        Ok(())
    }

    async fn accept_answer(&mut self, sdp: SessionDescription) -> Result<(), NegotiationError> {
        if self.state != PeerState::OfferPending {
            warn!(
                "Answer from {} without an outstanding offer ({}), ignoring",
                self.remote, self.state
            );
            return Ok(());
        }

        let transport = self.transport().await?;
        transport.set_remote_description(sdp).await?;
        self.has_remote_description = true;
        self.flush_candidates(&transport).await?;

        self.set_state(PeerState::Connected);
        Ok(())
    }

    async fn add_candidate(&mut self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        if !self.has_remote_description {
            debug!("Queueing candidate from {}", self.remote);
            self.pending_candidates.push(candidate);
            return Ok(());
        }

        let transport = self.transport().await?;
        transport.add_remote_candidate(candidate).await?;
        Ok(())
    }

    fn on_transport_state(&mut self, state: TransportState) -> Result<(), NegotiationError> {
        debug!("Transport to {} is {:?}", self.remote, state);
        if state == TransportState::Failed {
            return Err(anyhow!("media transport failed").into());
        }
        Ok(())
    }

    async fn flush_candidates(
        &mut self,
        transport: &Arc<dyn MediaTransport>,
    ) -> Result<(), NegotiationError> {
        if !self.pending_candidates.is_empty() {
            debug!(
                "Applying {} queued candidate(s) from {}",
                self.pending_candidates.len(),
                self.remote
            );
        }
        for candidate in std::mem::take(&mut self.pending_candidates) {
            transport.add_remote_candidate(candidate).await?;
        }
        Ok(())
    }

    /// The transport for this remote, created on first use.
    async fn transport(&mut self) -> Result<Arc<dyn MediaTransport>, NegotiationError> {
        if let Some(transport) = &self.transport {
            return Ok(transport.clone());
        }

        let transport = self
            .ctx
            .factory
            .create(self.remote, self.ctx.transport_events.clone())
            .await?;
        self.transport = Some(transport.clone());
        Ok(transport)
    }

    fn set_state(&mut self, state: PeerState) {
        info!("Peer {}: {} -> {}", self.remote, self.state, state);
        self.state = state;
        let _ = self.ctx.updates.send(StateUpdate {
            remote: self.remote,
            epoch: self.epoch,
            state,
        });
    }

    fn fail(&mut self, e: NegotiationError) {
        error!("Negotiation with {} failed: {}", self.remote, e);
        self.set_state(PeerState::Failed);
        self.ctx.observer.on_peer_failed(self.remote, &e);
    }

    async fn shutdown(mut self) {
        self.pending_candidates.clear();

        if let Some(transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                warn!("Failed to close transport to {}: {}", self.remote, e);
            }
        }

        if self.state != PeerState::Failed {
            self.set_state(PeerState::Closed);
        }
        debug!("Negotiation with {} finished", self.remote);
    }
}
