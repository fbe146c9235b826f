use std::collections::HashMap;
use std::sync::Arc;

use huddle_core::{ErrorKind, ParticipantId, RoomId, SignalMessage};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::negotiation::{
    NegotiationCommand, NegotiationContext, NegotiationHandle, PeerNegotiation, PeerState, Role,
    StateUpdate,
};
use crate::session::SessionObserver;
use crate::signaling::SignalingOutput;
use crate::transport::{MediaTransportFactory, TransportEvent};

enum SessionCommand {
    Join {
        room_id: String,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    Leave {
        reply: oneshot::Sender<()>,
    },
    PeerStates {
        reply: oneshot::Sender<HashMap<ParticipantId, PeerState>>,
    },
    Shutdown,
}

/// The room this session is in, as granted by the hub.
struct ActiveRoom {
    id: RoomId,
    local_id: ParticipantId,
    role: Role,
}

/// Owns the local side of a room: reacts to hub messages, runs one
/// [`PeerNegotiation`] per remote participant and relays what the transports
/// produce.
pub struct SessionCoordinator {
    signaling: Arc<dyn SignalingOutput>,
    factory: Arc<dyn MediaTransportFactory>,
    observer: Arc<dyn SessionObserver>,

    room: Option<ActiveRoom>,
    /// Room of the join request the hub has not answered yet.
    pending_join: Option<RoomId>,
    /// Joins abandoned by a leave before the hub answered them. The hub still
    /// answers each one, ahead of anything sent after the leave.
    abandoned_joins: usize,

    negotiations: HashMap<ParticipantId, NegotiationHandle>,
    next_epoch: u64,
    /// Last reported state of every live negotiation.
    states: HashMap<ParticipantId, PeerState>,

    transport_tx: mpsc::Sender<TransportEvent>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    updates_tx: mpsc::UnboundedSender<StateUpdate>,
    updates_rx: mpsc::UnboundedReceiver<StateUpdate>,
}

impl SessionCoordinator {
    pub fn new(
        signaling: Arc<dyn SignalingOutput>,
        factory: Arc<dyn MediaTransportFactory>,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        Self {
            signaling,
            factory,
            observer,
            room: None,
            pending_join: None,
            abandoned_joins: 0,
            negotiations: HashMap::new(),
            next_epoch: 0,
            states: HashMap::new(),
            transport_tx,
            transport_rx,
            updates_tx,
            updates_rx,
        }
    }

    /// Starts the session loop over `inbound` hub messages.
    pub fn spawn(self, inbound: mpsc::UnboundedReceiver<SignalMessage>) -> SessionHandle {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(commands_rx, inbound));
        SessionHandle { commands, task }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut inbound: mpsc::UnboundedReceiver<SignalMessage>,
    ) {
        info!("Session loop started");

        loop {
            tokio::select! {
                biased;

                // state changes land before any query that follows them
                update = self.updates_rx.recv() => {
                    if let Some(update) = update {
                        self.record_state(update);
                    }
                }

                cmd = commands.recv() => {
                    match cmd {
                        Some(SessionCommand::Shutdown) | None => break,
                        Some(cmd) => self.handle_command(cmd).await,
                    }
                }

                msg = inbound.recv() => {
                    match msg {
                        Some(msg) => self.handle_signal(msg).await,
                        None => {
                            warn!("Hub link closed, stopping session");
                            self.observer.on_disconnected();
                            break;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    match evt {
                        Some(evt) => self.handle_transport_event(evt).await,
                        None => {
                            warn!("Transport channel closed unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        self.close_all();
        self.drain_updates().await;
        info!("Session loop finished");
    }

    /// Forwards the final states of the negotiations closed on the way out.
    async fn drain_updates(self) {
        let Self {
            observer,
            updates_tx,
            mut updates_rx,
            ..
        } = self;
        drop(updates_tx);

        while let Some(update) = updates_rx.recv().await {
            observer.on_peer_state(update.remote, update.state);
        }
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Join { room_id, reply } => {
                let _ = reply.send(self.request_join(&room_id).await);
            }
            SessionCommand::Leave { reply } => {
                self.leave().await;
                let _ = reply.send(());
            }
            SessionCommand::PeerStates { reply } => {
                let _ = reply.send(self.states.clone());
            }
            SessionCommand::Shutdown => {}
        }
    }

    async fn request_join(&mut self, raw_room_id: &str) -> Result<(), ClientError> {
        let room_id = RoomId::parse(raw_room_id)
            .ok_or_else(|| ClientError::InvalidRoom(raw_room_id.to_owned()))?;

        if let Some(room) = &self.room {
            return Err(ClientError::AlreadyInRoom(room.id.clone()));
        }
        if self.pending_join.is_some() {
            return Err(ClientError::JoinPending);
        }

        self.signaling
            .send_signal(SignalMessage::JoinRoom {
                room_id: room_id.to_string(),
            })
            .await?;
        info!("Requested to join room {}", room_id);
        self.pending_join = Some(room_id);
        Ok(())
    }

    /// Leaves the room and resets role and room so a new join starts clean.
    async fn leave(&mut self) {
        if self.room.is_some() || self.pending_join.is_some() {
            if let Err(e) = self.signaling.send_signal(SignalMessage::LeaveRoom).await {
                warn!("Failed to send leave-room: {}", e);
            }
        }

        if let Some(room) = self.room.take() {
            info!("Left room {} ({})", room.id, room.role);
        }
        if let Some(room_id) = self.pending_join.take() {
            debug!("Abandoning join of {}", room_id);
            self.abandoned_joins += 1;
        }
        self.close_all();
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::RoomJoined {
                room_id,
                client_id,
                peers,
                host,
            } => self.on_room_joined(room_id, client_id, peers, host),

            SignalMessage::PeerJoined { peer_id } => {
                let Some(room) = &self.room else {
                    debug!("peer-joined outside a room, ignoring");
                    return;
                };
                let role = room.role;
                info!("Peer {} joined", peer_id);
                self.observer.on_peer_joined(peer_id);
                if role == Role::Host {
                    self.negotiate(peer_id, NegotiationCommand::StartOffer);
                }
            }

            SignalMessage::PeerLeft { peer_id } => {
                info!("Peer {} left", peer_id);
                self.close_peer(&peer_id);
                self.observer.on_peer_left(peer_id);
            }

            SignalMessage::Offer { sender, sdp, .. } => {
                self.route(sender, "offer", NegotiationCommand::RemoteOffer(sdp));
            }
            SignalMessage::Answer { sender, sdp, .. } => {
                self.route(sender, "answer", NegotiationCommand::RemoteAnswer(sdp));
            }
            SignalMessage::IceCandidate {
                sender, candidate, ..
            } => {
                self.route(
                    sender,
                    "ice-candidate",
                    NegotiationCommand::RemoteCandidate(candidate),
                );
            }

            SignalMessage::Error { error } => {
                let answers_join = matches!(
                    error.kind,
                    ErrorKind::InvalidRoom | ErrorKind::RoomFull | ErrorKind::JoinError
                );
                if answers_join && self.abandoned_joins > 0 {
                    self.abandoned_joins -= 1;
                    debug!("Refusal of an abandoned join: {}", error.message);
                    return;
                }

                warn!("Hub reported {}: {}", error.kind, error.message);
                if answers_join {
                    self.pending_join = None;
                }
                self.observer.on_hub_error(&error);
            }

            SignalMessage::Heartbeat => {
                if let Err(e) = self.signaling.send_signal(SignalMessage::Heartbeat).await {
                    warn!("Failed to answer heartbeat: {}", e);
                }
            }

            other => warn!("Unexpected {} from hub", other.kind()),
        }
    }

    fn on_room_joined(
        &mut self,
        room_id: RoomId,
        local_id: ParticipantId,
        peers: Vec<ParticipantId>,
        host: bool,
    ) {
        if self.abandoned_joins > 0 {
            // the hub already processed a later leave-room
            self.abandoned_joins -= 1;
            debug!("Stale room-joined for {}, ignoring", room_id);
            return;
        }
        if self.pending_join.as_ref() != Some(&room_id) {
            warn!("Unrequested room-joined for {}, ignoring", room_id);
            return;
        }
        self.pending_join = None;

        let role = Role::from_host_flag(host);
        info!(
            "Joined room {} as {} ({}) with {} peer(s)",
            room_id,
            role,
            local_id,
            peers.len()
        );

        self.observer.on_room_joined(&room_id, role, &peers);
        self.room = Some(ActiveRoom {
            id: room_id,
            local_id,
            role,
        });

        if role == Role::Host {
            for peer in peers {
                self.negotiate(peer, NegotiationCommand::StartOffer);
            }
        }
    }

    /// Hands a relayed message to the sender's negotiation, creating it if
    /// needed.
    fn route(&mut self, sender: Option<ParticipantId>, kind: &str, cmd: NegotiationCommand) {
        let Some(remote) = sender else {
            warn!("Dropping {} without a sender", kind);
            return;
        };
        match &self.room {
            Some(room) if room.local_id == remote => {
                warn!("Dropping {} that claims to come from us", kind);
            }
            Some(_) => self.negotiate(remote, cmd),
            None => warn!("Dropping {} from {} outside a room", kind, remote),
        }
    }

    fn negotiate(&mut self, remote: ParticipantId, cmd: NegotiationCommand) {
        let Some(room) = &self.room else { return };
        let role = room.role;

        if !self.negotiations.contains_key(&remote) {
            let ctx = NegotiationContext {
                signaling: self.signaling.clone(),
                factory: self.factory.clone(),
                observer: self.observer.clone(),
                transport_events: self.transport_tx.clone(),
                updates: self.updates_tx.clone(),
            };
            self.next_epoch += 1;
            self.negotiations.insert(
                remote,
                PeerNegotiation::spawn(remote, role, self.next_epoch, ctx),
            );
            self.states.insert(remote, PeerState::Idle);
        }

        let delivered = self
            .negotiations
            .get(&remote)
            .is_some_and(|negotiation| negotiation.send(cmd));
        if !delivered {
            warn!("Negotiation with {} is gone", remote);
        }
    }

    async fn handle_transport_event(&mut self, evt: TransportEvent) {
        let remote = evt.remote();
        let Some(negotiation) = self.negotiations.get(&remote) else {
            debug!("Dropping transport event for closed peer {}", remote);
            return;
        };

        match evt {
            TransportEvent::LocalCandidate { candidate, .. } => {
                let msg = SignalMessage::IceCandidate {
                    target: remote,
                    sender: None,
                    candidate,
                };
                if let Err(e) = self.signaling.send_signal(msg).await {
                    warn!("Failed to send candidate to {}: {}", remote, e);
                }
            }
            TransportEvent::StateChanged { state, .. } => {
                negotiation.send(NegotiationCommand::TransportState(state));
            }
            TransportEvent::NegotiationNeeded { .. } => {
                negotiation.send(NegotiationCommand::Renegotiate);
            }
        }
    }

    /// Keeps the state of live negotiations. A closed negotiation still gets
    /// its last word to the observer, unless a newer one for the same peer
    /// has started since.
    fn record_state(&mut self, update: StateUpdate) {
        let StateUpdate {
            remote,
            epoch,
            state,
        } = update;

        match self.negotiations.get(&remote) {
            Some(live) if live.epoch() == epoch => {
                self.states.insert(remote, state);
            }
            Some(_) => {
                debug!("Dropping {} from an earlier negotiation with {}", state, remote);
                return;
            }
            None => {}
        }
        self.observer.on_peer_state(remote, state);
    }

    fn close_peer(&mut self, peer: &ParticipantId) {
        if let Some(negotiation) = self.negotiations.remove(peer) {
            negotiation.close();
        }
        self.states.remove(peer);
    }

    fn close_all(&mut self) {
        for (peer, negotiation) in self.negotiations.drain() {
            debug!("Closing negotiation with {}", peer);
            negotiation.close();
        }
        self.states.clear();
    }
}

/// Application-side handle to a running session.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Asks the hub to join `room_id`. The outcome arrives through the
    /// observer as a room-joined or hub error notification.
    pub async fn join(&self, room_id: &str) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Join {
            room_id: room_id.to_owned(),
            reply,
        })?;
        rx.await.map_err(|_| ClientError::SessionClosed)?
    }

    /// Leaves the current room and closes every negotiation.
    pub async fn leave(&self) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Leave { reply })?;
        rx.await.map_err(|_| ClientError::SessionClosed)
    }

    pub async fn peer_states(&self) -> Result<HashMap<ParticipantId, PeerState>, ClientError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::PeerStates { reply })?;
        rx.await.map_err(|_| ClientError::SessionClosed)
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the session loop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.commands.send(SessionCommand::Shutdown);
        if let Err(e) = self.task.await {
            warn!("Session task ended abnormally: {}", e);
        }
    }

    fn send(&self, cmd: SessionCommand) -> Result<(), ClientError> {
        self.commands
            .send(cmd)
            .map_err(|_| ClientError::SessionClosed)
    }
}
