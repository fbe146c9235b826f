use crate::error::HubError;
use crate::room::{Admission, RoomManager};
use dashmap::DashMap;
use huddle_core::{ParticipantId, RoomId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

struct SignalingInner {
    /// Outbound queue of every open connection.
    peers: DashMap<ParticipantId, mpsc::UnboundedSender<SignalMessage>>,
    /// Room of every participant currently in one.
    memberships: DashMap<ParticipantId, RoomId>,
    rooms: RoomManager,
}

/// The signaling hub: connected participants, room membership and relay.
///
/// Peer queues may be looked up while a room entry is locked, never the other
/// way round. Membership guards are released before the room table is
/// touched.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(max_room_size: usize) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
                memberships: DashMap::new(),
                rooms: RoomManager::new(max_room_size),
            }),
        }
    }

    /// Registers a new connection under a fresh id.
    pub fn connect(&self) -> (ParticipantId, mpsc::UnboundedReceiver<SignalMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let participant_id = ParticipantId::new();
        self.add_peer(participant_id, tx);
        (participant_id, rx)
    }

    pub fn add_peer(&self, participant_id: ParticipantId, tx: mpsc::UnboundedSender<SignalMessage>) {
        self.inner.peers.insert(participant_id, tx);
        debug!("Participant {} connected", participant_id);
    }

    pub fn is_connected(&self, participant_id: &ParticipantId) -> bool {
        self.inner.peers.contains_key(participant_id)
    }

    pub fn room_of(&self, participant_id: &ParticipantId) -> Option<RoomId> {
        self.inner
            .memberships
            .get(participant_id)
            .map(|room| room.clone())
    }

    pub fn room_members(&self, room_id: &RoomId) -> Option<Vec<ParticipantId>> {
        self.inner.rooms.members(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.inner.rooms.room_count()
    }

    pub fn participant_count(&self) -> usize {
        self.inner.peers.len()
    }

    /// Queues `msg` for `participant_id`. Returns false if it is not
    /// connected; the message is dropped.
    pub fn send_signal(&self, participant_id: ParticipantId, msg: SignalMessage) -> bool {
        let Some(peer) = self.inner.peers.get(&participant_id) else {
            warn!(
                "Attempted to send {} to disconnected participant {}",
                msg.kind(),
                participant_id
            );
            return false;
        };

        if let Err(e) = peer.send(msg) {
            error!("Failed to queue message for {}: {}", participant_id, e);
            return false;
        }
        true
    }

    /// Joins `raw_room_id`. On success the hub has already sent
    /// `room-joined` to the joiner and `peer-joined` to the existing members.
    pub fn join_room(
        &self,
        participant_id: ParticipantId,
        raw_room_id: &str,
    ) -> Result<Admission, HubError> {
        let room_id = RoomId::parse(raw_room_id)
            .ok_or_else(|| HubError::InvalidRoom(raw_room_id.to_owned()))?;

        if !self.is_connected(&participant_id) {
            return Err(HubError::Join(format!(
                "{} is not connected",
                participant_id
            )));
        }

        // Reserve the membership slot first so a participant can never be in
        // two rooms, even transiently.
        match self.inner.memberships.entry(participant_id) {
            dashmap::mapref::entry::Entry::Occupied(current) => {
                return Err(HubError::Join(format!(
                    "already a member of room {}",
                    current.get()
                )));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(room_id.clone());
            }
        }

        let joined = self
            .inner
            .rooms
            .join(&room_id, participant_id, |to, msg| {
                self.send_signal(to, msg);
            });

        if joined.is_err() {
            self.inner.memberships.remove(&participant_id);
        }
        joined
    }

    /// Leaves the current room, if any. Returns whether a room was left.
    pub fn leave_room(&self, participant_id: &ParticipantId) -> bool {
        let Some((_, room_id)) = self.inner.memberships.remove(participant_id) else {
            return false;
        };

        self.inner
            .rooms
            .leave(&room_id, participant_id, |to, msg| {
                self.send_signal(to, msg);
            })
            .is_some()
    }

    /// Forwards an `offer`, `answer` or `ice-candidate` to its target.
    ///
    /// The payload is checked first; then sender and target must both be
    /// members of the same room. The `sender` field is stamped with the
    /// sender's connection id.
    pub fn relay(&self, sender: ParticipantId, msg: SignalMessage) -> Result<(), HubError> {
        let kind = msg.kind();
        msg.validate_payload()
            .map_err(|reason| HubError::signaling(kind, reason))?;

        let Some(target) = msg.target() else {
            return Err(HubError::signaling(kind, "missing target"));
        };

        if !self.is_connected(&target) {
            return Err(HubError::InvalidTarget(target));
        }

        let Some(room_id) = self.room_of(&sender) else {
            return Err(HubError::InvalidTarget(target));
        };

        let rooms = &self.inner.rooms;
        if !rooms.is_member(&room_id, &sender) || !rooms.is_member(&room_id, &target) {
            return Err(HubError::InvalidTarget(target));
        }

        debug!("Relaying {} {} -> {}", kind, sender, target);
        if !self.send_signal(target, msg.with_sender(sender)) {
            return Err(HubError::InvalidTarget(target));
        }
        Ok(())
    }

    /// Handles one client frame and reports any failure to the sender only.
    pub fn dispatch(&self, participant_id: ParticipantId, msg: SignalMessage) {
        if let Err(e) = self.handle_message(participant_id, msg) {
            self.reject(participant_id, &e);
        }
    }

    pub fn handle_message(
        &self,
        participant_id: ParticipantId,
        msg: SignalMessage,
    ) -> Result<(), HubError> {
        match msg {
            SignalMessage::JoinRoom { room_id } => {
                self.join_room(participant_id, &room_id).map(|_| ())
            }
            SignalMessage::LeaveRoom => {
                if !self.leave_room(&participant_id) {
                    debug!("{} sent leave-room outside a room", participant_id);
                }
                Ok(())
            }
            SignalMessage::Heartbeat => {
                debug!("Heartbeat from {}", participant_id);
                Ok(())
            }
            msg if msg.is_relayed() => self.relay(participant_id, msg),
            other => Err(HubError::signaling(
                other.kind(),
                "not accepted from clients",
            )),
        }
    }

    /// Sends the error frame for `err` to the requester.
    pub fn reject(&self, participant_id: ParticipantId, err: &HubError) {
        warn!("Rejected request from {}: {}", participant_id, err);
        self.send_signal(participant_id, err.to_signal());
    }

    /// Removes the participant from its room (notifying the others) and
    /// drops its outbound queue. Safe to call more than once.
    pub fn disconnect(&self, participant_id: &ParticipantId) {
        let left = self.leave_room(participant_id);
        let removed = self.inner.peers.remove(participant_id).is_some();

        if removed || left {
            info!("Participant {} disconnected", participant_id);
        }
    }

    /// Queues a heartbeat for every connected participant.
    pub fn broadcast_heartbeat(&self) -> usize {
        let peers: Vec<ParticipantId> = self.inner.peers.iter().map(|p| *p.key()).collect();

        peers
            .into_iter()
            .filter(|id| self.send_signal(*id, SignalMessage::Heartbeat))
            .count()
    }
}

/// Parses a client text frame, classifying failures the way the hub reports
/// them: a broken `join-room` is `INVALID_ROOM`, anything else is
/// `SIGNALING_ERROR`.
pub fn parse_frame(text: &str) -> Result<SignalMessage, HubError> {
    match serde_json::from_str::<SignalMessage>(text) {
        Ok(msg) => Ok(msg),
        Err(e) => {
            let kind = serde_json::from_str::<serde_json::Value>(text)
                .ok()
                .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(str::to_owned));

            match kind.as_deref() {
                Some("join-room") => Err(HubError::InvalidRoom(format!("unusable roomId: {}", e))),
                Some(kind) => Err(HubError::signaling(kind, e.to_string())),
                None => Err(HubError::signaling("unknown", e.to_string())),
            }
        }
    }
}
