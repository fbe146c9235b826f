use crate::error::HubError;
use crate::room::{Admission, Room};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use huddle_core::{ParticipantId, RoomId, SignalMessage};
use std::sync::Arc;
use tracing::{debug, info};

/// Registry of live rooms.
///
/// Every mutation runs under the room's map entry lock, so the capacity check,
/// the insertion and the membership fan-out for one room are a single step.
/// `notify` callbacks are invoked while that lock is held and must not block
/// or touch the room table.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, Room>>,
    capacity: usize,
}

impl RoomManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admits `participant`, then sends `room-joined` to it and `peer-joined`
    /// to every existing member, in that order.
    pub fn join<F>(
        &self,
        room_id: &RoomId,
        participant: ParticipantId,
        notify: F,
    ) -> Result<Admission, HubError>
    where
        F: Fn(ParticipantId, SignalMessage),
    {
        let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Room::new(room_id.clone(), self.capacity)
        });

        let admission = match room.admit(participant) {
            Ok(admission) => admission,
            Err(e) => {
                let abandoned = room.is_empty();
                drop(room);
                if abandoned {
                    self.rooms.remove_if(room_id, |_, room| room.is_empty());
                }
                return Err(e);
            }
        };

        notify(
            participant,
            SignalMessage::RoomJoined {
                room_id: room_id.clone(),
                client_id: participant,
                peers: admission.existing_peers.clone(),
                host: admission.host,
            },
        );
        for peer in &admission.existing_peers {
            notify(
                *peer,
                SignalMessage::PeerJoined {
                    peer_id: participant,
                },
            );
        }

        info!(
            "{} joined room {} ({}/{}, host: {})",
            participant,
            room_id,
            room.len(),
            self.capacity,
            admission.host
        );
        Ok(admission)
    }

    /// Removes `participant` and sends `peer-left` to the remaining members.
    /// The room is deleted once empty. Returns the remaining members, or
    /// `None` if the participant was not in the room.
    pub fn leave<F>(
        &self,
        room_id: &RoomId,
        participant: &ParticipantId,
        notify: F,
    ) -> Option<Vec<ParticipantId>>
    where
        F: Fn(ParticipantId, SignalMessage),
    {
        let Entry::Occupied(mut entry) = self.rooms.entry(room_id.clone()) else {
            return None;
        };

        if !entry.get_mut().remove(participant) {
            return None;
        }

        let remaining = entry.get().members().to_vec();
        for peer in &remaining {
            notify(
                *peer,
                SignalMessage::PeerLeft {
                    peer_id: *participant,
                },
            );
        }

        if remaining.is_empty() {
            entry.remove();
            info!("Room {} is empty, removed", room_id);
        } else {
            debug!(
                "{} left room {}, {} member(s) remain",
                participant,
                room_id,
                remaining.len()
            );
        }

        Some(remaining)
    }

    pub fn is_member(&self, room_id: &RoomId, participant: &ParticipantId) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|room| room.contains(participant))
    }

    pub fn members(&self, room_id: &RoomId) -> Option<Vec<ParticipantId>> {
        self.rooms.get(room_id).map(|room| room.members().to_vec())
    }

    pub fn host(&self, room_id: &RoomId) -> Option<ParticipantId> {
        self.rooms.get(room_id).and_then(|room| room.host())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
