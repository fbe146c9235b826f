use crate::error::HubError;
use huddle_core::{ParticipantId, RoomId};

/// Result of a successful admission into a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Membership immediately before the join, in join order.
    pub existing_peers: Vec<ParticipantId>,
    /// Whether the hub granted host status to the new member.
    pub host: bool,
}

/// Membership of a single room. Only ever touched under the room's map entry
/// lock held by [`RoomManager`](crate::room::RoomManager).
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    capacity: usize,
    members: Vec<ParticipantId>,
    host: Option<ParticipantId>,
}

impl Room {
    pub fn new(id: RoomId, capacity: usize) -> Self {
        Self {
            id,
            capacity,
            members: Vec::with_capacity(capacity),
            host: None,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn members(&self) -> &[ParticipantId] {
        &self.members
    }

    pub fn host(&self) -> Option<ParticipantId> {
        self.host
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.members.contains(participant)
    }

    /// Capacity check and insertion in one step.
    ///
    /// Host goes to the member whose join created the room, or to the first
    /// joiner after the previous host left, so a room never holds two hosts.
    pub fn admit(&mut self, participant: ParticipantId) -> Result<Admission, HubError> {
        if self.contains(&participant) {
            return Err(HubError::Join(format!(
                "{} is already a member of {}",
                participant, self.id
            )));
        }
        if self.is_full() {
            return Err(HubError::RoomFull(self.id.clone()));
        }

        let existing_peers = self.members.clone();
        self.members.push(participant);

        let host = self.host.is_none();
        if host {
            self.host = Some(participant);
        }

        Ok(Admission {
            existing_peers,
            host,
        })
    }

    /// Returns false if the participant was not a member.
    pub fn remove(&mut self, participant: &ParticipantId) -> bool {
        let before = self.members.len();
        self.members.retain(|id| id != participant);

        if self.host.as_ref() == Some(participant) {
            self.host = None;
        }

        self.members.len() != before
    }
}
