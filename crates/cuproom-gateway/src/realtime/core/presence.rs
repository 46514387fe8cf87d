use std::collections::{HashMap, HashSet};

use cuproom_core::error::{CupRoomError, Result};

use crate::realtime::types::ConnId;

/// One cupping room: its leader and current member connections.
#[derive(Debug)]
pub struct Room {
    leader_id: String,
    members: HashSet<ConnId>,
}

impl Room {
    pub fn leader_id(&self) -> &str {
        &self.leader_id
    }

    pub fn members(&self) -> impl Iterator<Item = &ConnId> {
        self.members.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Room presence: room_id -> room.
///
/// Plain maps: only the hub control loop touches this.
#[derive(Debug, Default)]
pub struct Presence {
    rooms: HashMap<String, Room>,
}

impl Presence {
    /// Open `room_id` with `conn` as its only member and `leader_id` as leader.
    pub fn create(&mut self, room_id: &str, conn: ConnId, leader_id: &str) -> Result<()> {
        if self.rooms.get(room_id).is_some_and(|r| !r.is_empty()) {
            return Err(CupRoomError::RoomExists(room_id.to_string()));
        }
        let mut members = HashSet::new();
        members.insert(conn);
        self.rooms.insert(
            room_id.to_string(),
            Room {
                leader_id: leader_id.to_string(),
                members,
            },
        );
        Ok(())
    }

    /// Add `conn` to an existing room; returns the room's leader id.
    pub fn join(&mut self, room_id: &str, conn: ConnId) -> Result<String> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| CupRoomError::RoomNotFound(room_id.to_string()))?;
        room.members.insert(conn);
        Ok(room.leader_id.clone())
    }

    /// Remove `conn` from `room_id`; an emptied room is dropped.
    /// Returns whether `conn` was a member.
    pub fn leave(&mut self, room_id: &str, conn: ConnId) -> bool {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return false;
        };
        let removed = room.members.remove(&conn);
        if room.is_empty() {
            self.rooms.remove(room_id);
        }
        removed
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn leader_of(&self, room_id: &str) -> Option<&str> {
        self.rooms.get(room_id).map(Room::leader_id)
    }

    pub fn members_of(&self, room_id: &str) -> Vec<ConnId> {
        self.rooms
            .get(room_id)
            .map(|r| r.members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn clear(&mut self) {
        self.rooms.clear();
    }
}
