//! Room manager: active pairings and the connection-to-room index.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::error::RoomError;
use super::registry::ConnectionId;

/// Identifier of an active pairing, derived deterministically from the two
/// member ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Order-independent derivation: both members produce the same id
    /// regardless of which side triggered the match.
    pub fn derive(a: ConnectionId, b: ConnectionId) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("room-{lo}-{hi}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owns the room map and the reverse (member -> room) index.
///
/// The two maps are only ever mutated together: a room is created with both
/// index entries and destroyed with both. A room never has fewer than two
/// members; losing one member tears the whole room down.
#[derive(Debug, Default)]
pub struct RoomManager {
    rooms: HashMap<RoomId, [ConnectionId; 2]>,
    member_index: HashMap<ConnectionId, RoomId>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room for two distinct, currently unpaired connections.
    pub fn create_room(
        &mut self,
        a: ConnectionId,
        b: ConnectionId,
    ) -> Result<RoomId, RoomError> {
        if a == b {
            return Err(RoomError::SelfPair(a));
        }
        for id in [a, b] {
            if let Some(existing) = self.member_index.get(&id) {
                return Err(RoomError::AlreadyPaired(id, existing.clone()));
            }
        }

        let room_id = RoomId::derive(a, b);
        self.rooms.insert(room_id.clone(), [a, b]);
        self.member_index.insert(a, room_id.clone());
        self.member_index.insert(b, room_id.clone());
        Ok(room_id)
    }

    pub fn room_of(&self, id: ConnectionId) -> Option<&RoomId> {
        self.member_index.get(&id)
    }

    /// The counterpart of `id` in `room_id`, or `None` if `id` is not
    /// actually a member.
    pub fn other_member(&self, room_id: &RoomId, id: ConnectionId) -> Option<ConnectionId> {
        let [a, b] = *self.rooms.get(room_id)?;
        if a == id {
            Some(b)
        } else if b == id {
            Some(a)
        } else {
            None
        }
    }

    /// Destroy a room and both index entries. Idempotent: the disconnect
    /// and explicit-leave paths may race.
    pub fn destroy_room(&mut self, room_id: &RoomId) {
        if let Some(members) = self.rooms.remove(room_id) {
            for id in members {
                self.member_index.remove(&id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_is_order_independent() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        assert_eq!(RoomId::derive(a, b), RoomId::derive(b, a));
    }

    #[test]
    fn test_create_room_indexes_both_members() {
        let mut rooms = RoomManager::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        let room_id = rooms.create_room(a, b).unwrap();

        assert_eq!(rooms.room_of(a), Some(&room_id));
        assert_eq!(rooms.room_of(b), Some(&room_id));
        assert_eq!(rooms.len(), 1);
    }

    #[test]
    fn test_other_member_returns_counterpart() {
        let mut rooms = RoomManager::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let room_id = rooms.create_room(a, b).unwrap();

        assert_eq!(rooms.other_member(&room_id, a), Some(b));
        assert_eq!(rooms.other_member(&room_id, b), Some(a));
    }

    #[test]
    fn test_other_member_of_non_member_is_none() {
        let mut rooms = RoomManager::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let stranger = ConnectionId::new();
        let room_id = rooms.create_room(a, b).unwrap();

        assert_eq!(rooms.other_member(&room_id, stranger), None);
    }

    #[test]
    fn test_create_room_with_paired_member_is_refused() {
        let mut rooms = RoomManager::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let c = ConnectionId::new();
        let room_id = rooms.create_room(a, b).unwrap();

        let result = rooms.create_room(a, c);

        assert_eq!(result, Err(RoomError::AlreadyPaired(a, room_id)));
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms.room_of(c), None);
    }

    #[test]
    fn test_create_room_with_self_is_refused() {
        let mut rooms = RoomManager::new();
        let a = ConnectionId::new();

        assert_eq!(rooms.create_room(a, a), Err(RoomError::SelfPair(a)));
        assert!(rooms.is_empty());
    }

    #[test]
    fn test_destroy_room_removes_both_index_entries() {
        let mut rooms = RoomManager::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let room_id = rooms.create_room(a, b).unwrap();

        rooms.destroy_room(&room_id);

        assert!(rooms.is_empty());
        assert_eq!(rooms.room_of(a), None);
        assert_eq!(rooms.room_of(b), None);
    }

    #[test]
    fn test_destroy_room_is_idempotent() {
        let mut rooms = RoomManager::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let room_id = rooms.create_room(a, b).unwrap();

        rooms.destroy_room(&room_id);
        rooms.destroy_room(&room_id);

        assert!(rooms.is_empty());
    }
}
