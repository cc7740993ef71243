//! Room descriptors for the session layer.
//!
//! A room binds a match to its participants: two player slots, an ordered
//! spectator list, a status, and lobby metadata (privacy, optional time
//! limit). Room descriptors arrive from the room/session provider and are
//! carried verbatim; the engine only creates them locally for hotseat
//! play. The wire protocol that populates rooms in multiplayer is an
//! external concern.

use crate::storage;
use crate::types::{Color, GameStatus};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// The two player slots of a room. A missing entry is an open seat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPlayers {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub white: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub black: Option<String>,
}

impl RoomPlayers {
    /// Returns the identity seated on the given color, if any.
    pub fn get(&self, color: Color) -> Option<&str> {
        match color {
            Color::White => self.white.as_deref(),
            Color::Black => self.black.as_deref(),
        }
    }
}

/// A room descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Opaque identifier. Locally created rooms get a UUID v4; provider
    /// ids are used verbatim.
    pub id: String,
    pub name: String,
    pub players: RoomPlayers,
    /// Ordered, duplicate-free list of spectator identities.
    #[serde(default)]
    pub spectators: Vec<String>,
    pub status: GameStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub time_limit: Option<Duration>,
    pub is_private: bool,
    /// Unix timestamp (seconds) of room creation.
    pub created_at: u64,
}

impl Room {
    /// Creates a fresh local room in `waiting` status.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            players: RoomPlayers::default(),
            spectators: Vec::new(),
            status: GameStatus::Waiting,
            time_limit: None,
            is_private: false,
            created_at: storage::unix_timestamp(),
        }
    }

    /// Returns the identity seated on the given color, if any.
    pub fn player(&self, color: Color) -> Option<&str> {
        self.players.get(color)
    }

    /// Seats a player on a color, replacing any previous occupant.
    pub fn seat_player(&mut self, color: Color, name: impl Into<String>) {
        let slot = match color {
            Color::White => &mut self.players.white,
            Color::Black => &mut self.players.black,
        };
        *slot = Some(name.into());
    }

    /// Adds a spectator. Re-adding the same identity is a no-op, so the
    /// list stays duplicate-free and keeps arrival order.
    pub fn add_spectator(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.spectators.iter().any(|s| *s == name) {
            self.spectators.push(name);
        }
    }

    /// `true` once both seats are taken.
    pub fn is_full(&self) -> bool {
        self.players.white.is_some() && self.players.black.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_room_is_open_and_waiting() {
        let room = Room::new("beginners");
        assert_eq!(room.name, "beginners");
        assert_eq!(room.status, GameStatus::Waiting);
        assert!(!room.is_full());
        assert!(!room.id.is_empty());
    }

    #[test]
    fn test_seating_fills_the_room() {
        let mut room = Room::new("club");
        room.seat_player(Color::White, "alice");
        assert!(!room.is_full());
        room.seat_player(Color::Black, "bob");
        assert!(room.is_full());
        assert_eq!(room.player(Color::White), Some("alice"));
        assert_eq!(room.player(Color::Black), Some("bob"));
    }

    #[test]
    fn test_spectators_stay_duplicate_free() {
        let mut room = Room::new("club");
        room.add_spectator("carol");
        room.add_spectator("dave");
        room.add_spectator("carol");
        assert_eq!(room.spectators, vec!["carol", "dave"]);
    }

    #[test]
    fn test_room_serde_roundtrip() {
        let mut room = Room::new("club");
        room.seat_player(Color::White, "alice");
        room.time_limit = Some(Duration::from_secs(600));
        let json = serde_json::to_string(&room).unwrap();
        assert!(json.contains("\"isPrivate\""));
        assert!(json.contains("\"createdAt\""));
        let back: Room = serde_json::from_str(&json).unwrap();
        assert_eq!(back, room);
    }
}
