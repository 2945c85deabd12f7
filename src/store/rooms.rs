//! Room directory - room metadata independent of live match state
//!
//! The directory only backs the create/join HTTP endpoints; the match
//! registry never reads it. A WebSocket join with an unknown code still
//! creates a live room, matching the original server's behavior.

use dashmap::DashMap;
use rand::Rng;
use serde::Serialize;

/// Room metadata, persisted for the process lifetime
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub code: String,
    pub name: String,
    pub is_private: bool,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

/// Directory of created rooms, keyed by code
pub struct RoomDirectory {
    rooms: DashMap<String, Room>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Create a room with a fresh 6-digit code
    pub fn create(&self, name: String, is_private: bool, password: Option<String>) -> Room {
        let code = loop {
            let candidate = generate_room_code();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let room = Room {
            code: code.clone(),
            name,
            is_private,
            password,
        };
        self.rooms.insert(code, room.clone());
        room
    }

    pub fn get(&self, code: &str) -> Option<Room> {
        self.rooms.get(code).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_room_code() -> String {
    let mut rng = rand::thread_rng();
    (0..6).map(|_| char::from(b'0' + rng.gen_range(0..10))).collect()
}
