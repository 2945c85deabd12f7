//! Registry of live rooms and the per-connection operations on them
//!
//! Each operation is one atomic read-modify-broadcast step: the room's
//! mutex is held from the first state read through the last channel
//! send, with no await point inside, so connection handlers on different
//! worker threads can never interleave within one room.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::ws::protocol::{ErrorReason, ServerMsg};

use super::room::{MatchState, Phase, PlayerState, SPAWN_Y};
use super::snapshot::build_sync;
use super::{ConnId, Tx};

/// Admission rejections; the connection is closed after the error message
#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("Nickname is already taken in this room")]
    NickTaken,
    #[error("Room is full")]
    RoomFull,
}

impl JoinError {
    pub fn reason(&self) -> ErrorReason {
        match self {
            JoinError::NickTaken => ErrorReason::NickTaken,
            JoinError::RoomFull => ErrorReason::RoomFull,
        }
    }
}

/// Map of room code -> live match state. Owned by `AppState`, injectable
/// so tests instantiate isolated registries.
pub struct MatchRegistry {
    rooms: DashMap<String, Arc<Mutex<MatchState>>>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Admit a connection into a room, creating the room on first join.
    ///
    /// On success the new player privately receives `welcome` and every
    /// player in the room (the new one included) receives a snapshot.
    /// Rejection happens before any `PlayerState` is created.
    pub fn join(
        &self,
        code: &str,
        conn: ConnId,
        nick: String,
        character: String,
        tx: Tx,
    ) -> Result<(), JoinError> {
        // The map entry guard is held through admission so a racing
        // last-leave cannot drop the room out from under us.
        let entry = self.rooms.entry(code.to_owned()).or_insert_with(|| {
            info!(room = %code, "Creating match state");
            Arc::new(Mutex::new(MatchState::new(code.to_owned(), conn)))
        });
        let room = Arc::clone(entry.value());
        let mut state = room.lock();

        if state.nick_taken(&nick) {
            return Err(JoinError::NickTaken);
        }
        let slot = state.free_slot().ok_or(JoinError::RoomFull)?;

        let player_id = Uuid::new_v4();
        state.players.insert(
            conn,
            PlayerState {
                id: player_id,
                slot,
                y: SPAWN_Y,
                character,
                nick,
                ready: false,
                alive: true,
                tx: tx.clone(),
            },
        );

        let _ = tx.send(ServerMsg::Welcome {
            player_id,
            slot,
            room_code: state.code.clone(),
        });
        broadcast(&state);

        info!(
            room = %code,
            player_id = %player_id,
            slot,
            player_count = state.players.len(),
            "Player joined room"
        );
        Ok(())
    }

    /// Remove a departed connection and repair the room state:
    /// host transfer, round-over recompute, all-ready re-check, and
    /// registry removal once the room is empty.
    pub fn leave(&self, code: &str, conn: ConnId) {
        let Some(room) = self.rooms.get(code).map(|r| Arc::clone(r.value())) else {
            return;
        };
        let mut state = room.lock();
        let Some(player) = state.players.remove(&conn) else {
            return;
        };
        info!(
            room = %code,
            player_id = %player.id,
            player_count = state.players.len(),
            "Player left room"
        );

        if state.players.is_empty() {
            drop(state);
            // Re-check emptiness under the map lock: a concurrent join
            // may have repopulated the room since we released it.
            self.rooms
                .remove_if(code, |_, room| room.lock().players.is_empty());
            debug!(room = %code, "Room empty, match state removed");
            return;
        }

        if state.host == conn {
            if let Some(&next_host) = state.players.keys().next() {
                state.host = next_host;
                debug!(room = %code, host_id = ?state.host_player_id(), "Host reassigned");
            }
        }

        match state.phase {
            Phase::Playing { .. } => {
                state.resolve_round_if_over();
            }
            Phase::Starting => {
                // A departure can make the remaining set unanimously ready
                if state.all_ready() {
                    state.begin_playing();
                }
            }
            _ => {}
        }

        broadcast(&state);
    }

    /// `update_position`: trusted y update, ignored for dead players and
    /// once the round is over
    pub fn update_position(&self, code: &str, conn: ConnId, y: f32) {
        self.with_room(code, |state| {
            if matches!(state.phase, Phase::RoundOver { .. }) {
                return;
            }
            let Some(player) = state.players.get_mut(&conn) else {
                return;
            };
            if !player.alive {
                return;
            }
            player.y = y;
            broadcast(state);
        });
    }

    /// `start`: host arms a round. A no-op mid-run; idempotent while
    /// already `Starting`.
    pub fn start(&self, code: &str, conn: ConnId) {
        self.with_room(code, |state| {
            if state.host != conn {
                return;
            }
            if matches!(state.phase, Phase::Playing { .. }) {
                return;
            }
            state.arm_round();
            broadcast(state);
        });
    }

    /// `ready`: set the sender's flag; when that completes unanimity
    /// during `Starting`, the round begins and a second snapshot goes out.
    pub fn ready(&self, code: &str, conn: ConnId, ready: bool) {
        self.with_room(code, |state| {
            let Some(player) = state.players.get_mut(&conn) else {
                return;
            };
            player.ready = ready;
            broadcast(state);

            if state.phase == Phase::Starting && state.all_ready() {
                state.begin_playing();
                broadcast(state);
            }
        });
    }

    /// `dead`: mark the sender dead; one or zero survivors ends the round
    pub fn dead(&self, code: &str, conn: ConnId) {
        self.with_room(code, |state| {
            if !matches!(state.phase, Phase::Playing { .. }) {
                return;
            }
            let Some(player) = state.players.get_mut(&conn) else {
                return;
            };
            player.alive = false;
            let player_id = player.id;
            if state.resolve_round_if_over() {
                info!(room = %code, player_id = %player_id, "Round over");
            }
            broadcast(state);
        });
    }

    /// `restart`: host re-arms a round from any phase
    pub fn restart(&self, code: &str, conn: ConnId) {
        self.with_room(code, |state| {
            if state.host != conn {
                return;
            }
            state.arm_round();
            broadcast(state);
        });
    }

    /// Live room count (for the health endpoint)
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Connected player count across all rooms
    pub fn player_count(&self) -> usize {
        self.rooms
            .iter()
            .map(|room| room.value().lock().players.len())
            .sum()
    }

    fn with_room(&self, code: &str, f: impl FnOnce(&mut MatchState)) {
        let Some(room) = self.rooms.get(code).map(|r| Arc::clone(r.value())) else {
            return;
        };
        let mut state = room.lock();
        f(&mut state);
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fan the current snapshot out to every connection in the room.
/// Send failures mean the receiver's writer task is gone; the disconnect
/// path cleans that player up.
fn broadcast(state: &MatchState) {
    let snapshot = build_sync(state);
    for player in state.players.values() {
        let _ = player.tx.send(snapshot.clone());
    }
}
