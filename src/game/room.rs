//! Per-room match state and round lifecycle transitions
//!
//! All methods here are pure state mutation; broadcasting is the
//! registry's job so that every mutation and its fan-out happen under
//! one lock acquisition.

use std::collections::HashMap;

use rand::Rng;
use uuid::Uuid;

use crate::util::time::unix_millis;

use super::{ConnId, Tx};

/// Maximum players per room; slots are lanes 1..=4 on the client
pub const MAX_PLAYERS: usize = 4;

/// Vertical spawn position (canvas midpoint on the client)
pub const SPAWN_Y: f32 = 320.0;

/// Countdown between all-ready and the run actually starting
pub const COUNTDOWN_MS: u64 = 3_000;

/// Round lifecycle phase.
///
/// `Lobby` is only reachable as the initial state; once a round has been
/// armed the machine cycles Starting -> Playing -> RoundOver -> Starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No round armed yet (before the first start)
    Lobby,
    /// Host armed a round, players toggling ready
    Starting,
    /// All players readied; countdown anchor in epoch millis
    Playing { start_time: u64 },
    /// At most one survivor remained
    RoundOver { winner: Option<Uuid> },
}

/// One player's authoritative state, created on admission
#[derive(Debug)]
pub struct PlayerState {
    /// Wire-visible identity, stable for the connection's lifetime
    pub id: Uuid,
    /// Lane assignment in 1..=4, lowest free at join time
    pub slot: u8,
    /// Last client-reported vertical position (trusted)
    pub y: f32,
    pub character: String,
    pub nick: String,
    pub ready: bool,
    pub alive: bool,
    /// Outbound channel to this player's socket writer
    pub tx: Tx,
}

/// Live session for one room code
pub struct MatchState {
    pub code: String,
    /// Connection currently designated host; never dangling while
    /// players remain
    pub host: ConnId,
    pub players: HashMap<ConnId, PlayerState>,
    pub phase: Phase,
    /// Shared by all clients to generate identical obstacle layouts
    pub seed: u32,
}

impl MatchState {
    pub fn new(code: String, host: ConnId) -> Self {
        Self {
            code,
            host,
            players: HashMap::new(),
            phase: Phase::Lobby,
            seed: generate_seed(),
        }
    }

    /// Case-insensitive nickname collision check against current players
    pub fn nick_taken(&self, nick: &str) -> bool {
        let wanted = nick.trim().to_lowercase();
        self.players
            .values()
            .any(|p| p.nick.trim().to_lowercase() == wanted)
    }

    /// Lowest unused slot in 1..=4, or None when the room is full
    pub fn free_slot(&self) -> Option<u8> {
        (1..=MAX_PLAYERS as u8).find(|slot| self.players.values().all(|p| p.slot != *slot))
    }

    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.alive).count()
    }

    /// Re-arm a round: shared effect of `start` and `restart`.
    /// Idempotent when already `Starting`.
    pub fn arm_round(&mut self) {
        for player in self.players.values_mut() {
            player.ready = false;
            player.alive = true;
            player.y = SPAWN_Y;
        }
        self.seed = generate_seed();
        self.phase = Phase::Starting;
    }

    /// All current players readied (vacuously false for an empty room)
    pub fn all_ready(&self) -> bool {
        !self.players.is_empty() && self.players.values().all(|p| p.ready)
    }

    /// Transition Starting -> Playing: fresh seed, countdown anchored
    /// 3 seconds out, everyone alive at the spawn position.
    pub fn begin_playing(&mut self) {
        for player in self.players.values_mut() {
            player.alive = true;
            player.y = SPAWN_Y;
        }
        self.seed = generate_seed();
        self.phase = Phase::Playing {
            start_time: unix_millis() + COUNTDOWN_MS,
        };
    }

    /// End the round if at most one player is still alive. Only fires
    /// while `Playing`; the winner is the sole survivor, or nobody.
    pub fn resolve_round_if_over(&mut self) -> bool {
        if !matches!(self.phase, Phase::Playing { .. }) {
            return false;
        }
        if self.alive_count() > 1 {
            return false;
        }
        let winner = self.players.values().find(|p| p.alive).map(|p| p.id);
        self.phase = Phase::RoundOver { winner };
        true
    }

    /// Player id of the current host connection
    pub fn host_player_id(&self) -> Option<Uuid> {
        self.players.get(&self.host).map(|p| p.id)
    }
}

/// Random 31-bit seed, regenerated each time a round is (re)armed
fn generate_seed() -> u32 {
    rand::thread_rng().gen_range(0..1u32 << 31)
}
