//! Sync snapshot construction
//!
//! Every state change is followed by one full snapshot; there are no
//! deltas, coalescing, or sequence numbers. Rooms hold at most four
//! players, so the identical payload goes to every connection.

use crate::ws::protocol::{ServerMsg, SyncPlayer};

use super::room::{MatchState, Phase};

/// Build the full `sync` snapshot for a room.
///
/// The redundant `started`/`starting`/`round_over` booleans are views of
/// `phase`, kept for wire compatibility with the original client.
pub fn build_sync(state: &MatchState) -> ServerMsg {
    let players: Vec<SyncPlayer> = state
        .players
        .values()
        .map(|p| SyncPlayer {
            id: p.id,
            slot: p.slot,
            y: p.y,
            character: p.character.clone(),
            nick: p.nick.clone(),
            ready: p.ready,
            alive: p.alive,
        })
        .collect();

    let (started, starting, start_time, round_over, winner_id) = match state.phase {
        Phase::Lobby => (false, false, None, false, None),
        Phase::Starting => (false, true, None, false, None),
        Phase::Playing { start_time } => (true, false, Some(start_time), false, None),
        Phase::RoundOver { winner } => (true, false, None, true, winner),
    };

    ServerMsg::Sync {
        players,
        started,
        starting,
        start_time,
        seed: state.seed,
        round_over,
        winner_id,
        host_id: state.host_player_id(),
    }
}
