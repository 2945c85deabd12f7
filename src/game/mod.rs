//! Live match session modules

pub mod registry;
pub mod room;
pub mod snapshot;

pub use registry::{JoinError, MatchRegistry};
pub use room::{MatchState, Phase, PlayerState};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ws::protocol::ServerMsg;

/// Opaque id for one WebSocket connection, assigned at accept time.
/// Player bookkeeping is keyed by this instead of the transport object.
pub type ConnId = Uuid;

/// Outbound channel to one connection's writer task
pub type Tx = mpsc::UnboundedSender<ServerMsg>;
