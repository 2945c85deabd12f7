//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::MatchRegistry;
use crate::store::RoomDirectory;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Live rooms (room code -> match state)
    pub registry: Arc<MatchRegistry>,
    /// Room metadata behind the create/join endpoints
    pub rooms: Arc<RoomDirectory>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(MatchRegistry::new()),
            rooms: Arc::new(RoomDirectory::new()),
        }
    }
}
