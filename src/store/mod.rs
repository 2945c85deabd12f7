//! In-memory stores

pub mod rooms;

pub use rooms::{Room, RoomDirectory};
