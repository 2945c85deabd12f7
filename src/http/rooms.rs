//! Room directory endpoints
//!
//! These only hand out the code the client passes into the WebSocket
//! URL; live match state is created by the first WebSocket join.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use tracing::info;

use crate::app::AppState;
use crate::http::routes::AppError;
use crate::store::Room;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    pub password: Option<String>,
}

/// `POST /api/rooms` - create a room, returns metadata with a fresh code
pub async fn create_room_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    let name = req.name.trim().to_owned();
    if name.is_empty() {
        return Err(AppError::BadRequest("Room name is required".to_string()));
    }
    if req.is_private && req.password.as_deref().unwrap_or("").is_empty() {
        return Err(AppError::BadRequest(
            "Private rooms require a password".to_string(),
        ));
    }

    let room = state.rooms.create(name, req.is_private, req.password);
    info!(room = %room.code, "Room created");
    Ok((StatusCode::CREATED, Json(room)))
}

#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    pub code: String,
    pub password: Option<String>,
}

/// `POST /api/rooms/join` - look up a room by code, checking the password
/// for private rooms
pub async fn join_room_handler(
    State(state): State<AppState>,
    Json(req): Json<JoinRoomRequest>,
) -> Result<Json<Room>, AppError> {
    let room = state
        .rooms
        .get(req.code.trim())
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

    if room.is_private && room.password != req.password {
        return Err(AppError::Unauthorized("Invalid password".to_string()));
    }

    Ok(Json(room))
}
