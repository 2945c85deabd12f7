//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Latest vertical position of the sender's bird (trusted as-is)
    UpdatePosition { y: f32 },

    /// Host arms a round; players then toggle ready
    Start,

    /// Toggle the sender's ready flag during the starting phase
    Ready { ready: bool },

    /// The sender's bird hit an obstacle
    Dead,

    /// Host re-arms a round after it ended
    Restart,
}

/// Rejection reasons sent before the server closes a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    NickTaken,
    RoomFull,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Sent once, privately, to a newly admitted connection
    #[serde(rename_all = "camelCase")]
    Welcome {
        player_id: Uuid,
        slot: u8,
        room_code: String,
    },

    /// Sent privately before the server closes a rejected connection
    Error {
        reason: ErrorReason,
        message: String,
    },

    /// Full room snapshot, broadcast to every connection after each state change
    #[serde(rename_all = "camelCase")]
    Sync {
        players: Vec<SyncPlayer>,
        started: bool,
        starting: bool,
        start_time: Option<u64>,
        seed: u32,
        round_over: bool,
        winner_id: Option<Uuid>,
        host_id: Option<Uuid>,
    },
}

/// One player's entry in a sync snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPlayer {
    pub id: Uuid,
    pub slot: u8,
    pub y: f32,
    #[serde(rename = "char")]
    pub character: String,
    pub nick: String,
    pub ready: bool,
    pub alive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_msgs_parse_from_wire_json() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"update_position","y":182.5}"#)
            .expect("update_position should parse");
        assert!(matches!(msg, ClientMsg::UpdatePosition { y } if (y - 182.5).abs() < f32::EPSILON));

        assert!(matches!(
            serde_json::from_str::<ClientMsg>(r#"{"type":"start"}"#),
            Ok(ClientMsg::Start)
        ));
        assert!(matches!(
            serde_json::from_str::<ClientMsg>(r#"{"type":"ready","ready":true}"#),
            Ok(ClientMsg::Ready { ready: true })
        ));
        assert!(matches!(
            serde_json::from_str::<ClientMsg>(r#"{"type":"dead"}"#),
            Ok(ClientMsg::Dead)
        ));
        assert!(matches!(
            serde_json::from_str::<ClientMsg>(r#"{"type":"restart"}"#),
            Ok(ClientMsg::Restart)
        ));
    }

    #[test]
    fn unknown_message_type_fails_to_parse() {
        assert!(serde_json::from_str::<ClientMsg>(r#"{"type":"sparkle"}"#).is_err());
        assert!(serde_json::from_str::<ClientMsg>("not json at all").is_err());
    }

    #[test]
    fn welcome_uses_client_field_names() {
        let id = Uuid::new_v4();
        let msg = ServerMsg::Welcome {
            player_id: id,
            slot: 1,
            room_code: "123456".to_string(),
        };
        let value = serde_json::to_value(&msg).expect("serialize welcome");
        assert_eq!(value["type"], "welcome");
        assert_eq!(value["playerId"], id.to_string());
        assert_eq!(value["slot"], 1);
        assert_eq!(value["roomCode"], "123456");
    }

    #[test]
    fn sync_uses_client_field_names() {
        let player_id = Uuid::new_v4();
        let msg = ServerMsg::Sync {
            players: vec![SyncPlayer {
                id: player_id,
                slot: 2,
                y: 320.0,
                character: "bird".to_string(),
                nick: "Alice".to_string(),
                ready: false,
                alive: true,
            }],
            started: false,
            starting: true,
            start_time: None,
            seed: 42,
            round_over: false,
            winner_id: None,
            host_id: Some(player_id),
        };
        let value = serde_json::to_value(&msg).expect("serialize sync");
        assert_eq!(value["type"], "sync");
        assert_eq!(value["starting"], true);
        assert_eq!(value["startTime"], serde_json::Value::Null);
        assert_eq!(value["roundOver"], false);
        assert_eq!(value["winnerId"], serde_json::Value::Null);
        assert_eq!(value["hostId"], player_id.to_string());
        assert_eq!(value["players"][0]["char"], "bird");
        assert_eq!(value["players"][0]["nick"], "Alice");
        assert_eq!(value["players"][0]["slot"], 2);
    }

    #[test]
    fn error_reason_is_snake_case() {
        let msg = ServerMsg::Error {
            reason: ErrorReason::NickTaken,
            message: "Nickname is already taken in this room".to_string(),
        };
        let value = serde_json::to_value(&msg).expect("serialize error");
        assert_eq!(value["type"], "error");
        assert_eq!(value["reason"], "nick_taken");
    }
}
