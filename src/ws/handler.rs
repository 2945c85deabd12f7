//! WebSocket upgrade handler and per-connection session loop

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::ConnId;
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Maximum nickname length after trimming
const MAX_NICK_LEN: usize = 18;

/// Query parameters for a WebSocket join
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Room code to join (required)
    pub code: Option<String>,
    /// Display nickname (trimmed, capped, defaulted)
    pub nick: Option<String>,
    /// Cosmetic character tag, opaque to the server
    #[serde(rename = "char")]
    pub character: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    // A join without a room code is rejected before the upgrade
    let Some(code) = query.code.map(|c| c.trim().to_owned()).filter(|c| !c.is_empty()) else {
        warn!("WebSocket join without room code");
        return (StatusCode::BAD_REQUEST, "Missing room code").into_response();
    };

    let nick = normalize_nick(query.nick.as_deref());
    let character = query
        .character
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "bird".to_string());

    ws.on_upgrade(move |socket| handle_socket(socket, code, nick, character, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(
    socket: WebSocket,
    code: String,
    nick: String,
    character: String,
    state: AppState,
) {
    let conn: ConnId = Uuid::new_v4();
    info!(room = %code, conn = %conn, nick = %nick, "New WebSocket connection");

    let (mut ws_sink, mut ws_stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMsg>();

    // Writer task: outbound channel -> WebSocket. Ends when every sender
    // is dropped, closing the socket.
    let writer_conn = conn;
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(conn = %writer_conn, error = %e, "WebSocket send failed");
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    if let Err(err) = state
        .registry
        .join(&code, conn, nick, character, tx.clone())
    {
        warn!(room = %code, conn = %conn, reason = %err, "Join rejected");
        let _ = tx.send(ServerMsg::Error {
            reason: err.reason(),
            message: err.to_string(),
        });
        // Dropping the sender flushes the error and closes the socket
        drop(tx);
        let _ = writer.await;
        return;
    }

    let rate_limiter = ConnectionRateLimiter::new();

    // Reader loop: WebSocket -> registry. Malformed or unknown messages
    // are dropped silently; they never terminate the connection.
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(conn = %conn, "Rate limited inbound message");
                    continue;
                }
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => dispatch(&state, &code, conn, msg),
                    Err(e) => {
                        debug!(conn = %conn, error = %e, "Ignoring malformed message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                debug!(conn = %conn, "Ignoring binary message");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                debug!(conn = %conn, "Client initiated close");
                break;
            }
            Err(e) => {
                debug!(conn = %conn, error = %e, "WebSocket error");
                break;
            }
        }
    }

    state.registry.leave(&code, conn);
    writer.abort();
    info!(room = %code, conn = %conn, "WebSocket connection closed");
}

/// Route one inbound message to its registry operation
fn dispatch(state: &AppState, code: &str, conn: ConnId, msg: ClientMsg) {
    match msg {
        ClientMsg::UpdatePosition { y } => state.registry.update_position(code, conn, y),
        ClientMsg::Start => state.registry.start(code, conn),
        ClientMsg::Ready { ready } => state.registry.ready(code, conn, ready),
        ClientMsg::Dead => state.registry.dead(code, conn),
        ClientMsg::Restart => state.registry.restart(code, conn),
    }
}

/// Trim, cap to 18 chars, default when empty
fn normalize_nick(raw: Option<&str>) -> String {
    let trimmed = raw.unwrap_or_default().trim();
    if trimmed.is_empty() {
        return "Player".to_string();
    }
    trimmed.chars().take(MAX_NICK_LEN).collect()
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::normalize_nick;

    #[test]
    fn nickname_normalization() {
        assert_eq!(normalize_nick(None), "Player");
        assert_eq!(normalize_nick(Some("   ")), "Player");
        assert_eq!(normalize_nick(Some("  Alice  ")), "Alice");
        assert_eq!(
            normalize_nick(Some("abcdefghijklmnopqrstuvwxyz")),
            "abcdefghijklmnopqr"
        );
    }
}
