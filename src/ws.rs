//! WebSocket scoring channel.
//!
//! Clients connect to `/ws/{id}` and send JSON-encoded profile inputs; each
//! message is validated and scored synchronously and the JSON score result
//! is sent back before the next message is awaited. One request in flight
//! per connection, no queue, no retries. Fatal failures close the channel
//! with a close code and reason instead of an in-band error payload.

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::handlers::AppState;
use crate::validation::ProfileInput;

/// Close codes for the scoring channel.
const CLOSE_MALFORMED: u16 = 1007;
const CLOSE_VALIDATION: u16 = 1008;
const CLOSE_INTERNAL: u16 = 1011;

/// Scoped per-connection session. Dropped deterministically when the
/// connection handler returns, on any exit path.
struct WsSession {
    user_id: i64,
}

impl WsSession {
    fn open(user_id: i64) -> Self {
        info!(user_id, "WebSocket session opened");
        Self { user_id }
    }
}

impl Drop for WsSession {
    fn drop(&mut self) {
        info!(user_id = self.user_id, "WebSocket session closed");
    }
}

/// Axum handler for the WebSocket upgrade request.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, user_id, state))
}

/// Per-connection loop: block awaiting the next inbound message, validate
/// and score it, send the response, repeat. Cancellation is connection
/// closure.
async fn handle_connection(mut socket: WebSocket, user_id: i64, state: Arc<AppState>) {
    let _session = WsSession::open(user_id);

    while let Some(msg) = socket.recv().await {
        match msg {
            Ok(Message::Text(text)) => {
                let input: ProfileInput = match serde_json::from_str(&text) {
                    Ok(input) => input,
                    Err(e) => {
                        debug!(user_id, error = %e, "malformed WebSocket payload");
                        close(socket, CLOSE_MALFORMED, format!("malformed payload: {}", e)).await;
                        return;
                    }
                };

                let profile = match input.validate() {
                    Ok(profile) => profile,
                    Err(e) => {
                        debug!(user_id, error = %e, "WebSocket payload failed validation");
                        close(socket, CLOSE_VALIDATION, format!("validation failed: {}", e))
                            .await;
                        return;
                    }
                };

                let result = state.engine.score(&profile);
                let json = match serde_json::to_string(&result) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(user_id, error = %e, "failed to serialize score result");
                        close(socket, CLOSE_INTERNAL, "internal error".to_string()).await;
                        return;
                    }
                };

                if let Err(e) = socket.send(Message::Text(json)).await {
                    debug!(user_id, error = %e, "WebSocket send failed, disconnecting");
                    return;
                }
            }
            Ok(Message::Ping(data)) => {
                if socket.send(Message::Pong(data)).await.is_err() {
                    return;
                }
            }
            Ok(Message::Pong(_)) => {
                debug!(user_id, "WebSocket Pong received");
            }
            Ok(Message::Close(_)) => {
                debug!(user_id, "WebSocket Close frame received");
                return;
            }
            Ok(Message::Binary(_)) => {
                debug!(user_id, "WebSocket binary message ignored");
            }
            Err(e) => {
                warn!(user_id, error = %e, "WebSocket receive error, disconnecting");
                return;
            }
        }
    }
}

/// Close-frame payloads are capped at 125 bytes by the protocol, 123 after
/// the code; longer reasons would fail to send at all.
const CLOSE_REASON_MAX: usize = 123;

/// Best-effort close with an application-defined code and reason.
async fn close(mut socket: WebSocket, code: u16, mut reason: String) {
    if reason.len() > CLOSE_REASON_MAX {
        let mut end = CLOSE_REASON_MAX;
        while !reason.is_char_boundary(end) {
            end -= 1;
        }
        reason.truncate(end);
    }
    let frame = CloseFrame {
        code,
        reason: Cow::Owned(reason),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        debug!(error = %e, "failed to send close frame");
    }
}
