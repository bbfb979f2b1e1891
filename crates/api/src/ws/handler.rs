use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use pausedej_core::error::CoreError;
use serde::Deserialize;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::ws::manager::{WsIdentity, WsManager};

/// Browsers cannot set headers on a WebSocket handshake, so the access
/// token travels in the query string.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// GET /api/v1/ws
///
/// Upgrade to a WebSocket. An invalid token is rejected with 401 before
/// the upgrade; no token gives an anonymous connection.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> AppResult<impl IntoResponse> {
    let identity = match params.token.as_deref() {
        Some(token) => {
            let claims = validate_token(token, &state.config.jwt).map_err(|_| {
                AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
            })?;
            Some(WsIdentity {
                user_id: claims.sub,
                is_admin: claims.role == pausedej_core::roles::ROLE_ADMIN,
            })
        }
        None => None,
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, identity)))
}

/// Drive one connection: forward manager messages to the socket and watch
/// the inbound stream for close.
async fn handle_socket(
    socket: WebSocket,
    ws_manager: Arc<WsManager>,
    identity: Option<WsIdentity>,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let user_id = identity.map(|i| i.user_id);
    tracing::info!(conn_id = %conn_id, ?user_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), identity).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // The feed is one-way; inbound frames other than Close/Pong are ignored.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
