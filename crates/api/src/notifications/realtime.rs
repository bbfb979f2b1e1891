//! Refetch-on-change feed.
//!
//! Every [`StoreEvent`] becomes a small `db_change` message. The SPA does
//! not read row data from it; it refetches the named table.

use std::sync::Arc;

use axum::extract::ws::Message;
use pausedej_core::types::DbId;
use pausedej_events::StoreEvent;
use serde_json::json;
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Tables whose rows belong to one customer. Changes to them only reach the
/// owner and admins.
const PRIVATE_TABLES: &[&str] = &["orders", "favorites", "push_subscriptions"];

/// The message sent to browsers for a change.
pub fn change_message(event: &StoreEvent) -> serde_json::Value {
    json!({
        "type": "db_change",
        "table": event.table,
        "action": event.action,
        "id": event.entity_id,
    })
}

/// Owner of the changed row, for private tables.
///
/// Handlers put the owner in `payload.user_id`; a private change without
/// one is only shown to admins.
fn owner_of(event: &StoreEvent) -> Option<DbId> {
    if !PRIVATE_TABLES.contains(&event.table.as_str()) {
        return None;
    }
    Some(
        event
            .payload
            .get("user_id")
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(DbId::MIN),
    )
}

/// Forwards bus events to WebSocket clients.
pub struct RealtimeBroadcaster {
    ws_manager: Arc<WsManager>,
}

impl RealtimeBroadcaster {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Consume events until the bus closes.
    pub async fn run(self, mut receiver: broadcast::Receiver<StoreEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.forward(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Realtime broadcaster lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, realtime broadcaster shutting down");
                    break;
                }
            }
        }
    }

    async fn forward(&self, event: &StoreEvent) {
        let message = Message::Text(change_message(event).to_string().into());
        match owner_of(event) {
            Some(owner_id) => {
                let count = self.ws_manager.send_to_owner(owner_id, message).await;
                tracing::trace!(table = %event.table, owner_id, count, "Private change sent");
            }
            None => self.ws_manager.broadcast(message).await,
        }
    }
}
