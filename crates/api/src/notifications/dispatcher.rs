//! Order-status notifications.
//!
//! [`OrderNotificationDispatcher`] listens for `order.status_changed` events
//! and hands each one to the [`Notifier`]. Sends happen off the request
//! path, so a slow provider never delays the status update itself.

use std::sync::Arc;

use pausedej_core::order::OrderStatus;
use pausedej_db::DbPool;
use pausedej_events::bus::EVENT_ORDER_STATUS_CHANGED;
use pausedej_events::StoreEvent;
use tokio::sync::broadcast;

use super::Notifier;

/// Routes order-status events to customer notifications.
pub struct OrderNotificationDispatcher {
    pool: DbPool,
    notifier: Arc<Notifier>,
}

impl OrderNotificationDispatcher {
    pub fn new(pool: DbPool, notifier: Arc<Notifier>) -> Self {
        Self { pool, notifier }
    }

    /// Consume events until the bus closes.
    pub async fn run(self, mut receiver: broadcast::Receiver<StoreEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let Some(status) = target_status(&event) else {
                        continue;
                    };
                    if let Err(e) = self
                        .notifier
                        .notify_order_status(&self.pool, event.entity_id, status)
                        .await
                    {
                        tracing::error!(
                            error = %e,
                            order_id = event.entity_id,
                            "Failed to send order notifications"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification dispatcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification dispatcher shutting down");
                    break;
                }
            }
        }
    }
}

/// Status an event moved an order to, if it is a status change.
fn target_status(event: &StoreEvent) -> Option<OrderStatus> {
    if event.event_type != EVENT_ORDER_STATUS_CHANGED {
        return None;
    }
    let to = event.payload.get("to").and_then(serde_json::Value::as_str)?;
    match to.parse() {
        Ok(status) => Some(status),
        Err(e) => {
            tracing::warn!(order_id = event.entity_id, error = %e, "Bad status in event");
            None
        }
    }
}
