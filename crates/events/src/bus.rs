//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Every successful write publishes a [`StoreEvent`]. Two consumers live in
//! the API crate: the realtime broadcaster, which tells WebSocket clients
//! which table changed, and the notification dispatcher, which turns order
//! status changes into emails, SMS and push notifications.

use chrono::{DateTime, Utc};
use pausedej_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// An order was placed.
pub const EVENT_ORDER_CREATED: &str = "order.created";
/// An order's fulfilment status changed. Payload: `{ "from", "to" }`.
pub const EVENT_ORDER_STATUS_CHANGED: &str = "order.status_changed";
/// An order's payment status changed. Payload: `{ "payment_status" }`.
pub const EVENT_ORDER_PAYMENT_UPDATED: &str = "order.payment_updated";
/// A dish was created, updated or deleted.
pub const EVENT_DISH_CHANGED: &str = "dish.changed";
/// A favorite was added or removed.
pub const EVENT_FAVORITE_CHANGED: &str = "favorite.changed";
/// A newsletter campaign was created or sent.
pub const EVENT_CAMPAIGN_CHANGED: &str = "campaign.changed";

// ---------------------------------------------------------------------------
// StoreEvent
// ---------------------------------------------------------------------------

/// Kind of row change, mirroring the database operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

/// A row change in the store.
///
/// Constructed via [`StoreEvent::new`] and enriched with
/// [`with_actor`](StoreEvent::with_actor) and
/// [`with_payload`](StoreEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEvent {
    /// Dot-separated event name, e.g. `"order.status_changed"`.
    pub event_type: String,

    /// Table the changed row belongs to.
    pub table: String,

    pub action: ChangeAction,

    /// Primary key of the changed row.
    pub entity_id: DbId,

    /// User that made the change, if any.
    pub actor_user_id: Option<DbId>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl StoreEvent {
    pub fn new(
        event_type: impl Into<String>,
        table: impl Into<String>,
        action: ChangeAction,
        entity_id: DbId,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            table: table.into(),
            action,
            entity_id,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest events are dropped and slow
/// receivers observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: StoreEvent) {
        // Ignore the SendError: it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
