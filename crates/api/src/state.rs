use std::sync::Arc;

use pausedej_payments::PaymentGateway;

use crate::config::ServerConfig;
use crate::notifications::Notifier;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: pausedej_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Browser WebSocket connections receiving change notifications.
    pub ws_manager: Arc<WsManager>,
    /// Publishes store change events to the realtime broadcaster and the
    /// notification dispatcher.
    pub event_bus: Arc<pausedej_events::EventBus>,
    /// Email, SMS and push senders plus the message templates.
    pub notifier: Arc<Notifier>,
    /// `None` when Stripe is not configured.
    pub payments: Option<Arc<dyn PaymentGateway>>,
    /// Secret for `Stripe-Signature` verification; `None` disables the webhook.
    pub stripe_webhook_secret: Option<String>,
}
