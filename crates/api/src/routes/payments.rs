//! Route definitions for Stripe payments.

use axum::routing::post;
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// POST /intent    -> create_intent (requires auth)
/// POST /webhook   -> stripe_webhook (Stripe-Signature)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/intent", post(payments::create_intent))
        .route("/webhook", post(payments::stripe_webhook))
}
