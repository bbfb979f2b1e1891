//! Route definitions for the newsletter.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::newsletter;
use crate::state::AppState;

/// Public routes mounted at `/newsletter`.
///
/// ```text
/// POST /subscribe     -> subscribe
/// POST /unsubscribe   -> unsubscribe
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(newsletter::subscribe))
        .route("/unsubscribe", post(newsletter::unsubscribe))
}

/// Admin routes mounted at `/admin/newsletter`.
///
/// ```text
/// GET  /campaigns              -> list_campaigns
/// POST /campaigns              -> create_campaign
/// POST /campaigns/{id}/send    -> send_campaign
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route(
            "/campaigns",
            get(newsletter::list_campaigns).post(newsletter::create_campaign),
        )
        .route("/campaigns/{id}/send", post(newsletter::send_campaign))
}
