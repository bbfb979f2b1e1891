use axum::routing::post;
use axum::Router;

use crate::handlers::push;
use crate::state::AppState;

/// Routes mounted at `/push`.
///
/// ```text
/// POST   /subscriptions   -> subscribe
/// DELETE /subscriptions   -> unsubscribe
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/subscriptions",
        post(push::subscribe).delete(push::unsubscribe),
    )
}

/// Admin routes mounted at `/admin/push`.
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/broadcast", post(push::broadcast))
}
