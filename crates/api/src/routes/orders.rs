//! Route definitions for orders.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::orders;
use crate::state::AppState;

/// Customer routes mounted at `/orders`.
///
/// ```text
/// POST /               -> create_order
/// GET  /               -> list_my_orders
/// GET  /{id}           -> get_order
/// POST /{id}/cancel    -> cancel_order
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create_order).get(orders::list_my_orders))
        .route("/{id}", get(orders::get_order))
        .route("/{id}/cancel", post(orders::cancel_order))
}

/// Admin routes mounted at `/admin/orders`.
///
/// ```text
/// GET /               -> admin_list_orders
/// PUT /{id}/status    -> update_order_status
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::admin_list_orders))
        .route("/{id}/status", put(orders::update_order_status))
}
