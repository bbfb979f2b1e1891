//! Route definitions for dishes.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::dishes;
use crate::state::AppState;

/// Public routes mounted at `/dishes`.
///
/// ```text
/// GET /       -> list_dishes
/// GET /{id}   -> get_dish
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dishes::list_dishes))
        .route("/{id}", get(dishes::get_dish))
}

/// Admin routes mounted at `/admin/dishes`.
///
/// ```text
/// POST   /       -> create_dish
/// PUT    /{id}   -> update_dish
/// DELETE /{id}   -> delete_dish
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(dishes::create_dish))
        .route("/{id}", put(dishes::update_dish).delete(dishes::delete_dish))
}
