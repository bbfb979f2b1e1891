use axum::routing::{get, put};
use axum::Router;

use crate::handlers::favorites;
use crate::state::AppState;

/// Routes mounted at `/favorites`.
///
/// ```text
/// GET    /             -> list_favorites
/// PUT    /{dish_id}    -> add_favorite
/// DELETE /{dish_id}    -> remove_favorite
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::list_favorites))
        .route(
            "/{dish_id}",
            put(favorites::add_favorite).delete(favorites::remove_favorite),
        )
}
