use axum::routing::get;
use axum::Router;

use crate::handlers::recommendations;
use crate::state::AppState;

/// Routes mounted at `/recommendations`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(recommendations::get_recommendations))
}
