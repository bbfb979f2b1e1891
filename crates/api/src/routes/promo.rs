use axum::routing::post;
use axum::Router;

use crate::handlers::promo;
use crate::state::AppState;

/// Routes mounted at `/promo`.
pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(promo::validate_promo))
}
