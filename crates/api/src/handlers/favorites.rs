//! Handlers for the signed-in customer's favorite dishes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pausedej_core::error::CoreError;
use pausedej_core::types::DbId;
use pausedej_db::repositories::{DishRepo, FavoriteRepo};
use pausedej_events::bus::EVENT_FAVORITE_CHANGED;
use pausedej_events::{ChangeAction, StoreEvent};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/favorites
pub async fn list_favorites(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let dishes = FavoriteRepo::list_dishes(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: dishes }))
}

/// PUT /api/v1/favorites/{dish_id}
///
/// Idempotent: favoriting a dish twice returns the existing favorite.
pub async fn add_favorite(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(dish_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if DishRepo::find_by_id(&state.pool, dish_id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Dish",
            id: dish_id,
        }));
    }

    let favorite = FavoriteRepo::add(&state.pool, user.user_id, dish_id).await?;

    tracing::debug!(user_id = user.user_id, dish_id, "Favorite added");
    state.event_bus.publish(
        StoreEvent::new(EVENT_FAVORITE_CHANGED, "favorites", ChangeAction::Insert, favorite.id)
            .with_actor(user.user_id)
            .with_payload(json!({ "user_id": user.user_id, "dish_id": dish_id })),
    );

    Ok(Json(DataResponse { data: favorite }))
}

/// DELETE /api/v1/favorites/{dish_id}
pub async fn remove_favorite(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(dish_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let Some(favorite_id) = FavoriteRepo::remove(&state.pool, user.user_id, dish_id).await? else {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Favorite",
            id: dish_id,
        }));
    };

    tracing::debug!(user_id = user.user_id, dish_id, "Favorite removed");
    state.event_bus.publish(
        StoreEvent::new(EVENT_FAVORITE_CHANGED, "favorites", ChangeAction::Delete, favorite_id)
            .with_actor(user.user_id)
            .with_payload(json!({ "user_id": user.user_id, "dish_id": dish_id })),
    );

    Ok(StatusCode::NO_CONTENT)
}
