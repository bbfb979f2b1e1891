//! Personalised dish suggestions.

use std::collections::HashMap;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use pausedej_core::error::CoreError;
use pausedej_core::recommendation::{recommend, CustomerContext, HistoryLine};
use pausedej_db::models::dish::{Dish, DishFilter};
use pausedej_db::repositories::{DishRepo, FavoriteRepo, OrderRepo, ProfileRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// A dish with the score that ranked it.
#[derive(Debug, Serialize)]
pub struct RecommendedDish {
    #[serde(flatten)]
    pub dish: Dish,
    pub score: f64,
}

/// GET /api/v1/recommendations
///
/// Available dishes ranked for the caller from their order history,
/// favorites and dietary preferences.
pub async fn get_recommendations(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let profile = ProfileRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Profile",
            id: user.user_id,
        }))?;

    // Sold-out dishes are never recommended but still anchor similarity
    // for past orders; `recommend` drops them as candidates.
    let filter = DishFilter {
        category: None,
        available_only: false,
    };
    let dishes = DishRepo::list(&state.pool, &filter).await?;
    let history = OrderRepo::history_for_user(&state.pool, user.user_id).await?;
    let favorites = FavoriteRepo::dish_ids_for_user(&state.pool, user.user_id).await?;

    let customer = CustomerContext {
        history: history
            .into_iter()
            .map(|row| HistoryLine {
                dish_id: row.dish_id,
                quantity: row.quantity,
            })
            .collect(),
        favorites: favorites.into_iter().collect(),
        dietary_preferences: profile.dietary_preferences,
    };

    let features: Vec<_> = dishes.iter().map(Dish::features).collect();
    let ranked = recommend(&features, &customer);

    let mut by_id: HashMap<_, _> = dishes.into_iter().map(|d| (d.id, d)).collect();
    let data: Vec<RecommendedDish> = ranked
        .into_iter()
        .filter_map(|scored| {
            by_id.remove(&scored.dish_id).map(|dish| RecommendedDish {
                dish,
                score: scored.score,
            })
        })
        .collect();

    tracing::debug!(
        user_id = user.user_id,
        history_lines = customer.history.len(),
        count = data.len(),
        "Recommendations computed"
    );

    Ok(Json(DataResponse { data }))
}
