//! Handlers for the menu: public browsing and admin management.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pausedej_core::error::CoreError;
use pausedej_core::types::DbId;
use pausedej_db::models::dish::{CreateDish, DishFilter, UpdateDish};
use pausedej_db::repositories::DishRepo;
use pausedej_events::bus::EVENT_DISH_CHANGED;
use pausedej_events::{ChangeAction, StoreEvent};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::profile::normalize_tags;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

const TABLE: &str = "dishes";

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Dish", id })
}

// ---------------------------------------------------------------------------
// Public
// ---------------------------------------------------------------------------

/// GET /api/v1/dishes
///
/// List dishes, optionally filtered by `category` and `available_only`.
pub async fn list_dishes(
    State(state): State<AppState>,
    Query(filter): Query<DishFilter>,
) -> AppResult<impl IntoResponse> {
    let dishes = DishRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: dishes }))
}

/// GET /api/v1/dishes/{id}
pub async fn get_dish(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let dish = DishRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: dish }))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/dishes
pub async fn create_dish(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(mut input): Json<CreateDish>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    input.dietary_tags = normalize_tags(std::mem::take(&mut input.dietary_tags));

    let dish = DishRepo::create(&state.pool, &input).await?;

    tracing::info!(dish_id = dish.id, name = %dish.name, user_id = admin.user_id, "Dish created");
    state.event_bus.publish(
        StoreEvent::new(EVENT_DISH_CHANGED, TABLE, ChangeAction::Insert, dish.id)
            .with_actor(admin.user_id),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: dish })))
}

/// PUT /api/v1/admin/dishes/{id}
pub async fn update_dish(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateDish>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    input.dietary_tags = input.dietary_tags.take().map(normalize_tags);

    let dish = DishRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(dish_id = id, user_id = admin.user_id, "Dish updated");
    state.event_bus.publish(
        StoreEvent::new(EVENT_DISH_CHANGED, TABLE, ChangeAction::Update, id)
            .with_actor(admin.user_id),
    );

    Ok(Json(DataResponse { data: dish }))
}

/// DELETE /api/v1/admin/dishes/{id}
///
/// Past orders keep their line snapshots; favorites of the dish go with it.
pub async fn delete_dish(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !DishRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }

    tracing::info!(dish_id = id, user_id = admin.user_id, "Dish deleted");
    state.event_bus.publish(
        StoreEvent::new(EVENT_DISH_CHANGED, TABLE, ChangeAction::Delete, id)
            .with_actor(admin.user_id),
    );

    Ok(StatusCode::NO_CONTENT)
}
