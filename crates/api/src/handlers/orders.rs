//! Handlers for orders: placement and tracking by customers, status
//! management by admins.
//!
//! Prices are never taken from the client. Each line is priced from the
//! current dish row and the snapshot (name, unit price) is stored with the
//! order, so later menu edits do not rewrite history.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use pausedej_core::error::CoreError;
use pausedej_core::order::{validate_order_request, DeliveryMode, OrderStatus, RequestedLine};
use pausedej_core::pricing::{compute_totals, subtotal, PricedLine};
use pausedej_core::types::{DbId, Timestamp};
use pausedej_db::models::order::{NewOrder, NewOrderItem, Order, OrderFilter};
use pausedej_db::repositories::{DishRepo, OrderRepo, ProfileRepo};
use pausedej_events::bus::{EVENT_ORDER_CREATED, EVENT_ORDER_STATUS_CHANGED};
use pausedej_events::{ChangeAction, StoreEvent};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::promo::load_catalog;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

const TABLE: &str = "orders";

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /orders`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub items: Vec<RequestedLine>,
    pub delivery_mode: DeliveryMode,
    #[validate(length(max = 300))]
    pub delivery_address: Option<String>,
    /// Desired delivery or pickup time; `None` means as soon as possible.
    pub requested_time: Option<Timestamp>,
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    pub promo_code: Option<String>,
}

/// Request body for `PUT /admin/orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Order", id })
}

/// Load an order the caller may see. Other customers' orders answer 404 so
/// ids cannot be probed.
async fn find_visible(state: &AppState, user: &AuthUser, id: DbId) -> AppResult<Order> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if order.user_id != user.user_id && !user.is_admin() {
        return Err(not_found(id));
    }
    Ok(order)
}

/// Publish the change feed and notification trigger for a status change.
pub(crate) fn publish_status_change(
    state: &AppState,
    order: &Order,
    from: OrderStatus,
    to: OrderStatus,
    actor: Option<DbId>,
) {
    let mut event =
        StoreEvent::new(EVENT_ORDER_STATUS_CHANGED, TABLE, ChangeAction::Update, order.id)
            .with_payload(json!({
                "user_id": order.user_id,
                "from": from.as_str(),
                "to": to.as_str(),
            }));
    if let Some(actor) = actor {
        event = event.with_actor(actor);
    }
    state.event_bus.publish(event);
}

// ---------------------------------------------------------------------------
// Customer
// ---------------------------------------------------------------------------

/// POST /api/v1/orders
///
/// Place an order. Lines are priced server-side, the promo code (if any) is
/// checked against the priced subtotal, and the order starts `pending` /
/// payment `pending`.
pub async fn create_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateOrderRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_order_request(
        &input.items,
        input.delivery_mode,
        input.delivery_address.as_deref(),
    )?;
    if input.requested_time.is_some_and(|t| t < Utc::now()) {
        return Err(AppError::Core(CoreError::Validation(
            "Requested time must be in the future".into(),
        )));
    }

    // 1. Resolve dishes and snapshot their prices.
    let ids: Vec<DbId> = input.items.iter().map(|l| l.dish_id).collect();
    let dishes: HashMap<DbId, _> = DishRepo::find_many(&state.pool, &ids)
        .await?
        .into_iter()
        .map(|d| (d.id, d))
        .collect();

    let mut items = Vec::with_capacity(input.items.len());
    for line in &input.items {
        let dish = dishes.get(&line.dish_id).ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Dish",
                id: line.dish_id,
            })
        })?;
        if !dish.is_available {
            return Err(AppError::Core(CoreError::Validation(format!(
                "{} is not available right now",
                dish.name
            ))));
        }
        items.push(NewOrderItem {
            dish_id: dish.id,
            dish_name: dish.name.clone(),
            unit_price: dish.price,
            quantity: line.quantity,
        });
    }
    let priced: Vec<PricedLine> = items
        .iter()
        .map(|i| PricedLine {
            unit_price: i.unit_price,
            quantity: i.quantity,
        })
        .collect();

    // 2. Promo code.
    let promo_code = input
        .promo_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let applied = match promo_code {
        Some(code) => {
            let catalog = load_catalog(&state.pool).await?;
            Some(catalog.validate(code, subtotal(&priced), Utc::now().date_naive())?)
        }
        None => None,
    };
    let discount = applied.as_ref().map_or(0.0, |a| a.discount);
    let totals = compute_totals(&priced, input.delivery_mode, discount);

    // 3. Contact phone: the one given at checkout, else the profile's.
    let phone = match input.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(raw) => Some(pausedej_core::phone::normalize_phone(raw)?),
        None => ProfileRepo::find_by_id(&state.pool, user.user_id)
            .await?
            .and_then(|p| p.phone),
    };

    let delivery_address = match input.delivery_mode {
        DeliveryMode::Delivery => input.delivery_address.map(|a| a.trim().to_string()),
        DeliveryMode::Pickup => None,
    };

    let order = OrderRepo::create(
        &state.pool,
        &NewOrder {
            user_id: user.user_id,
            delivery_mode: input.delivery_mode.as_str().to_string(),
            delivery_address,
            requested_time: input.requested_time,
            phone,
            notes: input.notes,
            subtotal: totals.subtotal,
            delivery_fee: totals.delivery_fee,
            discount: totals.discount,
            total: totals.total,
            promo_code: applied.map(|a| a.code),
            items,
        },
    )
    .await?;

    tracing::info!(
        order_id = order.order.id,
        user_id = user.user_id,
        total = order.order.total,
        lines = order.items.len(),
        "Order placed"
    );
    state.event_bus.publish(
        StoreEvent::new(EVENT_ORDER_CREATED, TABLE, ChangeAction::Insert, order.order.id)
            .with_actor(user.user_id)
            .with_payload(json!({ "user_id": user.user_id, "total": order.order.total })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: order })))
}

/// GET /api/v1/orders
///
/// The caller's orders, most recent first.
pub async fn list_my_orders(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let orders = OrderRepo::list_for_user(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: orders }))
}

/// GET /api/v1/orders/{id}
///
/// One order with its lines. Admins may read any order.
pub async fn get_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = OrderRepo::find_with_items(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if order.order.user_id != user.user_id && !user.is_admin() {
        return Err(not_found(id));
    }
    Ok(Json(DataResponse { data: order }))
}

/// POST /api/v1/orders/{id}/cancel
///
/// Customers may cancel their own order while it is still `pending`.
pub async fn cancel_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = find_visible(&state, &user, id).await?;
    if order.user_id != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the customer can cancel their order".into(),
        )));
    }

    let current: OrderStatus = order.status.parse()?;
    if !current.customer_can_cancel() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Order {id} can no longer be cancelled (status: {current})"
        ))));
    }

    let updated = OrderRepo::update_status(&state.pool, id, OrderStatus::Cancelled.as_str())
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(order_id = id, user_id = user.user_id, "Order cancelled by customer");
    publish_status_change(&state, &updated, current, OrderStatus::Cancelled, Some(user.user_id));

    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/orders
///
/// All orders, optionally filtered by `status`.
pub async fn admin_list_orders(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> AppResult<impl IntoResponse> {
    if let Some(status) = &filter.status {
        status.parse::<OrderStatus>()?;
    }
    let orders = OrderRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: orders }))
}

/// PUT /api/v1/admin/orders/{id}/status
///
/// Move an order to any status; the back office may also reopen a delivered
/// or cancelled order. Setting the current status again is a no-op and
/// notifies nobody.
pub async fn update_order_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let current: OrderStatus = order.status.parse()?;

    if current == input.status {
        return Ok(Json(DataResponse { data: order }));
    }

    let updated = OrderRepo::update_status(&state.pool, id, input.status.as_str())
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(
        order_id = id,
        from = %current,
        to = %input.status,
        user_id = admin.user_id,
        "Order status updated"
    );
    publish_status_change(&state, &updated, current, input.status, Some(admin.user_id));

    Ok(Json(DataResponse { data: updated }))
}
