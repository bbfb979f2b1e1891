//! Stripe payments: PaymentIntent creation and the webhook.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use pausedej_core::error::CoreError;
use pausedej_core::order::{OrderStatus, PaymentStatus};
use pausedej_core::pricing::to_minor_units;
use pausedej_core::types::DbId;
use pausedej_db::models::order::Order;
use pausedej_db::repositories::{OrderRepo, ProfileRepo};
use pausedej_events::bus::EVENT_ORDER_PAYMENT_UPDATED;
use pausedej_events::{ChangeAction, StoreEvent};
use pausedej_payments::webhook::{
    parse_event, PaymentIntentObject, EVENT_PAYMENT_FAILED, EVENT_PAYMENT_SUCCEEDED,
};
use pausedej_payments::{PaymentError, PaymentIntentRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::handlers::orders::publish_status_change;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Stripe currency for every charge.
const CURRENCY: &str = "eur";

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub order_id: DbId,
}

/// What the browser needs to confirm the card payment.
#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
    /// Amount in cents.
    pub amount: i64,
}

/// POST /api/v1/payments/intent
///
/// Create a Stripe PaymentIntent for one of the caller's unpaid orders.
pub async fn create_intent(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateIntentRequest>,
) -> AppResult<impl IntoResponse> {
    let gateway = state.payments.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("Online payment is not configured".into())
    })?;

    let id = input.order_id;
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|o| o.user_id == user.user_id)
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Order", id }))?;

    if order.payment_status.parse::<PaymentStatus>()? == PaymentStatus::Paid {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Order {id} is already paid"
        ))));
    }
    if order.status.parse::<OrderStatus>()? == OrderStatus::Cancelled {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Order {id} is cancelled"
        ))));
    }

    let amount = to_minor_units(order.total);
    if amount <= 0 {
        return Err(AppError::Core(CoreError::Validation(
            "Nothing to pay for this order".into(),
        )));
    }

    let receipt_email = ProfileRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .map(|p| p.email);

    let intent = gateway
        .create_payment_intent(&PaymentIntentRequest {
            order_id: id,
            amount,
            currency: CURRENCY.to_string(),
            receipt_email,
        })
        .await?;

    OrderRepo::set_payment_intent(&state.pool, id, &intent.id).await?;

    tracing::info!(
        order_id = id,
        payment_intent_id = %intent.id,
        amount,
        "Payment intent created"
    );

    Ok(Json(DataResponse {
        data: IntentResponse {
            client_secret: intent.client_secret,
            payment_intent_id: intent.id,
            amount,
        },
    }))
}

/// POST /api/v1/payments/webhook
///
/// Stripe event receiver. The raw body is needed for signature checking.
/// Unhandled event types and unknown orders are acknowledged so Stripe
/// stops retrying them.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let secret = state.stripe_webhook_secret.as_deref().ok_or_else(|| {
        AppError::ServiceUnavailable("Stripe webhook is not configured".into())
    })?;
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".into()))?;

    let event = match parse_event(&body, signature, secret, Utc::now().timestamp()) {
        Ok(event) => event,
        Err(PaymentError::Payload(e)) => {
            return Err(AppError::BadRequest(format!("Malformed event: {e}")));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(event_id = %event.id, event_type = %event.event_type, "Stripe event received");

    let intent = &event.data.object;
    match event.event_type.as_str() {
        EVENT_PAYMENT_SUCCEEDED => mark_paid(&state, intent).await?,
        EVENT_PAYMENT_FAILED => mark_failed(&state, intent).await?,
        other => tracing::debug!(event_type = %other, "Ignoring Stripe event"),
    }

    Ok(Json(DataResponse {
        data: json!({ "received": true }),
    }))
}

/// The order a PaymentIntent pays for: by metadata first, then by the
/// stored intent id.
async fn order_for_intent(
    state: &AppState,
    intent: &PaymentIntentObject,
) -> AppResult<Option<Order>> {
    if let Some(order_id) = intent.order_id() {
        if let Some(order) = OrderRepo::find_by_id(&state.pool, order_id).await? {
            return Ok(Some(order));
        }
    }
    Ok(OrderRepo::find_by_payment_intent(&state.pool, &intent.id).await?)
}

fn publish_payment_update(state: &AppState, order: &Order, payment_status: PaymentStatus) {
    state.event_bus.publish(
        StoreEvent::new(EVENT_ORDER_PAYMENT_UPDATED, "orders", ChangeAction::Update, order.id)
            .with_payload(json!({
                "user_id": order.user_id,
                "payment_status": payment_status.as_str(),
            })),
    );
}

/// Payment captured: mark the order paid and confirm it if still pending.
///
/// Stripe may deliver the same event more than once; an already-paid order
/// is left alone.
async fn mark_paid(state: &AppState, intent: &PaymentIntentObject) -> AppResult<()> {
    let Some(order) = order_for_intent(state, intent).await? else {
        tracing::warn!(payment_intent_id = %intent.id, "Payment for unknown order");
        return Ok(());
    };
    if order.payment_status.parse::<PaymentStatus>()? == PaymentStatus::Paid {
        tracing::debug!(order_id = order.id, "Order already paid");
        return Ok(());
    }

    let current: OrderStatus = order.status.parse()?;
    let confirm = current == OrderStatus::Pending;
    let new_status = confirm.then_some(OrderStatus::Confirmed.as_str());

    let Some(updated) = OrderRepo::update_payment_status(
        &state.pool,
        order.id,
        PaymentStatus::Paid.as_str(),
        new_status,
    )
    .await?
    else {
        return Ok(());
    };

    tracing::info!(order_id = order.id, amount = intent.amount, "Order paid");
    publish_payment_update(state, &updated, PaymentStatus::Paid);
    if confirm {
        publish_status_change(state, &updated, current, OrderStatus::Confirmed, None);
    }
    Ok(())
}

async fn mark_failed(state: &AppState, intent: &PaymentIntentObject) -> AppResult<()> {
    let Some(order) = order_for_intent(state, intent).await? else {
        tracing::warn!(payment_intent_id = %intent.id, "Failed payment for unknown order");
        return Ok(());
    };
    if order.payment_status.parse::<PaymentStatus>()? == PaymentStatus::Paid {
        return Ok(());
    }

    if let Some(updated) = OrderRepo::update_payment_status(
        &state.pool,
        order.id,
        PaymentStatus::Failed.as_str(),
        None,
    )
    .await?
    {
        tracing::info!(order_id = order.id, "Order payment failed");
        publish_payment_update(state, &updated, PaymentStatus::Failed);
    }
    Ok(())
}
