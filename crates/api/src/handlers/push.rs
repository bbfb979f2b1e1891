//! Web Push subscriptions and the admin broadcast.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pausedej_core::templates::PushPayload;
use pausedej_db::models::push_subscription::CreatePushSubscription;
use pausedej_db::repositories::PushSubscriptionRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

/// Request body for `POST /admin/push/broadcast`.
#[derive(Debug, Deserialize, Validate)]
pub struct BroadcastRequest {
    #[validate(length(min = 1, max = 80))]
    pub title: String,
    #[validate(length(min = 1, max = 300))]
    pub body: String,
    /// Page opened when the notification is clicked. Defaults to `/`.
    pub url: Option<String>,
}

/// POST /api/v1/push/subscriptions
///
/// Register the browser's push subscription for the caller.
pub async fn subscribe(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<CreatePushSubscription>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let subscription = PushSubscriptionRepo::upsert(&state.pool, user.user_id, &input).await?;

    tracing::info!(
        user_id = user.user_id,
        subscription_id = subscription.id,
        "Push subscription saved"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: subscription })))
}

/// DELETE /api/v1/push/subscriptions
///
/// Idempotent: an unknown endpoint, or one registered by another user, also
/// answers 204 and is left untouched.
pub async fn unsubscribe(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<UnsubscribeRequest>,
) -> AppResult<StatusCode> {
    let removed =
        PushSubscriptionRepo::delete_for_user(&state.pool, user.user_id, &input.endpoint).await?;
    tracing::info!(user_id = user.user_id, removed, "Push subscription removed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/push/broadcast
///
/// Push one notification to every subscription. Answers with sent/failed
/// counts.
pub async fn broadcast(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<BroadcastRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if !state.notifier.push_enabled() {
        return Err(AppError::ServiceUnavailable(
            "Web Push is not configured".into(),
        ));
    }

    let subscriptions = PushSubscriptionRepo::list_all(&state.pool).await?;
    let payload = PushPayload {
        title: input.title,
        body: input.body,
        url: input.url.unwrap_or_else(|| "/".to_string()),
    };
    let report = state.notifier.push_to(&state.pool, &subscriptions, &payload).await;

    tracing::info!(
        user_id = admin.user_id,
        sent = report.sent,
        failed = report.failed,
        expired = report.expired,
        "Push broadcast"
    );

    Ok(Json(DataResponse { data: report }))
}
