//! Newsletter: public subscribe / unsubscribe and admin campaigns.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pausedej_core::error::CoreError;
use pausedej_core::types::DbId;
use pausedej_db::models::newsletter::{Campaign, CreateCampaign, CAMPAIGN_DRAFT};
use pausedej_db::repositories::{CampaignRepo, SubscriberRepo};
use pausedej_events::bus::EVENT_CAMPAIGN_CHANGED;
use pausedej_events::{ChangeAction, StoreEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::notifications::DeliveryReport;
use crate::response::DataResponse;
use crate::state::AppState;

const TABLE: &str = "newsletter_campaigns";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub token: String,
}

/// Result of sending a campaign.
#[derive(Debug, Serialize)]
pub struct CampaignSendResult {
    pub campaign: Campaign,
    pub sent: usize,
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// Public
// ---------------------------------------------------------------------------

/// POST /api/v1/newsletter/subscribe
///
/// Subscribe (or re-subscribe) an email. The welcome email goes out only when
/// the address was new or had unsubscribed; a failed welcome email does not
/// fail the subscription.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(input): Json<SubscribeRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let token = uuid::Uuid::new_v4().simple().to_string();
    let (subscriber, newly_active) =
        SubscriberRepo::subscribe(&state.pool, input.email.trim(), &token).await?;

    tracing::info!(subscriber_id = subscriber.id, newly_active, "Newsletter subscription");

    if newly_active {
        if let Err(e) = state
            .notifier
            .send_welcome(&subscriber.email, &subscriber.unsubscribe_token)
            .await
        {
            tracing::warn!(subscriber_id = subscriber.id, error = %e, "Welcome email failed");
        }
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: subscriber })))
}

/// POST /api/v1/newsletter/unsubscribe
///
/// Idempotent: `unsubscribed` is `false` when the token was unknown or
/// already unsubscribed.
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(input): Json<UnsubscribeRequest>,
) -> AppResult<impl IntoResponse> {
    let unsubscribed = SubscriberRepo::unsubscribe(&state.pool, input.token.trim()).await?;
    if unsubscribed {
        tracing::info!("Newsletter unsubscription");
    }
    Ok(Json(DataResponse {
        data: json!({ "unsubscribed": unsubscribed }),
    }))
}

// ---------------------------------------------------------------------------
// Admin campaigns
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/newsletter/campaigns
pub async fn list_campaigns(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let campaigns = CampaignRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: campaigns }))
}

/// POST /api/v1/admin/newsletter/campaigns
///
/// Save a draft. `content` is HTML written by the admin.
pub async fn create_campaign(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateCampaign>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let campaign = CampaignRepo::create(&state.pool, &input, admin.user_id).await?;

    tracing::info!(campaign_id = campaign.id, user_id = admin.user_id, "Campaign drafted");
    state.event_bus.publish(
        StoreEvent::new(EVENT_CAMPAIGN_CHANGED, TABLE, ChangeAction::Insert, campaign.id)
            .with_actor(admin.user_id),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: campaign })))
}

/// POST /api/v1/admin/newsletter/campaigns/{id}/send
///
/// Send a draft to every active subscriber and mark it sent. Individual
/// failures are counted, not retried.
///
/// The draft is claimed before any email goes out, so a second request for
/// the same campaign answers 409 instead of sending it twice.
pub async fn send_campaign(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let campaign = CampaignRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id,
        }))?;
    if campaign.status != CAMPAIGN_DRAFT {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Campaign {id} has already been sent"
        ))));
    }
    if !state.notifier.email_enabled() {
        return Err(AppError::ServiceUnavailable(
            "Email delivery is not configured".into(),
        ));
    }

    let Some(campaign) = CampaignRepo::claim_for_sending(&state.pool, id).await? else {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Campaign {id} has already been sent"
        ))));
    };

    let (recipients, report) = match deliver_campaign(&state, &campaign).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Err(release_err) = CampaignRepo::release(&state.pool, id).await {
                tracing::error!(campaign_id = id, error = %release_err, "Campaign left in sending");
            }
            return Err(e);
        }
    };

    let campaign = CampaignRepo::mark_sent(
        &state.pool,
        id,
        i32::try_from(recipients).unwrap_or(i32::MAX),
        i32::try_from(report.failed).unwrap_or(i32::MAX),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Campaign",
        id,
    }))?;

    tracing::info!(
        campaign_id = id,
        sent = report.sent,
        failed = report.failed,
        user_id = admin.user_id,
        "Campaign sent"
    );
    state.event_bus.publish(
        StoreEvent::new(EVENT_CAMPAIGN_CHANGED, TABLE, ChangeAction::Update, id)
            .with_actor(admin.user_id),
    );

    Ok(Json(DataResponse {
        data: CampaignSendResult {
            campaign,
            sent: report.sent,
            failed: report.failed,
        },
    }))
}

/// Email a claimed campaign to the active subscribers. Returns the recipient
/// count with the delivery report.
async fn deliver_campaign(
    state: &AppState,
    campaign: &Campaign,
) -> AppResult<(usize, DeliveryReport)> {
    let subscribers = SubscriberRepo::list_active(&state.pool).await?;
    let report = state.notifier.send_campaign(campaign, &subscribers).await?;
    Ok((subscribers.len(), report))
}
