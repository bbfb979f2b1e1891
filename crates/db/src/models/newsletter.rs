//! Newsletter subscribers and campaigns.

use pausedej_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Campaign has not been sent yet.
pub const CAMPAIGN_DRAFT: &str = "draft";
/// Campaign was claimed by one send request and is being delivered.
pub const CAMPAIGN_SENDING: &str = "sending";
/// Campaign was sent; it cannot be sent again.
pub const CAMPAIGN_SENT: &str = "sent";

/// A row from the `newsletter_subscribers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subscriber {
    pub id: DbId,
    pub email: String,
    #[serde(skip_serializing)]
    pub unsubscribe_token: String,
    pub is_active: bool,
    pub subscribed_at: Timestamp,
    pub unsubscribed_at: Option<Timestamp>,
}

/// A row from the `newsletter_campaigns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Campaign {
    pub id: DbId,
    pub subject: String,
    pub content: String,
    pub status: String,
    pub recipients_count: i32,
    pub failed_count: i32,
    pub sent_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for drafting a campaign.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCampaign {
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub content: String,
}
