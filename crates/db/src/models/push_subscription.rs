//! Browser Web Push subscriptions.

use pausedej_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `push_subscriptions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PushSubscription {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: Timestamp,
}

/// Subscription as produced by the browser's `PushManager.subscribe()`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePushSubscription {
    #[validate(url)]
    pub endpoint: String,
    pub keys: PushKeys,
}

/// The `keys` object of a browser push subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}
