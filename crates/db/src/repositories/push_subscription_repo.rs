//! Repository for the `push_subscriptions` table.

use pausedej_core::types::DbId;
use sqlx::PgPool;

use crate::models::push_subscription::{CreatePushSubscription, PushSubscription};

const COLUMNS: &str = "id, user_id, endpoint, p256dh, auth, created_at";

/// Provides data access for Web Push subscriptions.
pub struct PushSubscriptionRepo;

impl PushSubscriptionRepo {
    /// Register a browser subscription. A known endpoint is re-bound to the
    /// caller with fresh keys.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        input: &CreatePushSubscription,
    ) -> Result<PushSubscription, sqlx::Error> {
        let query = format!(
            "INSERT INTO push_subscriptions (user_id, endpoint, p256dh, auth) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (endpoint) DO UPDATE SET \
                 user_id = EXCLUDED.user_id, \
                 p256dh = EXCLUDED.p256dh, \
                 auth = EXCLUDED.auth \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PushSubscription>(&query)
            .bind(user_id)
            .bind(&input.endpoint)
            .bind(&input.keys.p256dh)
            .bind(&input.keys.auth)
            .fetch_one(pool)
            .await
    }

    /// Remove one of the user's subscriptions. Returns `true` if a row was
    /// deleted; endpoints bound to another user are left alone.
    pub async fn delete_for_user(
        pool: &PgPool,
        user_id: DbId,
        endpoint: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM push_subscriptions WHERE endpoint = $1 AND user_id = $2")
                .bind(endpoint)
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop a subscription the push service reported as gone.
    pub async fn delete_by_endpoint(pool: &PgPool, endpoint: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM push_subscriptions WHERE endpoint = $1")
            .bind(endpoint)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<PushSubscription>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM push_subscriptions WHERE user_id = $1");
        sqlx::query_as::<_, PushSubscription>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<PushSubscription>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM push_subscriptions ORDER BY id");
        sqlx::query_as::<_, PushSubscription>(&query)
            .fetch_all(pool)
            .await
    }
}
