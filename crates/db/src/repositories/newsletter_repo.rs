//! Repositories for the `newsletter_subscribers` and `newsletter_campaigns` tables.

use pausedej_core::types::DbId;
use sqlx::PgPool;

use crate::models::newsletter::{
    Campaign, CreateCampaign, Subscriber, CAMPAIGN_DRAFT, CAMPAIGN_SENDING, CAMPAIGN_SENT,
};

const SUBSCRIBER_COLUMNS: &str =
    "id, email, unsubscribe_token, is_active, subscribed_at, unsubscribed_at";

const CAMPAIGN_COLUMNS: &str = "\
    id, subject, content, status, recipients_count, failed_count, \
    sent_at, created_by, created_at";

/// Provides data access for newsletter subscribers.
pub struct SubscriberRepo;

impl SubscriberRepo {
    /// Subscribe an email, reactivating it if it had unsubscribed.
    ///
    /// The unsubscribe token is kept across re-subscriptions so old links
    /// keep working. The flag is `true` when the email was inserted or
    /// reactivated, `false` when it was already an active subscriber.
    pub async fn subscribe(
        pool: &PgPool,
        email: &str,
        token: &str,
    ) -> Result<(Subscriber, bool), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let was_active = sqlx::query_scalar::<_, bool>(
            "SELECT is_active FROM newsletter_subscribers WHERE email = lower($1) FOR UPDATE",
        )
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO newsletter_subscribers (email, unsubscribe_token) \
             VALUES (lower($1), $2) \
             ON CONFLICT (email) DO UPDATE SET \
                 is_active = true, \
                 unsubscribed_at = NULL \
             RETURNING {SUBSCRIBER_COLUMNS}"
        );
        let subscriber = sqlx::query_as::<_, Subscriber>(&query)
            .bind(email)
            .bind(token)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((subscriber, was_active != Some(true)))
    }

    /// Deactivate the subscriber owning `token`.
    ///
    /// Returns `true` if an active subscription was ended.
    pub async fn unsubscribe(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE newsletter_subscribers \
             SET is_active = false, unsubscribed_at = NOW() \
             WHERE unsubscribe_token = $1 AND is_active = true",
        )
        .bind(token)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_active(pool: &PgPool) -> Result<Vec<Subscriber>, sqlx::Error> {
        let query = format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM newsletter_subscribers \
             WHERE is_active ORDER BY id"
        );
        sqlx::query_as::<_, Subscriber>(&query).fetch_all(pool).await
    }
}

/// Provides data access for newsletter campaigns.
pub struct CampaignRepo;

impl CampaignRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateCampaign,
        created_by: DbId,
    ) -> Result<Campaign, sqlx::Error> {
        let query = format!(
            "INSERT INTO newsletter_campaigns (subject, content, created_by) \
             VALUES ($1, $2, $3) \
             RETURNING {CAMPAIGN_COLUMNS}"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(&input.subject)
            .bind(&input.content)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {CAMPAIGN_COLUMNS} FROM newsletter_campaigns WHERE id = $1");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All campaigns, most recent first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Campaign>, sqlx::Error> {
        let query = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM newsletter_campaigns ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Campaign>(&query).fetch_all(pool).await
    }

    /// Move a draft to `sending`. Returns `None` when the campaign is not a
    /// draft, so only one of several concurrent sends gets the campaign.
    pub async fn claim_for_sending(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!(
            "UPDATE newsletter_campaigns SET status = $2 \
             WHERE id = $1 AND status = $3 \
             RETURNING {CAMPAIGN_COLUMNS}"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(CAMPAIGN_SENDING)
            .bind(CAMPAIGN_DRAFT)
            .fetch_optional(pool)
            .await
    }

    /// Put a claimed campaign back to draft after a send that failed before
    /// delivering anything.
    pub async fn release(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE newsletter_campaigns SET status = $2 WHERE id = $1 AND status = $3")
                .bind(id)
                .bind(CAMPAIGN_DRAFT)
                .bind(CAMPAIGN_SENDING)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the outcome of a send and mark a claimed campaign as sent.
    pub async fn mark_sent(
        pool: &PgPool,
        id: DbId,
        recipients_count: i32,
        failed_count: i32,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!(
            "UPDATE newsletter_campaigns SET \
                 status = $2, \
                 recipients_count = $3, \
                 failed_count = $4, \
                 sent_at = NOW() \
             WHERE id = $1 AND status = $5 \
             RETURNING {CAMPAIGN_COLUMNS}"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .bind(CAMPAIGN_SENT)
            .bind(recipients_count)
            .bind(failed_count)
            .bind(CAMPAIGN_SENDING)
            .fetch_optional(pool)
            .await
    }
}
