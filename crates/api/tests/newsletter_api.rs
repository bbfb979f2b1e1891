//! HTTP-level integration tests for the newsletter and Web Push endpoints.
//!
//! The test app runs without Resend or VAPID credentials, so sending paths
//! answer 503 while the bookkeeping endpoints work normally.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_json_auth, get_auth, post_json, post_json_auth};
use pausedej_db::models::newsletter::CreateCampaign;
use pausedej_db::repositories::{CampaignRepo, PushSubscriptionRepo, SubscriberRepo};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Subscribers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_subscribe_and_unsubscribe(pool: PgPool) {
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/newsletter/subscribe",
        json!({ "email": "Gourmand@Example.fr" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "gourmand@example.fr");
    assert!(json["data"].get("unsubscribe_token").is_none());

    let active = SubscriberRepo::list_active(&pool).await.unwrap();
    assert_eq!(active.len(), 1);
    let token = active[0].unsubscribe_token.clone();

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/newsletter/unsubscribe",
        json!({ "token": token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["unsubscribed"], true);

    // Second time: nothing to do.
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/newsletter/unsubscribe",
        json!({ "token": token }),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["unsubscribed"], false);
    assert!(SubscriberRepo::list_active(&pool).await.unwrap().is_empty());
}

/// Re-subscribing reactivates the row and keeps the original token.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_resubscribe_keeps_token(pool: PgPool) {
    let (first, _) = SubscriberRepo::subscribe(&pool, "fidele@example.fr", "token-1")
        .await
        .unwrap();
    SubscriberRepo::unsubscribe(&pool, "token-1").await.unwrap();

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/newsletter/subscribe",
        json!({ "email": "fidele@example.fr" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["id"], first.id);

    let active = SubscriberRepo::list_active(&pool).await.unwrap();
    assert_eq!(active[0].unsubscribe_token, "token-1");
}

/// Only a new or returning subscriber is due a welcome email.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_subscribe_reports_newly_active(pool: PgPool) {
    let email = "accueil@example.fr";

    let (_, newly_active) = SubscriberRepo::subscribe(&pool, email, "token-a").await.unwrap();
    assert!(newly_active);

    let (_, newly_active) = SubscriberRepo::subscribe(&pool, email, "token-b").await.unwrap();
    assert!(!newly_active, "already active");

    SubscriberRepo::unsubscribe(&pool, "token-a").await.unwrap();
    let (subscriber, newly_active) =
        SubscriberRepo::subscribe(&pool, email, "token-c").await.unwrap();
    assert!(newly_active, "reactivated");
    assert_eq!(subscriber.unsubscribe_token, "token-a");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_subscribe_rejects_invalid_email(pool: PgPool) {
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/newsletter/subscribe",
        json!({ "email": "pas-un-email" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_campaign_draft_and_send_without_email(pool: PgPool) {
    let (_, admin) = common::create_admin(&pool).await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/admin/newsletter/campaigns",
        json!({ "subject": "Nouveautés de mars", "content": "Trois nouveaux bowls !" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let campaign = body_json(response).await["data"].clone();
    assert_eq!(campaign["status"], "draft");

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/admin/newsletter/campaigns",
        &admin,
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/admin/newsletter/campaigns/{}/send", campaign["id"]),
        json!({}),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/admin/newsletter/campaigns/999999/send",
        json!({}),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Only one of two concurrent sends can claim a draft.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_campaign_claim_is_exclusive(pool: PgPool) {
    let (admin, _) = common::create_admin(&pool).await;
    let draft = CampaignRepo::create(
        &pool,
        &CreateCampaign {
            subject: "Menu d'été".into(),
            content: "<p>Salades fraîches</p>".into(),
        },
        admin.id,
    )
    .await
    .unwrap();

    let (first, second) = tokio::join!(
        CampaignRepo::claim_for_sending(&pool, draft.id),
        CampaignRepo::claim_for_sending(&pool, draft.id),
    );
    let claimed = [first.unwrap(), second.unwrap()];
    assert_eq!(claimed.iter().filter(|c| c.is_some()).count(), 1);

    let sent = CampaignRepo::mark_sent(&pool, draft.id, 3, 0).await.unwrap().unwrap();
    assert_eq!(sent.status, "sent");
    assert_eq!(sent.recipients_count, 3);

    // A sent campaign can be neither claimed nor marked again.
    assert!(CampaignRepo::claim_for_sending(&pool, draft.id).await.unwrap().is_none());
    assert!(CampaignRepo::mark_sent(&pool, draft.id, 9, 9).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_campaign_release_returns_to_draft(pool: PgPool) {
    let (admin, _) = common::create_admin(&pool).await;
    let draft = CampaignRepo::create(
        &pool,
        &CreateCampaign {
            subject: "Fermeture".into(),
            content: "<p>Fermé lundi</p>".into(),
        },
        admin.id,
    )
    .await
    .unwrap();

    CampaignRepo::claim_for_sending(&pool, draft.id).await.unwrap().unwrap();
    assert!(CampaignRepo::release(&pool, draft.id).await.unwrap());

    let campaign = CampaignRepo::find_by_id(&pool, draft.id).await.unwrap().unwrap();
    assert_eq!(campaign.status, "draft");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_campaigns_are_admin_only(pool: PgPool) {
    let (_, token) = common::create_customer(&pool, "client@example.fr").await;

    let response = get_auth(
        common::build_test_app(pool),
        "/api/v1/admin/newsletter/campaigns",
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Web Push
// ---------------------------------------------------------------------------

fn subscription_body(endpoint: &str) -> serde_json::Value {
    json!({
        "endpoint": endpoint,
        "keys": {
            "p256dh": "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA",
            "auth": "tBHItJI5svbpez7KI4CCXg",
        },
    })
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_push_subscription_lifecycle(pool: PgPool) {
    let (customer, token) = common::create_customer(&pool, "push@example.fr").await;
    let endpoint = "https://fcm.googleapis.com/fcm/send/abc123";

    // Registering the same endpoint twice keeps one row.
    for _ in 0..2 {
        let response = post_json_auth(
            common::build_test_app(pool.clone()),
            "/api/v1/push/subscriptions",
            subscription_body(endpoint),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    let saved = PushSubscriptionRepo::list_for_user(&pool, customer.id).await.unwrap();
    assert_eq!(saved.len(), 1);

    let response = delete_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/push/subscriptions",
        json!({ "endpoint": endpoint }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(PushSubscriptionRepo::list_all(&pool).await.unwrap().is_empty());
}

/// Unsubscribing someone else's endpoint answers 204 and changes nothing.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_push_unsubscribe_only_touches_own_endpoint(pool: PgPool) {
    let (alice, alice_token) = common::create_customer(&pool, "alice@example.fr").await;
    let (_, bob_token) = common::create_customer(&pool, "bob@example.fr").await;
    let endpoint = "https://updates.push.services.mozilla.com/wpush/v2/alice";

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/push/subscriptions",
        subscription_body(endpoint),
        &alice_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = delete_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/push/subscriptions",
        json!({ "endpoint": endpoint }),
        &bob_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let saved = PushSubscriptionRepo::list_for_user(&pool, alice.id).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].endpoint, endpoint);
}

/// Expired endpoints are dropped whoever owns them.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_push_subscription_is_deleted(pool: PgPool) {
    let (_, token) = common::create_customer(&pool, "expire@example.fr").await;
    let endpoint = "https://fcm.googleapis.com/fcm/send/expired";

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/push/subscriptions",
        subscription_body(endpoint),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    assert!(PushSubscriptionRepo::delete_by_endpoint(&pool, endpoint).await.unwrap());
    assert!(!PushSubscriptionRepo::delete_by_endpoint(&pool, endpoint).await.unwrap());
    assert!(PushSubscriptionRepo::list_all(&pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_push_subscription_requires_url_endpoint(pool: PgPool) {
    let (_, token) = common::create_customer(&pool, "push@example.fr").await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/push/subscriptions",
        subscription_body("not a url"),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_broadcast_without_vapid_is_unavailable(pool: PgPool) {
    let (_, admin) = common::create_admin(&pool).await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/admin/push/broadcast",
        json!({ "title": "Happy hour", "body": "-20 % sur les desserts" }),
        &admin,
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
