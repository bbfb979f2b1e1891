//! HTTP-level integration tests for the menu: public browsing and admin
//! management.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_auth, get, post_json_auth, put_json_auth};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Public browsing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_dishes_filters_by_category(pool: PgPool) {
    common::create_dish(&pool, "Salade César", 9.5, "salades").await;
    common::create_dish(&pool, "Bowl quinoa", 11.0, "bowls").await;
    common::create_dish(&pool, "Salade niçoise", 10.0, "salades").await;

    let response = get(common::build_test_app(pool.clone()), "/api/v1/dishes").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 3);

    let response = get(common::build_test_app(pool), "/api/v1/dishes?category=salades").await;
    let json = body_json(response).await;
    let names: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Salade César", "Salade niçoise"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_missing_dish_returns_404(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/v1/dishes/999999").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Admin management
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_customer_cannot_create_dish(pool: PgPool) {
    let (_, token) = common::create_customer(&pool, "client@example.fr").await;
    let app = common::build_test_app(pool);

    let body = json!({ "name": "Wrap", "price": 7.0, "category": "wraps" });
    let response = post_json_auth(app, "/api/v1/admin/dishes", body, &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_dish_lifecycle(pool: PgPool) {
    let (_, token) = common::create_admin(&pool).await;

    // Create.
    let body = json!({
        "name": "Wrap falafel",
        "price": 8.5,
        "category": "wraps",
        "dietary_tags": ["Vegan", "vegan"],
    });
    let response =
        post_json_auth(common::build_test_app(pool.clone()), "/api/v1/admin/dishes", body, &token)
            .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(created["data"]["dietary_tags"], json!(["vegan"]));
    assert_eq!(created["data"]["is_available"], true);

    // Update price and availability.
    let body = json!({ "price": 9.0, "is_available": false });
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/admin/dishes/{id}"),
        body,
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["data"]["price"], 9.0);
    assert_eq!(updated["data"]["name"], "Wrap falafel");

    // Unavailable dishes are hidden by available_only.
    let response = get(
        common::build_test_app(pool.clone()),
        "/api/v1/dishes?available_only=true",
    )
    .await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());

    // Delete.
    let uri = format!("/api/v1/admin/dishes/{id}");
    let response = delete_auth(common::build_test_app(pool.clone()), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete_auth(common::build_test_app(pool), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_dish_rejects_negative_price(pool: PgPool) {
    let (_, token) = common::create_admin(&pool).await;
    let app = common::build_test_app(pool);

    let body = json!({ "name": "Erreur", "price": -1.0, "category": "bowls" });
    let response = post_json_auth(app, "/api/v1/admin/dishes", body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
