#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use pausedej_api::auth::jwt::{generate_access_token, JwtConfig};
use pausedej_api::auth::password::hash_password;
use pausedej_api::config::ServerConfig;
use pausedej_api::notifications::Notifier;
use pausedej_api::router::build_app_router;
use pausedej_api::state::AppState;
use pausedej_api::ws::WsManager;
use pausedej_core::templates::TemplateRenderer;
use pausedej_db::models::dish::{CreateDish, Dish};
use pausedej_db::models::profile::{CreateProfile, Profile};
use pausedej_db::repositories::{DishRepo, ProfileRepo};
use pausedej_events::EventBus;

pub const TEST_PASSWORD: &str = "motdepasse-test";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        public_site_url: "http://localhost:5173".to_string(),
        jwt: JwtConfig {
            secret: "test-secret-not-for-production".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Application state with every outbound integration switched off.
pub fn test_state(pool: PgPool) -> AppState {
    let config = test_config();
    let templates = TemplateRenderer::new().expect("templates should load");
    let notifier = Notifier::new(templates, config.public_site_url.clone());

    AppState {
        pool,
        config: Arc::new(config),
        ws_manager: Arc::new(WsManager::new()),
        event_bus: Arc::new(EventBus::default()),
        notifier: Arc::new(notifier),
        payments: None,
        stripe_webhook_secret: None,
    }
}

/// Build the application router behind the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_router(test_state(pool), &test_config())
}

/// Build the router from a customised state.
pub fn build_app_with_state(state: AppState) -> Router {
    build_app_router(state, &test_config())
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Sign a token for `profile` with the test secret.
pub fn token_for(profile: &Profile) -> String {
    generate_access_token(profile.id, &profile.role, &test_config().jwt)
        .expect("token generation should succeed")
}

/// Insert a profile with [`TEST_PASSWORD`] and return it with a token.
pub async fn create_user(pool: &PgPool, email: &str, role: &str) -> (Profile, String) {
    let profile = ProfileRepo::create(
        pool,
        &CreateProfile {
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
            full_name: Some("Camille Test".to_string()),
            phone: None,
            role: role.to_string(),
        },
    )
    .await
    .expect("profile creation should succeed");
    let token = token_for(&profile);
    (profile, token)
}

pub async fn create_customer(pool: &PgPool, email: &str) -> (Profile, String) {
    create_user(pool, email, pausedej_core::roles::ROLE_CUSTOMER).await
}

pub async fn create_admin(pool: &PgPool) -> (Profile, String) {
    create_user(pool, "admin@pausedej.fr", pausedej_core::roles::ROLE_ADMIN).await
}

/// Insert an available dish.
pub async fn create_dish(pool: &PgPool, name: &str, price: f64, category: &str) -> Dish {
    DishRepo::create(
        pool,
        &CreateDish {
            name: name.to_string(),
            description: None,
            price,
            category: category.to_string(),
            dietary_tags: Vec::new(),
            image_url: None,
            is_available: Some(true),
        },
    )
    .await
    .expect("dish creation should succeed")
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), None).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn delete_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), Some(body)).await
}

/// Send a raw body with extra headers (webhooks).
pub async fn post_raw(
    app: Router,
    uri: &str,
    body: Vec<u8>,
    headers: &[(&str, &str)],
) -> Response<Body> {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::from(body)).expect("request should build");
    app.oneshot(request).await.expect("router is infallible")
}
