//! The storefront's HTTP application: `/health` plus the `/api/v1` tree,
//! wrapped in the middleware every request goes through.
//!
//! `main.rs` serves the router built here and the integration tests drive
//! it with `oneshot`, so both see the same CORS, timeout and tracing
//! behaviour.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Header carrying the per-request id, echoed back on the response so the
/// storefront can quote it when reporting a failed checkout.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Browsers cache a CORS preflight for this long.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Assemble the storefront router.
///
/// Layers run outermost first on the way in: CORS, request id assignment,
/// the request span, id propagation, the timeout, then panic recovery
/// closest to the handlers. A request that exceeds
/// `REQUEST_TIMEOUT_SECS` answers 408; a panicking handler answers 500.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(build_cors_layer(config))
        .with_state(state)
}

/// CORS for the storefront and back-office origins in `CORS_ORIGINS`.
///
/// Only the verbs the API routes use are allowed. The Stripe webhook is a
/// server-to-server call and needs no CORS. Panics at startup on an origin
/// that is not a valid header value.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{origin}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(PREFLIGHT_MAX_AGE)
}
