use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pausedej_api::config::ServerConfig;
use pausedej_api::notifications::dispatcher::OrderNotificationDispatcher;
use pausedej_api::notifications::realtime::RealtimeBroadcaster;
use pausedej_api::notifications::Notifier;
use pausedej_api::router::build_app_router;
use pausedej_api::state::AppState;
use pausedej_api::ws;
use pausedej_core::templates::TemplateRenderer;
use pausedej_events::delivery::email::{EmailDelivery, ResendConfig};
use pausedej_events::delivery::push::{PushDelivery, VapidConfig};
use pausedej_events::delivery::sms::{BrevoConfig, SmsDelivery};
use pausedej_payments::{PaymentGateway, StripeClient, StripeConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pausedej_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = pausedej_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    pausedej_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    pausedej_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Notification channels ---
    let templates = TemplateRenderer::new().expect("Failed to load message templates");
    let mut notifier = Notifier::new(templates, config.public_site_url.clone());

    match ResendConfig::from_env() {
        Some(resend) => {
            let email = EmailDelivery::new(resend).expect("Failed to build Resend client");
            notifier = notifier.with_email(email);
            tracing::info!("Email delivery enabled (Resend)");
        }
        None => tracing::warn!("RESEND_API_KEY not set, email delivery disabled"),
    }

    match BrevoConfig::from_env() {
        Some(brevo) => {
            let sms = SmsDelivery::new(brevo).expect("Failed to build Brevo client");
            notifier = notifier.with_sms(sms);
            tracing::info!("SMS delivery enabled (Brevo)");
        }
        None => tracing::warn!("BREVO_API_KEY not set, SMS delivery disabled"),
    }

    match VapidConfig::from_env() {
        Some(vapid) => {
            let push = PushDelivery::new(vapid).expect("Failed to build Web Push client");
            notifier = notifier.with_push(push);
            tracing::info!("Web Push delivery enabled");
        }
        None => tracing::warn!("VAPID_PRIVATE_KEY not set, push delivery disabled"),
    }

    let notifier = Arc::new(notifier);

    // --- Payments ---
    let (payments, stripe_webhook_secret) = match StripeConfig::from_env() {
        Some(stripe) => {
            let webhook_secret = stripe.webhook_secret.clone();
            if webhook_secret.is_none() {
                tracing::warn!("STRIPE_WEBHOOK_SECRET not set, webhook endpoint disabled");
            }
            let client = StripeClient::new(stripe).expect("Failed to build Stripe client");
            tracing::info!("Stripe payments enabled");
            (
                Some(Arc::new(client) as Arc<dyn PaymentGateway>),
                webhook_secret,
            )
        }
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set, card payments disabled");
            (None, None)
        }
    };

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event bus ---
    let event_bus = Arc::new(pausedej_events::EventBus::default());

    // Realtime change feed for WebSocket clients.
    let broadcaster = RealtimeBroadcaster::new(Arc::clone(&ws_manager));
    let broadcaster_handle = tokio::spawn(broadcaster.run(event_bus.subscribe()));

    // Email, SMS and push on order status changes.
    let dispatcher = OrderNotificationDispatcher::new(pool.clone(), Arc::clone(&notifier));
    let dispatcher_handle = tokio::spawn(dispatcher.run(event_bus.subscribe()));

    tracing::info!("Event consumers started (realtime broadcaster, notification dispatcher)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
        notifier,
        payments,
        stripe_webhook_secret,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Dropping the last sender closes the channel; consumers exit on `Closed`.
    // The router (and with it the state's clone) is gone once serve returns.
    drop(event_bus);
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    let _ = tokio::time::timeout(drain, broadcaster_handle).await;
    let _ = tokio::time::timeout(drain, dispatcher_handle).await;
    tracing::info!("Event consumers shut down");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
