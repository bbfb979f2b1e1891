pub mod auth;
pub mod dishes;
pub mod favorites;
pub mod health;
pub mod newsletter;
pub mod orders;
pub mod payments;
pub mod profile;
pub mod promo;
pub mod push;
pub mod recommendations;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                        WebSocket change feed
///
/// /auth/register                             register (public)
/// /auth/login                                login (public)
/// /auth/me                                   current profile
/// /profile                                   get, update own profile
///
/// /dishes                                    list (public)
/// /dishes/{id}                               get (public)
/// /recommendations                           ranked dishes for the caller
/// /favorites                                 list
/// /favorites/{dish_id}                       add (PUT), remove (DELETE)
///
/// /orders                                    place, list own
/// /orders/{id}                               get
/// /orders/{id}/cancel                        cancel while pending (POST)
/// /promo/validate                            preview a promo code (POST)
///
/// /payments/intent                           create Stripe PaymentIntent
/// /payments/webhook                          Stripe events (signed)
///
/// /newsletter/subscribe                      subscribe (public)
/// /newsletter/unsubscribe                    unsubscribe by token (public)
/// /push/subscriptions                        register (POST), remove (DELETE)
///
/// /admin/dishes                              create (admin only)
/// /admin/dishes/{id}                         update, delete
/// /admin/orders                              list all, ?status=
/// /admin/orders/{id}/status                  set status (PUT)
/// /admin/newsletter/campaigns                list, draft
/// /admin/newsletter/campaigns/{id}/send      send draft (POST)
/// /admin/push/broadcast                      push to every subscription
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket change feed.
        .route("/ws", get(ws::ws_handler))
        // Accounts.
        .nest("/auth", auth::router())
        .nest("/profile", profile::router())
        // Menu and personalisation.
        .nest("/dishes", dishes::router())
        .nest("/recommendations", recommendations::router())
        .nest("/favorites", favorites::router())
        // Checkout.
        .nest("/orders", orders::router())
        .nest("/promo", promo::router())
        .nest("/payments", payments::router())
        // Marketing channels.
        .nest("/newsletter", newsletter::router())
        .nest("/push", push::router())
        // Back office.
        .nest("/admin/dishes", dishes::admin_router())
        .nest("/admin/orders", orders::admin_router())
        .nest("/admin/newsletter", newsletter::admin_router())
        .nest("/admin/push", push::admin_router())
}
