//! Orders and their lines.

use pausedej_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `orders` table.
///
/// `status`, `payment_status` and `delivery_mode` hold the snake_case text
/// of the matching `pausedej_core::order` enums.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub user_id: DbId,
    pub status: String,
    pub payment_status: String,
    pub delivery_mode: String,
    pub delivery_address: Option<String>,
    pub requested_time: Option<Timestamp>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub discount: f64,
    pub total: f64,
    pub promo_code: Option<String>,
    pub payment_intent_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `order_items` table. Name and price are copied from the
/// dish when the order is placed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: DbId,
    pub order_id: DbId,
    pub dish_id: Option<DbId>,
    pub dish_name: String,
    pub unit_price: f64,
    pub quantity: i32,
}

/// An order with its lines, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// One (dish, quantity) line of a customer's past orders.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct HistoryRow {
    pub dish_id: DbId,
    pub quantity: i32,
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// A fully priced order ready to insert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: DbId,
    pub delivery_mode: String,
    pub delivery_address: Option<String>,
    pub requested_time: Option<Timestamp>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub discount: f64,
    pub total: f64,
    pub promo_code: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// A priced line of a [`NewOrder`].
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub dish_id: DbId,
    pub dish_name: String,
    pub unit_price: f64,
    pub quantity: i32,
}

/// Filters for the admin order list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
}
