//! Repository for the `orders` and `order_items` tables.

use pausedej_core::types::DbId;
use sqlx::PgPool;

use crate::models::order::{HistoryRow, NewOrder, Order, OrderFilter, OrderItem, OrderWithItems};

/// Column list for `orders` queries.
const COLUMNS: &str = "\
    id, user_id, status, payment_status, delivery_mode, delivery_address, \
    requested_time, phone, notes, subtotal, delivery_fee, discount, total, \
    promo_code, payment_intent_id, created_at, updated_at";

/// Column list for `order_items` queries.
const ITEM_COLUMNS: &str = "id, order_id, dish_id, dish_name, unit_price, quantity";

/// Provides data access for orders and their lines.
pub struct OrderRepo;

impl OrderRepo {
    /// Insert an order and all its lines in one transaction.
    pub async fn create(pool: &PgPool, input: &NewOrder) -> Result<OrderWithItems, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO orders (user_id, delivery_mode, delivery_address, requested_time, phone, \
                                 notes, subtotal, delivery_fee, discount, total, promo_code) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(input.user_id)
            .bind(&input.delivery_mode)
            .bind(&input.delivery_address)
            .bind(input.requested_time)
            .bind(&input.phone)
            .bind(&input.notes)
            .bind(input.subtotal)
            .bind(input.delivery_fee)
            .bind(input.discount)
            .bind(input.total)
            .bind(&input.promo_code)
            .fetch_one(&mut *tx)
            .await?;

        let item_query = format!(
            "INSERT INTO order_items (order_id, dish_id, dish_name, unit_price, quantity) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ITEM_COLUMNS}"
        );
        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, OrderItem>(&item_query)
                .bind(order.id)
                .bind(item.dish_id)
                .bind(&item.dish_name)
                .bind(item.unit_price)
                .bind(item.quantity)
                .fetch_one(&mut *tx)
                .await?;
            items.push(row);
        }

        tx.commit().await?;
        Ok(OrderWithItems { order, items })
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the order a Stripe PaymentIntent was created for.
    pub async fn find_by_payment_intent(
        pool: &PgPool,
        payment_intent_id: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE payment_intent_id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(payment_intent_id)
            .fetch_optional(pool)
            .await
    }

    /// Lines of one order, in insertion order.
    pub async fn list_items(pool: &PgPool, order_id: DbId) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query =
            format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// Load an order with its lines.
    pub async fn find_with_items(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<OrderWithItems>, sqlx::Error> {
        let Some(order) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let items = Self::list_items(pool, id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    /// A customer's orders, most recent first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// All orders, optionally filtered by status, most recent first.
    pub async fn list(pool: &PgPool, filter: &OrderFilter) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(&filter.status)
            .fetch_all(pool)
            .await
    }

    /// Set the fulfilment status. Returns `None` if the order does not exist.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Set the payment status, and optionally the fulfilment status with it.
    pub async fn update_payment_status(
        pool: &PgPool,
        id: DbId,
        payment_status: &str,
        status: Option<&str>,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET \
                 payment_status = $2, \
                 status = COALESCE($3, status), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(payment_status)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Record the PaymentIntent created for an order.
    pub async fn set_payment_intent(
        pool: &PgPool,
        id: DbId,
        payment_intent_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE orders SET payment_intent_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(payment_intent_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Every (dish, quantity) line of a customer's non-cancelled orders.
    pub async fn history_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<HistoryRow>, sqlx::Error> {
        sqlx::query_as::<_, HistoryRow>(
            "SELECT oi.dish_id, oi.quantity \
             FROM order_items oi \
             JOIN orders o ON o.id = oi.order_id \
             WHERE o.user_id = $1 AND o.status <> 'cancelled' AND oi.dish_id IS NOT NULL",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
