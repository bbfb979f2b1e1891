//! Repository for the `dishes` table.

use pausedej_core::types::DbId;
use sqlx::PgPool;

use crate::models::dish::{CreateDish, Dish, DishFilter, UpdateDish};

const COLUMNS: &str = "id, name, description, price, category, dietary_tags, image_url, \
                       is_available, created_at, updated_at";

/// Provides CRUD operations for menu dishes.
pub struct DishRepo;

impl DishRepo {
    /// List dishes ordered by category then name.
    pub async fn list(pool: &PgPool, filter: &DishFilter) -> Result<Vec<Dish>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dishes
             WHERE ($1::TEXT IS NULL OR category = $1)
               AND (NOT $2 OR is_available)
             ORDER BY category, name"
        );
        sqlx::query_as::<_, Dish>(&query)
            .bind(&filter.category)
            .bind(filter.available_only)
            .fetch_all(pool)
            .await
    }

    /// Load several dishes at once. Missing ids are silently skipped.
    pub async fn find_many(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Dish>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dishes WHERE id = ANY($1)");
        sqlx::query_as::<_, Dish>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Dish>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dishes WHERE id = $1");
        sqlx::query_as::<_, Dish>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &PgPool, input: &CreateDish) -> Result<Dish, sqlx::Error> {
        let query = format!(
            "INSERT INTO dishes (name, description, price, category, dietary_tags, image_url, is_available)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dish>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price)
            .bind(&input.category)
            .bind(&input.dietary_tags)
            .bind(&input.image_url)
            .bind(input.is_available)
            .fetch_one(pool)
            .await
    }

    /// Partially update a dish. Returns `None` if it does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDish,
    ) -> Result<Option<Dish>, sqlx::Error> {
        let query = format!(
            "UPDATE dishes SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                category = COALESCE($5, category),
                dietary_tags = COALESCE($6, dietary_tags),
                image_url = COALESCE($7, image_url),
                is_available = COALESCE($8, is_available),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dish>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price)
            .bind(&input.category)
            .bind(&input.dietary_tags)
            .bind(&input.image_url)
            .bind(input.is_available)
            .fetch_optional(pool)
            .await
    }

    /// Delete a dish. Past order lines keep their snapshot.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dishes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
