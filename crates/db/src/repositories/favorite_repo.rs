//! Repository for the `favorites` table.

use pausedej_core::types::DbId;
use sqlx::PgPool;

use crate::models::dish::Dish;
use crate::models::favorite::Favorite;

/// Provides data access for customer favorites.
pub struct FavoriteRepo;

impl FavoriteRepo {
    /// Mark a dish as favorite. Idempotent: returns the existing row when
    /// the dish is already a favorite.
    pub async fn add(pool: &PgPool, user_id: DbId, dish_id: DbId) -> Result<Favorite, sqlx::Error> {
        sqlx::query_as::<_, Favorite>(
            "INSERT INTO favorites (user_id, dish_id) VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_favorites_user_dish \
                 DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING id, user_id, dish_id, created_at",
        )
        .bind(user_id)
        .bind(dish_id)
        .fetch_one(pool)
        .await
    }

    /// Returns the id of the removed favorite, `None` if there was none.
    pub async fn remove(
        pool: &PgPool,
        user_id: DbId,
        dish_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "DELETE FROM favorites WHERE user_id = $1 AND dish_id = $2 RETURNING id",
        )
        .bind(user_id)
        .bind(dish_id)
        .fetch_optional(pool)
        .await
    }

    /// Favorite dish ids of a customer.
    pub async fn dish_ids_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("SELECT dish_id FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Favorite dishes of a customer, most recently added first.
    pub async fn list_dishes(pool: &PgPool, user_id: DbId) -> Result<Vec<Dish>, sqlx::Error> {
        sqlx::query_as::<_, Dish>(
            "SELECT d.id, d.name, d.description, d.price, d.category, d.dietary_tags, \
                    d.image_url, d.is_available, d.created_at, d.updated_at \
             FROM favorites f JOIN dishes d ON d.id = f.dish_id \
             WHERE f.user_id = $1 \
             ORDER BY f.created_at DESC, f.id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
