//! Repository for the `promo_codes` table.

use sqlx::PgPool;

use crate::models::promo_code::PromoCodeRow;

/// Provides read access to administrator-managed promo codes.
pub struct PromoCodeRepo;

impl PromoCodeRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<PromoCodeRow>, sqlx::Error> {
        sqlx::query_as::<_, PromoCodeRow>(
            "SELECT id, code, discount_type, discount_value, min_order, max_discount, \
                    is_active, expires_on, created_at \
             FROM promo_codes ORDER BY code",
        )
        .fetch_all(pool)
        .await
    }
}
