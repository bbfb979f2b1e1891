//! Promo-code validation for the checkout page.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use pausedej_core::promo::PromoCatalog;
use pausedej_db::repositories::PromoCodeRepo;
use pausedej_db::DbPool;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /promo/validate`.
#[derive(Debug, Deserialize, Validate)]
pub struct ValidatePromoRequest {
    #[validate(length(min = 1, max = 40))]
    pub code: String,
    /// Cart subtotal in euros, before delivery.
    #[validate(range(min = 0.0))]
    pub subtotal: f64,
}

/// The built-in codes overlaid with the rows of `promo_codes`.
///
/// A database row with the same code replaces the built-in one, so codes can
/// be disabled or re-tuned without a deploy. Rows with an unknown discount
/// type are skipped.
pub async fn load_catalog(pool: &DbPool) -> AppResult<PromoCatalog> {
    let rows = PromoCodeRepo::list(pool).await?;
    let mut catalog = PromoCatalog::builtin();
    catalog.extend(rows.iter().filter_map(|row| {
        let promo = row.to_promo();
        if promo.is_none() {
            tracing::warn!(code = %row.code, kind = %row.discount_type, "Skipping promo code");
        }
        promo
    }));
    Ok(catalog)
}

/// POST /api/v1/promo/validate
///
/// Preview the discount a code grants on a subtotal. A refused code answers
/// 422 with a `PROMO_*` error code and a customer-facing message.
pub async fn validate_promo(
    State(state): State<AppState>,
    Json(input): Json<ValidatePromoRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let catalog = load_catalog(&state.pool).await?;
    let applied = catalog.validate(&input.code, input.subtotal, Utc::now().date_naive())?;

    tracing::debug!(code = %applied.code, discount = applied.discount, "Promo code validated");

    Ok(Json(DataResponse { data: applied }))
}
