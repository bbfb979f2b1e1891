//! Administrator-managed promo codes.

use chrono::NaiveDate;
use pausedej_core::promo::{DiscountKind, PromoCode};
use pausedej_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `promo_codes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PromoCodeRow {
    pub id: DbId,
    pub code: String,
    /// `percentage` or `fixed`.
    pub discount_type: String,
    pub discount_value: f64,
    pub min_order: f64,
    pub max_discount: f64,
    pub is_active: bool,
    pub expires_on: Option<NaiveDate>,
    pub created_at: Timestamp,
}

impl PromoCodeRow {
    /// Convert to the promo engine's representation.
    ///
    /// Returns `None` for an unknown `discount_type`.
    pub fn to_promo(&self) -> Option<PromoCode> {
        let kind = match self.discount_type.as_str() {
            "percentage" => DiscountKind::Percentage(self.discount_value),
            "fixed" => DiscountKind::Fixed(self.discount_value),
            _ => return None,
        };
        Some(PromoCode {
            code: self.code.clone(),
            kind,
            min_order: self.min_order,
            max_discount: self.max_discount,
            active: self.is_active,
            expires_on: self.expires_on,
        })
    }
}
