//! Promo-code validation and discount computation.
//!
//! A [`PromoCatalog`] holds the codes known to the store: a fixed built-in
//! table, optionally overlaid with codes managed in the `promo_codes` table.
//! [`PromoCatalog::validate`] resolves a customer-entered code against an
//! order subtotal and either returns the discount to apply or a
//! [`PromoRejection`] whose `Display` is the message shown to the customer.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::pricing::round_money;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a promo code reduces the order subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DiscountKind {
    /// Percentage of the subtotal, e.g. `10.0` for 10 %.
    Percentage(f64),
    /// Fixed amount in euros.
    Fixed(f64),
}

/// A discount rule keyed by its code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromoCode {
    /// Normalised (trimmed, uppercase) code.
    pub code: String,
    pub kind: DiscountKind,
    /// Minimum subtotal required for the code to apply.
    pub min_order: f64,
    /// Upper bound of the discount, whatever the kind.
    pub max_discount: f64,
    pub active: bool,
    /// Last day the code is valid (inclusive). `None` never expires.
    pub expires_on: Option<NaiveDate>,
}

impl PromoCode {
    /// Discount this code grants on `subtotal`, before eligibility checks.
    ///
    /// Capped at `max_discount`, then at `subtotal`, and rounded to cents.
    pub fn discount_for(&self, subtotal: f64) -> f64 {
        let raw = match self.kind {
            DiscountKind::Percentage(pct) => subtotal * pct / 100.0,
            DiscountKind::Fixed(amount) => amount,
        };
        round_money(raw.min(self.max_discount).min(subtotal).max(0.0))
    }
}

/// A code that passed validation, with the discount it grants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedPromo {
    pub code: String,
    pub discount: f64,
    /// Subtotal after the discount.
    pub discounted_subtotal: f64,
}

/// Why a promo code was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PromoRejection {
    #[error("Code promo invalide")]
    Unknown,

    #[error("Ce code promo n'est plus actif")]
    Inactive,

    #[error("Ce code promo a expiré")]
    Expired,

    #[error("Montant minimum de commande : {minimum:.2} €")]
    BelowMinimum { minimum: f64 },
}

impl PromoRejection {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            PromoRejection::Unknown => "PROMO_UNKNOWN",
            PromoRejection::Inactive => "PROMO_INACTIVE",
            PromoRejection::Expired => "PROMO_EXPIRED",
            PromoRejection::BelowMinimum { .. } => "PROMO_BELOW_MINIMUM",
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Normalise a customer-entered code for lookup.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Lookup table of promo codes.
#[derive(Debug, Clone, Default)]
pub struct PromoCatalog {
    codes: HashMap<String, PromoCode>,
}

impl PromoCatalog {
    /// Build a catalog from a list of codes. Later entries win on duplicates.
    pub fn new(codes: impl IntoIterator<Item = PromoCode>) -> Self {
        let mut catalog = Self::default();
        catalog.extend(codes);
        catalog
    }

    /// The store's fixed code table.
    pub fn builtin() -> Self {
        Self::new([
            builtin_code("BIENVENUE10", DiscountKind::Percentage(10.0), 15.0, 10.0, true),
            builtin_code("PAUSE5", DiscountKind::Fixed(5.0), 20.0, 5.0, true),
            builtin_code("DEJ20", DiscountKind::Percentage(20.0), 30.0, 15.0, true),
            builtin_code("ETUDIANT15", DiscountKind::Percentage(15.0), 10.0, 8.0, true),
            builtin_code("LANCEMENT", DiscountKind::Percentage(25.0), 0.0, 20.0, false),
        ])
    }

    /// Add or replace codes.
    pub fn extend(&mut self, codes: impl IntoIterator<Item = PromoCode>) {
        for mut code in codes {
            code.code = normalize_code(&code.code);
            self.codes.insert(code.code.clone(), code);
        }
    }

    /// Find a code, ignoring case and surrounding whitespace.
    pub fn get(&self, code: &str) -> Option<&PromoCode> {
        self.codes.get(&normalize_code(code))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Validate `code` against an order `subtotal` on `today`.
    pub fn validate(
        &self,
        code: &str,
        subtotal: f64,
        today: NaiveDate,
    ) -> Result<AppliedPromo, PromoRejection> {
        let promo = self.get(code).ok_or(PromoRejection::Unknown)?;

        if !promo.active {
            return Err(PromoRejection::Inactive);
        }
        if promo.expires_on.is_some_and(|last_day| last_day < today) {
            return Err(PromoRejection::Expired);
        }
        if subtotal < promo.min_order {
            return Err(PromoRejection::BelowMinimum {
                minimum: promo.min_order,
            });
        }

        let discount = promo.discount_for(subtotal);
        Ok(AppliedPromo {
            code: promo.code.clone(),
            discount,
            discounted_subtotal: round_money(subtotal - discount),
        })
    }
}

fn builtin_code(
    code: &str,
    kind: DiscountKind,
    min_order: f64,
    max_discount: f64,
    active: bool,
) -> PromoCode {
    PromoCode {
        code: code.to_string(),
        kind,
        min_order,
        max_discount,
        active,
        expires_on: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    #[test]
    fn unknown_code_is_rejected() {
        let catalog = PromoCatalog::builtin();
        let err = catalog.validate("NOPE", 50.0, today()).unwrap_err();
        assert_eq!(err, PromoRejection::Unknown);
        assert_eq!(err.to_string(), "Code promo invalide");
    }

    #[test]
    fn inactive_code_is_rejected() {
        let catalog = PromoCatalog::builtin();
        let err = catalog.validate("LANCEMENT", 50.0, today()).unwrap_err();
        assert_eq!(err, PromoRejection::Inactive);
        assert_eq!(err.to_string(), "Ce code promo n'est plus actif");
    }

    #[test]
    fn expired_code_is_rejected() {
        let mut code = builtin_code("ETE", DiscountKind::Fixed(3.0), 0.0, 3.0, true);
        code.expires_on = NaiveDate::from_ymd_opt(2026, 3, 14);
        let catalog = PromoCatalog::new([code]);

        let err = catalog.validate("ete", 20.0, today()).unwrap_err();
        assert_eq!(err, PromoRejection::Expired);
        assert_eq!(err.to_string(), "Ce code promo a expiré");
    }

    #[test]
    fn code_is_valid_on_its_last_day() {
        let mut code = builtin_code("ETE", DiscountKind::Fixed(3.0), 0.0, 3.0, true);
        code.expires_on = Some(today());
        let catalog = PromoCatalog::new([code]);

        assert!(catalog.validate("ETE", 20.0, today()).is_ok());
    }

    #[test]
    fn below_minimum_is_rejected_with_amount() {
        let catalog = PromoCatalog::builtin();
        let err = catalog.validate("PAUSE5", 19.99, today()).unwrap_err();
        assert_eq!(err, PromoRejection::BelowMinimum { minimum: 20.0 });
        assert_eq!(err.to_string(), "Montant minimum de commande : 20.00 €");
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let catalog = PromoCatalog::builtin();
        let applied = catalog.validate("  bienvenue10 ", 40.0, today()).unwrap();
        assert_eq!(applied.code, "BIENVENUE10");
        assert_eq!(applied.discount, 4.0);
        assert_eq!(applied.discounted_subtotal, 36.0);
    }

    #[test]
    fn percentage_discount_is_capped() {
        let catalog = PromoCatalog::builtin();
        // 20 % of 100 = 20, capped at 15.
        let applied = catalog.validate("DEJ20", 100.0, today()).unwrap();
        assert_eq!(applied.discount, 15.0);
    }

    #[test]
    fn percentage_discount_is_rounded_to_cents() {
        let catalog = PromoCatalog::builtin();
        // 15 % of 12.34 = 1.851.
        let applied = catalog.validate("ETUDIANT15", 12.34, today()).unwrap();
        assert_eq!(applied.discount, 1.85);
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() {
        let code = builtin_code("GROS", DiscountKind::Fixed(50.0), 0.0, 50.0, true);
        let catalog = PromoCatalog::new([code]);
        let applied = catalog.validate("GROS", 12.0, today()).unwrap();
        assert_eq!(applied.discount, 12.0);
        assert_eq!(applied.discounted_subtotal, 0.0);
    }

    #[test]
    fn discount_never_exceeds_max_or_total() {
        let catalog = PromoCatalog::builtin();
        for code in ["BIENVENUE10", "PAUSE5", "DEJ20", "ETUDIANT15"] {
            let promo = catalog.get(code).unwrap().clone();
            for subtotal in [promo.min_order, 25.0, 42.5, 80.0, 250.0] {
                if subtotal < promo.min_order {
                    continue;
                }
                let applied = catalog.validate(code, subtotal, today()).unwrap();
                assert!(applied.discount <= promo.max_discount, "{code} @ {subtotal}");
                assert!(applied.discount <= subtotal, "{code} @ {subtotal}");
                assert!(applied.discount >= 0.0);
            }
        }
    }

    #[test]
    fn later_entries_override_builtin_codes() {
        let mut catalog = PromoCatalog::builtin();
        let mut disabled = catalog.get("PAUSE5").unwrap().clone();
        disabled.active = false;
        catalog.extend([disabled]);

        assert_eq!(
            catalog.validate("PAUSE5", 30.0, today()).unwrap_err(),
            PromoRejection::Inactive
        );
    }

    #[test]
    fn rejection_codes_are_stable() {
        assert_eq!(PromoRejection::Unknown.code(), "PROMO_UNKNOWN");
        assert_eq!(
            PromoRejection::BelowMinimum { minimum: 1.0 }.code(),
            "PROMO_BELOW_MINIMUM"
        );
    }
}
