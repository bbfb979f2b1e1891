//! Order totals: subtotal, delivery fee, discount and grand total.
//!
//! Amounts are euros held in `f64` and rounded to cents at every step that
//! is shown to a customer or sent to the payment provider.

use serde::Serialize;

use crate::order::DeliveryMode;

/// Flat delivery fee for home delivery below the free-delivery threshold.
pub const DELIVERY_FEE: f64 = 2.50;

/// Subtotal from which home delivery is free.
pub const FREE_DELIVERY_THRESHOLD: f64 = 30.0;

/// Minor units per euro (Stripe amounts are in cents).
const CENTS_PER_EURO: f64 = 100.0;

/// A priced order line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricedLine {
    pub unit_price: f64,
    pub quantity: i32,
}

/// Computed monetary breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub discount: f64,
    pub total: f64,
}

/// Round an amount to two decimals (cents).
pub fn round_money(amount: f64) -> f64 {
    (amount * CENTS_PER_EURO).round() / CENTS_PER_EURO
}

/// Convert a euro amount to integer cents.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * CENTS_PER_EURO).round() as i64
}

/// Sum of `unit_price × quantity` over all lines, rounded to cents.
pub fn subtotal(lines: &[PricedLine]) -> f64 {
    round_money(
        lines
            .iter()
            .map(|l| l.unit_price * f64::from(l.quantity))
            .sum(),
    )
}

/// Delivery fee for the given mode and subtotal.
pub fn delivery_fee(mode: DeliveryMode, subtotal: f64) -> f64 {
    match mode {
        DeliveryMode::Pickup => 0.0,
        DeliveryMode::Delivery if subtotal >= FREE_DELIVERY_THRESHOLD => 0.0,
        DeliveryMode::Delivery => DELIVERY_FEE,
    }
}

/// Compute the full breakdown of an order.
///
/// The discount is clamped to `[0, subtotal]` so the delivery fee is never
/// discounted and the total never goes negative.
pub fn compute_totals(lines: &[PricedLine], mode: DeliveryMode, discount: f64) -> OrderTotals {
    let subtotal = subtotal(lines);
    let delivery_fee = delivery_fee(mode, subtotal);
    let discount = round_money(discount.clamp(0.0, subtotal));
    let total = round_money(subtotal - discount + delivery_fee);

    OrderTotals {
        subtotal,
        delivery_fee,
        discount,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(unit_price: f64, quantity: i32) -> PricedLine {
        PricedLine {
            unit_price,
            quantity,
        }
    }

    #[test]
    fn subtotal_sums_lines() {
        let lines = [line(9.90, 2), line(3.50, 1)];
        assert_eq!(subtotal(&lines), 23.30);
    }

    #[test]
    fn pickup_has_no_delivery_fee() {
        let totals = compute_totals(&[line(8.0, 1)], DeliveryMode::Pickup, 0.0);
        assert_eq!(totals.delivery_fee, 0.0);
        assert_eq!(totals.total, 8.0);
    }

    #[test]
    fn delivery_fee_below_threshold() {
        let totals = compute_totals(&[line(12.0, 2)], DeliveryMode::Delivery, 0.0);
        assert_eq!(totals.subtotal, 24.0);
        assert_eq!(totals.delivery_fee, DELIVERY_FEE);
        assert_eq!(totals.total, 26.5);
    }

    #[test]
    fn delivery_is_free_from_threshold() {
        let totals = compute_totals(&[line(15.0, 2)], DeliveryMode::Delivery, 0.0);
        assert_eq!(totals.delivery_fee, 0.0);
        assert_eq!(totals.total, 30.0);
    }

    #[test]
    fn discount_is_applied_before_delivery_fee() {
        let totals = compute_totals(&[line(10.0, 2)], DeliveryMode::Delivery, 5.0);
        assert_eq!(totals.discount, 5.0);
        assert_eq!(totals.total, 17.5);
    }

    #[test]
    fn discount_never_exceeds_subtotal() {
        let totals = compute_totals(&[line(4.0, 1)], DeliveryMode::Delivery, 10.0);
        assert_eq!(totals.discount, 4.0);
        assert_eq!(totals.total, DELIVERY_FEE);
    }

    #[test]
    fn negative_discount_is_ignored() {
        let totals = compute_totals(&[line(4.0, 1)], DeliveryMode::Pickup, -3.0);
        assert_eq!(totals.discount, 0.0);
        assert_eq!(totals.total, 4.0);
    }

    #[test]
    fn minor_units_are_whole_cents() {
        assert_eq!(to_minor_units(19.99), 1999);
        assert_eq!(to_minor_units(0.1 + 0.2), 30);
        assert_eq!(to_minor_units(26.5), 2650);
    }

    #[test]
    fn round_money_removes_float_noise() {
        assert_eq!(round_money(0.1 + 0.2), 0.3);
    }
}
