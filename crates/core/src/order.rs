//! Order, payment and delivery status vocabularies plus order validation.
//!
//! Statuses are stored as snake_case `TEXT` in the database. Transitions are
//! not restricted: the store operates on last-write-wins and any status may
//! be set by an administrator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum number of distinct lines in one order.
pub const MAX_ORDER_LINES: usize = 50;

/// Maximum quantity of a single dish in one order line.
pub const MAX_LINE_QUANTITY: i32 = 20;

// ---------------------------------------------------------------------------
// Text-backed enums
// ---------------------------------------------------------------------------

macro_rules! define_text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The value stored in the database.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(CoreError::Validation(format!(
                        "Unknown {} '{other}'",
                        $label
                    ))),
                }
            }
        }
    };
}

define_text_enum! {
    /// Fulfilment status of an order.
    OrderStatus ("order status") {
        Pending => "pending",
        Confirmed => "confirmed",
        Preparing => "preparing",
        Ready => "ready",
        Delivering => "delivering",
        Delivered => "delivered",
        Cancelled => "cancelled",
    }
}

define_text_enum! {
    /// Payment status of an order, driven by Stripe webhooks.
    PaymentStatus ("payment status") {
        Pending => "pending",
        Paid => "paid",
        Failed => "failed",
        Refunded => "refunded",
    }
}

define_text_enum! {
    /// How the customer receives the order.
    DeliveryMode ("delivery mode") {
        Delivery => "delivery",
        Pickup => "pickup",
    }
}

impl OrderStatus {
    /// Customers may cancel their own order only before the kitchen confirms it.
    pub fn customer_can_cancel(self) -> bool {
        self == OrderStatus::Pending
    }

    /// French label shown to customers in notifications.
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "En attente",
            OrderStatus::Confirmed => "Confirmée",
            OrderStatus::Preparing => "En préparation",
            OrderStatus::Ready => "Prête",
            OrderStatus::Delivering => "En livraison",
            OrderStatus::Delivered => "Livrée",
            OrderStatus::Cancelled => "Annulée",
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Requested line of a new order, before prices are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RequestedLine {
    pub dish_id: crate::types::DbId,
    pub quantity: i32,
}

/// Validate the shape of an order request.
///
/// Checks line count, per-line quantity, duplicate dishes and that a
/// delivery address is present for home delivery.
pub fn validate_order_request(
    lines: &[RequestedLine],
    mode: DeliveryMode,
    delivery_address: Option<&str>,
) -> Result<(), CoreError> {
    if lines.is_empty() {
        return Err(CoreError::Validation(
            "An order must contain at least one dish".into(),
        ));
    }
    if lines.len() > MAX_ORDER_LINES {
        return Err(CoreError::Validation(format!(
            "An order may contain at most {MAX_ORDER_LINES} lines"
        )));
    }

    let mut seen = std::collections::HashSet::with_capacity(lines.len());
    for line in lines {
        if !(1..=MAX_LINE_QUANTITY).contains(&line.quantity) {
            return Err(CoreError::Validation(format!(
                "Quantity for dish {} must be between 1 and {MAX_LINE_QUANTITY}",
                line.dish_id
            )));
        }
        if !seen.insert(line.dish_id) {
            return Err(CoreError::Validation(format!(
                "Dish {} appears more than once",
                line.dish_id
            )));
        }
    }

    if mode == DeliveryMode::Delivery
        && delivery_address.map(str::trim).unwrap_or_default().is_empty()
    {
        return Err(CoreError::Validation(
            "A delivery address is required for home delivery".into(),
        ));
    }

    Ok(())
}
