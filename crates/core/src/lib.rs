//! Domain logic for the Pause Dej' storefront.
//!
//! Everything in this crate is pure: no database, no network. The API crate
//! loads rows, hands them to these functions, and persists the results.

pub mod channels;
pub mod error;
pub mod order;
pub mod phone;
pub mod pricing;
pub mod promo;
pub mod recommendation;
pub mod roles;
pub mod templates;
pub mod types;
