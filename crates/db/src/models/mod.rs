//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod dish;
pub mod favorite;
pub mod newsletter;
pub mod order;
pub mod profile;
pub mod promo_code;
pub mod push_subscription;
