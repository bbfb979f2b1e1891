//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod dish_repo;
pub mod favorite_repo;
pub mod newsletter_repo;
pub mod order_repo;
pub mod profile_repo;
pub mod promo_code_repo;
pub mod push_subscription_repo;

pub use dish_repo::DishRepo;
pub use favorite_repo::FavoriteRepo;
pub use newsletter_repo::{CampaignRepo, SubscriberRepo};
pub use order_repo::OrderRepo;
pub use profile_repo::ProfileRepo;
pub use promo_code_repo::PromoCodeRepo;
pub use push_subscription_repo::PushSubscriptionRepo;
