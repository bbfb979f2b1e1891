//! Pause Dej' event bus and outbound notification channels.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`StoreEvent`]: "a row changed" envelope published by every write.
//! - [`delivery`]: email (Resend), SMS (Brevo) and Web Push clients.

pub mod bus;
pub mod delivery;

pub use bus::{ChangeAction, EventBus, StoreEvent};
pub use delivery::email::{EmailDelivery, ResendConfig};
pub use delivery::push::{PushDelivery, VapidConfig};
pub use delivery::sms::{BrevoConfig, SmsDelivery};
