//! Card payments through Stripe.
//!
//! - [`PaymentGateway`]: the seam handlers talk to, implemented by
//!   [`StripeClient`] in production and by fakes in tests.
//! - [`webhook`]: `Stripe-Signature` verification and event parsing.

pub mod error;
pub mod gateway;
pub mod stripe;
pub mod webhook;

pub use error::PaymentError;
pub use gateway::{PaymentGateway, PaymentIntent, PaymentIntentRequest};
pub use stripe::{StripeClient, StripeConfig};
