use async_trait::async_trait;
use pausedej_core::types::DbId;
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

/// What to charge for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    pub order_id: DbId,
    /// Amount in minor units (cents).
    pub amount: i64,
    /// Lowercase ISO currency code.
    pub currency: String,
    pub receipt_email: Option<String>,
}

/// A PaymentIntent as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Handed to the browser to confirm the card payment.
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

/// Creates payment intents with a card payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;
}
