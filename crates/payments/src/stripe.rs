//! REST client for the Stripe PaymentIntents API.
//!
//! Stripe takes form-encoded bodies with bracketed keys for nested fields
//! (`metadata[order_id]=42`) and authenticates with the secret key as a
//! bearer token.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::PaymentError;
use crate::gateway::{PaymentGateway, PaymentIntent, PaymentIntentRequest};

const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Stripe credentials.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    /// `whsec_...` secret of the webhook endpoint. Without it, webhooks
    /// are refused.
    pub webhook_secret: Option<String>,
    pub api_base: String,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `STRIPE_SECRET_KEY` is not set.
    ///
    /// | Variable                | Required | Default                        |
    /// |-------------------------|----------|--------------------------------|
    /// | `STRIPE_SECRET_KEY`     | yes      | --                             |
    /// | `STRIPE_WEBHOOK_SECRET` | no       | --                             |
    /// | `STRIPE_API_URL`        | no       | `https://api.stripe.com/v1`    |
    pub fn from_env() -> Option<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY").ok()?;
        Some(Self {
            secret_key,
            webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
            api_base: std::env::var("STRIPE_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        })
    }
}

/// HTTP client for Stripe.
pub struct StripeClient {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Form fields of `POST /payment_intents`.
    fn intent_form(request: &PaymentIntentRequest) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[order_id]", request.order_id.to_string()),
        ];
        if let Some(email) = &request.receipt_email {
            form.push(("receipt_email", email.clone()));
        }
        form
    }

    /// Same order and amount map to the same PaymentIntent.
    fn idempotency_key(request: &PaymentIntentRequest) -> String {
        format!("pausedej-order-{}-{}", request.order_id, request.amount)
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PaymentError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .client
            .post(format!("{}/payment_intents", self.config.api_base.trim_end_matches('/')))
            .bearer_auth(&self.config.secret_key)
            .header("Idempotency-Key", Self::idempotency_key(request))
            .form(&Self::intent_form(request))
            .send()
            .await?;

        let intent: PaymentIntent = Self::parse_response(response).await?;
        tracing::info!(
            order_id = request.order_id,
            payment_intent_id = %intent.id,
            amount = intent.amount,
            "Stripe PaymentIntent created",
        );
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(receipt_email: Option<&str>) -> PaymentIntentRequest {
        PaymentIntentRequest {
            order_id: 42,
            amount: 2650,
            currency: "eur".into(),
            receipt_email: receipt_email.map(String::from),
        }
    }

    #[test]
    fn intent_form_uses_bracketed_keys() {
        let form = StripeClient::intent_form(&request(Some("camille@example.com")));
        assert!(form.contains(&("amount", "2650".to_string())));
        assert!(form.contains(&("currency", "eur".to_string())));
        assert!(form.contains(&("automatic_payment_methods[enabled]", "true".to_string())));
        assert!(form.contains(&("metadata[order_id]", "42".to_string())));
        assert!(form.contains(&("receipt_email", "camille@example.com".to_string())));
    }

    #[test]
    fn receipt_email_is_optional() {
        let form = StripeClient::intent_form(&request(None));
        assert!(form.iter().all(|(k, _)| *k != "receipt_email"));
    }

    #[test]
    fn idempotency_key_depends_on_order_and_amount() {
        let a = StripeClient::idempotency_key(&request(None));
        let mut other = request(None);
        other.amount = 2700;
        assert_eq!(a, "pausedej-order-42-2650");
        assert_ne!(a, StripeClient::idempotency_key(&other));
    }

    #[test]
    fn api_error_display() {
        let err = PaymentError::Api {
            status: 402,
            body: "card_declined".into(),
        };
        assert_eq!(err.to_string(), "Stripe API error (402): card_declined");
    }
}
