//! Transactional SMS through the Brevo HTTP API.

use pausedej_core::error::CoreError;
use pausedej_core::phone::normalize_phone;
use serde::Serialize;

/// Error type for SMS delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(#[from] CoreError),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Brevo API error ({status}): {body}")]
    Api { status: u16, body: String },
}

const DEFAULT_API_BASE: &str = "https://api.brevo.com/v3";

/// Brevo limits alphanumeric senders to 11 characters.
const DEFAULT_SENDER: &str = "PauseDej";

/// Configuration for the Brevo client.
#[derive(Debug, Clone)]
pub struct BrevoConfig {
    pub api_key: String,
    pub sender: String,
    pub api_base: String,
}

impl BrevoConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `BREVO_API_KEY` is not set.
    ///
    /// | Variable        | Required | Default                     |
    /// |-----------------|----------|-----------------------------|
    /// | `BREVO_API_KEY` | yes      | --                          |
    /// | `SMS_SENDER`    | no       | `PauseDej`                  |
    /// | `BREVO_API_URL` | no       | `https://api.brevo.com/v3`  |
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("BREVO_API_KEY").ok()?;
        Some(Self {
            api_key,
            sender: std::env::var("SMS_SENDER").unwrap_or_else(|_| DEFAULT_SENDER.to_string()),
            api_base: std::env::var("BREVO_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        })
    }
}

/// Body of `POST /transactionalSMS/sms`.
#[derive(Debug, Serialize)]
struct SendSmsRequest<'a> {
    sender: &'a str,
    recipient: String,
    content: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Sends transactional SMS through Brevo.
pub struct SmsDelivery {
    client: reqwest::Client,
    config: BrevoConfig,
}

impl SmsDelivery {
    pub fn new(config: BrevoConfig) -> Result<Self, SmsError> {
        Ok(Self {
            client: super::http_client()?,
            config,
        })
    }

    fn request<'a>(
        &'a self,
        phone: &str,
        content: &'a str,
    ) -> Result<SendSmsRequest<'a>, SmsError> {
        Ok(SendSmsRequest {
            sender: &self.config.sender,
            recipient: normalize_phone(phone)?,
            content,
            kind: "transactional",
        })
    }

    /// Send `content` to `phone`. The number is normalised first; an
    /// unusable number fails without calling Brevo.
    pub async fn send(&self, phone: &str, content: &str) -> Result<(), SmsError> {
        let body = self.request(phone, content)?;
        let url = format!(
            "{}/transactionalSMS/sms",
            self.config.api_base.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SmsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(recipient = %body.recipient, "SMS sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery() -> SmsDelivery {
        SmsDelivery::new(BrevoConfig {
            api_key: "xkeysib-test".into(),
            sender: DEFAULT_SENDER.into(),
            api_base: DEFAULT_API_BASE.into(),
        })
        .unwrap()
    }

    #[test]
    fn request_normalises_recipient() {
        let sms = delivery();
        let req = sms.request("06 12 34 56 78", "Votre commande est prête").unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["recipient"], "33612345678");
        assert_eq!(json["sender"], "PauseDej");
        assert_eq!(json["type"], "transactional");
        assert_eq!(json["content"], "Votre commande est prête");
    }

    #[test]
    fn invalid_phone_is_rejected_before_sending() {
        let sms = delivery();
        let err = sms.request("123", "hello").unwrap_err();
        assert!(matches!(err, SmsError::InvalidRecipient(_)));
    }
}
