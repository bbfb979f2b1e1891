//! Transactional email through the Resend HTTP API.
//!
//! [`EmailDelivery`] posts one rendered email per call to
//! `POST {api_base}/emails`. If `RESEND_API_KEY` is not set,
//! [`ResendConfig::from_env`] returns `None` and no client is constructed.

use pausedej_core::templates::{RenderedEmail, STORE_NAME};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// The HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Resend answered with a non-2xx status.
    #[error("Resend API error ({status}): {body}")]
    Api { status: u16, body: String },
}

// ---------------------------------------------------------------------------
// ResendConfig
// ---------------------------------------------------------------------------

const DEFAULT_API_BASE: &str = "https://api.resend.com";

const DEFAULT_FROM_ADDRESS: &str = "commandes@pausedej.fr";

/// Configuration for the Resend client.
#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    /// RFC 5322 "From" value, e.g. `Pause Dej' <commandes@pausedej.fr>`.
    pub from: String,
    pub api_base: String,
}

impl ResendConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `RESEND_API_KEY` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable         | Required | Default                                   |
    /// |------------------|----------|-------------------------------------------|
    /// | `RESEND_API_KEY` | yes      | --                                        |
    /// | `EMAIL_FROM`     | no       | `Pause Dej' <commandes@pausedej.fr>`      |
    /// | `RESEND_API_URL` | no       | `https://api.resend.com`                  |
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("RESEND_API_KEY").ok()?;
        Some(Self {
            api_key,
            from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| format!("{STORE_NAME} <{DEFAULT_FROM_ADDRESS}>")),
            api_base: std::env::var("RESEND_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Sends rendered emails through Resend.
pub struct EmailDelivery {
    client: reqwest::Client,
    config: ResendConfig,
}

impl EmailDelivery {
    pub fn new(config: ResendConfig) -> Result<Self, EmailError> {
        Ok(Self {
            client: super::http_client()?,
            config,
        })
    }

    /// JSON body of the Resend "send email" call.
    fn request_body(&self, to: &str, email: &RenderedEmail) -> serde_json::Value {
        serde_json::json!({
            "from": self.config.from,
            "to": [to],
            "subject": email.subject,
            "html": email.html,
            "text": email.text,
        })
    }

    /// Send one email. Returns the Resend message id.
    pub async fn send(&self, to: &str, email: &RenderedEmail) -> Result<String, EmailError> {
        let url = format!("{}/emails", self.config.api_base.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(to, email))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let sent: SendEmailResponse = response.json().await?;
        tracing::info!(to, subject = %email.subject, message_id = %sent.id, "Email sent");
        Ok(sent.id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
