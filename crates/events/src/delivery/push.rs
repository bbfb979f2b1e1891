//! Browser notifications through Web Push (VAPID, aes128gcm payloads).

use pausedej_core::templates::PushPayload;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushError, WebPushMessageBuilder,
};

/// Seconds a push service keeps an undelivered notification.
const PUSH_TTL_SECS: u32 = 60 * 60;

const DEFAULT_SUBJECT: &str = "mailto:contact@pausedej.fr";

/// Error type for push delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The push service answered 404 or 410: the browser dropped the
    /// subscription and it must not be used again.
    #[error("Push subscription is gone")]
    Gone,

    #[error("Web Push error: {0}")]
    WebPush(WebPushError),

    #[error("Payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}

impl PushError {
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone)
    }
}

impl From<WebPushError> for PushError {
    fn from(err: WebPushError) -> Self {
        match err {
            WebPushError::EndpointNotFound { .. } | WebPushError::EndpointNotValid { .. } => {
                Self::Gone
            }
            other => Self::WebPush(other),
        }
    }
}

/// VAPID credentials.
#[derive(Debug, Clone)]
pub struct VapidConfig {
    /// URL-safe base64 private key (raw 32-byte P-256 scalar).
    pub private_key: String,
    /// Contact URI sent to push services.
    pub subject: String,
}

impl VapidConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `VAPID_PRIVATE_KEY` is not set.
    ///
    /// | Variable            | Required | Default                       |
    /// |---------------------|----------|-------------------------------|
    /// | `VAPID_PRIVATE_KEY` | yes      | --                            |
    /// | `VAPID_SUBJECT`     | no       | `mailto:contact@pausedej.fr`  |
    pub fn from_env() -> Option<Self> {
        let private_key = std::env::var("VAPID_PRIVATE_KEY").ok()?;
        Some(Self {
            private_key,
            subject: std::env::var("VAPID_SUBJECT").unwrap_or_else(|_| DEFAULT_SUBJECT.to_string()),
        })
    }
}

/// Target of one push: the browser subscription keys.
#[derive(Debug, Clone)]
pub struct PushTarget<'a> {
    pub endpoint: &'a str,
    pub p256dh: &'a str,
    pub auth: &'a str,
}

/// Sends encrypted notifications to browser push services.
pub struct PushDelivery {
    client: IsahcWebPushClient,
    config: VapidConfig,
}

impl PushDelivery {
    pub fn new(config: VapidConfig) -> Result<Self, PushError> {
        Ok(Self {
            client: IsahcWebPushClient::new()?,
            config,
        })
    }

    /// Encrypt and send `payload` to one subscription.
    ///
    /// A subscription the push service no longer knows fails with
    /// [`PushError::Gone`].
    pub async fn send(
        &self,
        target: &PushTarget<'_>,
        payload: &PushPayload,
    ) -> Result<(), PushError> {
        let subscription = SubscriptionInfo::new(target.endpoint, target.p256dh, target.auth);
        let content = serde_json::to_vec(payload)?;

        let mut signature =
            VapidSignatureBuilder::from_base64(&self.config.private_key, &subscription)?;
        signature.add_claim("sub", self.config.subject.as_str());

        let mut builder = WebPushMessageBuilder::new(&subscription);
        builder.set_ttl(PUSH_TTL_SECS);
        builder.set_payload(ContentEncoding::Aes128Gcm, &content);
        builder.set_vapid_signature(signature.build()?);

        self.client.send(builder.build()?).await?;
        tracing::debug!(endpoint = target.endpoint, title = %payload.title, "Push sent");
        Ok(())
    }
}
