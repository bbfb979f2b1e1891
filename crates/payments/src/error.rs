/// Errors from the payment provider layer.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Stripe returned a non-2xx status code.
    #[error("Stripe API error ({status}): {body}")]
    Api {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A webhook's `Stripe-Signature` header is missing, malformed, stale
    /// or does not match the payload.
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// A webhook payload or API response could not be decoded.
    #[error("Invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}
