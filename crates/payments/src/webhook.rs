//! Stripe webhook verification and parsing.
//!
//! Stripe signs each delivery with HMAC-SHA256 over `"{timestamp}.{body}"`
//! and sends `Stripe-Signature: t=<unix>,v1=<hex>[,v1=<hex>...]`. A
//! delivery is accepted when any `v1` signature matches and the timestamp
//! is within [`SIGNATURE_TOLERANCE_SECS`] of now.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age (and clock skew) of a signed delivery.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const EVENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

fn invalid(reason: &str) -> PaymentError {
    PaymentError::InvalidSignature(reason.to_string())
}

fn mac_for(secret: &str, timestamp: &str, payload: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Compute the `v1` signature Stripe would send for `payload` at `timestamp`.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mac = mac_for(secret, &timestamp.to_string(), payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a `Stripe-Signature` header against the raw request body.
///
/// `now` is the current unix time in seconds.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| invalid("missing timestamp"))?;
    if signatures.is_empty() {
        return Err(invalid("missing v1 signature"));
    }
    let signed_at: i64 = timestamp
        .parse()
        .map_err(|_| invalid("malformed timestamp"))?;
    if (now - signed_at).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(invalid("timestamp outside tolerance"));
    }

    let mac = mac_for(secret, timestamp, payload);
    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate).is_some_and(|bytes| mac.clone().verify_slice(&bytes).is_ok())
    });
    if matched {
        Ok(())
    } else {
        Err(invalid("no matching signature"))
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A Stripe event envelope. Only the fields the store acts on are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: PaymentIntentObject,
}

/// The `data.object` of a `payment_intent.*` event.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentObject {
    pub id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntentObject {
    /// Order id recorded in the intent metadata at creation.
    pub fn order_id(&self) -> Option<i64> {
        self.metadata.get("order_id")?.parse().ok()
    }
}

/// Verify and decode a webhook delivery.
pub fn parse_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<WebhookEvent, PaymentError> {
    verify_signature(payload, header, secret, now)?;
    Ok(serde_json::from_slice(payload)?)
}

// ---------------------------------------------------------------------------
// hex helper (no extra dep)
// ---------------------------------------------------------------------------

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string. `None` on odd length or a non-hex digit.
    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_760_000_000;

    fn payload() -> Vec<u8> {
        serde_json::json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": { "object": {
                "id": "pi_123",
                "amount": 2650,
                "metadata": { "order_id": "42" }
            }}
        })
        .to_string()
        .into_bytes()
    }

    fn header_for(body: &[u8], timestamp: i64) -> String {
        format!("t={timestamp},v1={}", compute_signature(SECRET, timestamp, body))
    }

    #[test]
    fn valid_signature_is_accepted() {
        let body = payload();
        let header = header_for(&body, NOW);
        assert!(verify_signature(&body, &header, SECRET, NOW).is_ok());
    }

    #[test]
    fn any_matching_v1_is_enough() {
        let body = payload();
        let header = format!(
            "t={NOW},v1=deadbeef,v1={}",
            compute_signature(SECRET, NOW, &body)
        );
        assert!(verify_signature(&body, &header, SECRET, NOW).is_ok());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let body = payload();
        let header = header_for(&body, NOW);
        let mut tampered = body.clone();
        tampered.extend_from_slice(b" ");
        assert_matches!(
            verify_signature(&tampered, &header, SECRET, NOW),
            Err(PaymentError::InvalidSignature(_))
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let body = payload();
        let header = header_for(&body, NOW);
        assert!(verify_signature(&body, &header, "whsec_other", NOW).is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let body = payload();
        let signed_at = NOW - SIGNATURE_TOLERANCE_SECS - 1;
        let header = header_for(&body, signed_at);
        let err = verify_signature(&body, &header, SECRET, NOW).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid webhook signature: timestamp outside tolerance"
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let body = payload();
        let timestamp_only = format!("t={NOW}");
        for header in ["", "v1=abcd", timestamp_only.as_str(), "t=soon,v1=abcd"] {
            assert!(verify_signature(&body, header, SECRET, NOW).is_err(), "{header}");
        }
    }

    #[test]
    fn parse_event_extracts_order_id() {
        let body = payload();
        let header = header_for(&body, NOW);
        let event = parse_event(&body, &header, SECRET, NOW).unwrap();
        assert_eq!(event.event_type, EVENT_PAYMENT_SUCCEEDED);
        assert_eq!(event.data.object.id, "pi_123");
        assert_eq!(event.data.object.order_id(), Some(42));
    }

    #[test]
    fn hex_round_trip() {
        assert_eq!(hex::decode(&hex::encode([0u8, 15, 255])).unwrap(), vec![0, 15, 255]);
        assert!(hex::decode("abc").is_none());
        assert!(hex::decode("zz").is_none());
    }
}
