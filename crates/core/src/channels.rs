//! Well-known notification channel name constants.
//!
//! Used in log fields and delivery reports so every channel is named the
//! same way across the dispatcher, the admin broadcast endpoint and the
//! newsletter sender.

/// Transactional email delivered through Resend.
pub const CHANNEL_EMAIL: &str = "email";

/// Transactional SMS delivered through Brevo.
pub const CHANNEL_SMS: &str = "sms";

/// Browser notification delivered through Web Push.
pub const CHANNEL_PUSH: &str = "push";
