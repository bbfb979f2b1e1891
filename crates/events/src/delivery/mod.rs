//! External delivery channels for customer notifications.
//!
//! Each client is built from its `*Config::from_env()`; a `None` config
//! means the channel is not configured and callers skip it. No client
//! retries: a failed call is returned to the caller, which logs it.

use std::time::Duration;

pub mod email;
pub mod push;
pub mod sms;

/// HTTP request timeout for a single provider call.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the shared HTTP client used by the JSON providers.
pub(crate) fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()
}
