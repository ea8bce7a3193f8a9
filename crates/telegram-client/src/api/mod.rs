//! Telegram Bot API REST client.
//!
//! Every method is a JSON POST to `{base}/bot{token}/{method}`. Transient
//! failures (transport errors, 429, 5xx) are retried a bounded number of
//! times with exponential backoff, honoring `retry_after` when present.

mod messages;
mod request;
mod updates;

pub mod models;

use std::time::Duration;

use url::Url;

use crate::BotError;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

const MAX_ATTEMPTS: u32 = 5;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const SEND_TIMEOUT: Duration = Duration::from_secs(15);
const ACK_TIMEOUT: Duration = Duration::from_secs(10);
/// Extra slack on top of the long-poll wait before the HTTP request times out.
const POLL_TIMEOUT_SLACK: Duration = Duration::from_secs(15);

/// Telegram Bot API client bound to one bot token.
#[derive(Clone)]
pub struct BotApiClient {
    pub(super) http: reqwest::Client,
    pub(super) endpoint: Url,
}

impl std::fmt::Debug for BotApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotApiClient")
            .field("host", &self.endpoint.host_str())
            .finish_non_exhaustive()
    }
}

/// Delay before retry number `attempt` (1-based): 0.5s, 1s, 2s, ...
pub fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY * 2u32.saturating_pow(attempt.saturating_sub(1))
}
