//! Telegram Bot API client library.
//!
//! Provides long-poll update retrieval, message sending with inline
//! keyboards, callback acknowledgement, and the channel data model
//! consumed by the relay agent.

pub mod api;
pub mod keyboard;
pub mod update;


use std::time::Duration;

pub use api::BotApiClient;
pub use keyboard::{Button, InlineKeyboard};
pub use update::{Update, UpdateKind};

/// Unified error type for the telegram-client crate.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Transport failure. The request URL is stripped because it embeds the bot token.
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Telegram API error (code {code}): {description}")]
    Api {
        code: u16,
        description: String,
        retry_after: Option<u64>,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl BotError {
    pub(crate) fn http(error: reqwest::Error) -> Self {
        Self::Http(error.without_url())
    }

    /// Whether the request may succeed if repeated unchanged.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { code, .. } => *code == 429 || (500..=599).contains(code),
            _ => false,
        }
    }

    /// Server-requested delay before the next attempt (flood control).
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Api {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// Escape user-supplied text for messages sent with the HTML parse mode.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
