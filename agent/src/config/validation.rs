//! Setting value validation.

use regex::Regex;
use std::sync::LazyLock;

static RE_BOT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+:[A-Za-z0-9_-]{20,}$").unwrap());
static RE_CHAT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());
static RE_HTTP_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://\S+$").unwrap());

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
///
/// Empty values pass for every key; whether a key is required is checked separately.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }
    match key {
        "BOT_TOKEN" => {
            if !RE_BOT_TOKEN.is_match(value) {
                return Err("invalid bot token format (expected <id>:<secret>)".into());
            }
        }
        "CHAT_ID" => {
            if !RE_CHAT_ID.is_match(value) {
                return Err("must be a numeric chat id".into());
            }
        }
        "COMPUTER_NAME" => {
            if value.len() > 64 || value.chars().any(char::is_whitespace) {
                return Err("must be 1-64 characters without whitespace".into());
            }
        }
        "API_BASE_URL" => {
            if !RE_HTTP_URL.is_match(value) {
                return Err("must be an http(s) URL".into());
            }
        }
        "POLL_TIMEOUT_SECS" => validate_int_range(value, 1, 50)?,
        "POLL_BACKOFF_MAX_SECS" => validate_int_range(value, 1, 3600)?,
        "TICK_INTERVAL_MS" => validate_int_range(value, 10, 1000)?,
        "NOTIFICATION_LIFETIME_MS" => validate_int_range(value, 500, 600_000)?,
        "NOTIFICATION_ANIMATION_MS" => validate_int_range(value, 0, 10_000)?,
        "POWER_GRACE_SECS" => validate_int_range(value, 0, 3600)?,
        k if is_boolean_setting(k) => {
            if value != "true" && value != "false" {
                return Err("must be 'true' or 'false'".into());
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i64, max: i64) -> Result<(), String> {
    let v: i64 = value.parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}

fn is_boolean_setting(key: &str) -> bool {
    matches!(key, "POWER_DRY_RUN")
}
