//! All setting definitions with their default values.

use std::collections::BTreeMap;
use std::sync::LazyLock;

type DefTuple = (&'static str, &'static str, bool, bool, &'static str);

const DEFS: &[DefTuple] = &[
    ("BOT_TOKEN", "", true, true, "Telegram bot token from @BotFather"),
    ("CHAT_ID", "", false, true, "Chat id of the admin allowed to run device commands"),
    ("COMPUTER_NAME", "", false, false, "Device name used as command target (defaults to host name)"),
    ("API_BASE_URL", "https://api.telegram.org", false, false, "Bot API base URL"),
    ("POLL_TIMEOUT_SECS", "30", false, false, "Long-poll wait per getUpdates request"),
    ("POLL_BACKOFF_MAX_SECS", "30", false, false, "Upper bound of the poll failure backoff"),
    ("TICK_INTERVAL_MS", "100", false, false, "Cooperative loop tick interval"),
    ("NOTIFICATION_LIFETIME_MS", "5000", false, false, "Time a notification stays on screen"),
    ("NOTIFICATION_ANIMATION_MS", "4000", false, false, "Duration of the progress animation"),
    ("POWER_GRACE_SECS", "5", false, false, "Delay before a shutdown or restart is executed"),
    ("POWER_DRY_RUN", "false", false, false, "Log power actions instead of executing them"),
    ("SUBSCRIBERS_FILE", "subscribers.json", false, false, "Subscriber list, relative to the data directory"),
];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub secret: bool,
    pub required: bool,
    pub description: &'static str,
}

/// Setting definitions indexed by key, in key order.
pub static DEFAULT_SETTINGS: LazyLock<BTreeMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, secret, required, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    secret,
                    required,
                    description,
                },
            )
        })
        .collect()
});

/// Get the default value for a setting key, or `None` if not defined.
pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}
