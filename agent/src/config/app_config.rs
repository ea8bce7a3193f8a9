//! Runtime configuration loaded from the settings file + environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::manager::SettingsManager;
use super::validation::validate_setting;

/// Runtime configuration for the agent.
#[derive(Clone)]
pub struct AppConfig {
    pub bot_token: String,
    /// Chat id of the admin, compared against update sender ids.
    pub admin_chat_id: String,
    /// Device name matched (case-insensitively) against command targets.
    pub device_name: String,
    pub api_base_url: String,
    pub poll_timeout_secs: u64,
    pub poll_backoff_max: Duration,
    pub tick_interval: Duration,
    pub notification_lifetime: Duration,
    pub notification_animation: Duration,
    pub power_grace: Duration,
    pub power_dry_run: bool,
    pub subscribers_file: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bot_token", &"<redacted>")
            .field("admin_chat_id", &self.admin_chat_id)
            .field("device_name", &self.device_name)
            .field("api_base_url", &self.api_base_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("poll_backoff_max", &self.poll_backoff_max)
            .field("tick_interval", &self.tick_interval)
            .field("notification_lifetime", &self.notification_lifetime)
            .field("notification_animation", &self.notification_animation)
            .field("power_grace", &self.power_grace)
            .field("power_dry_run", &self.power_dry_run)
            .field("subscribers_file", &self.subscribers_file)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the settings manager; environment variables win over the file.
    ///
    /// Missing or malformed required values are fatal.
    pub fn load(sm: &SettingsManager, data_dir: &Path) -> Result<Self, anyhow::Error> {
        let g = |key: &str| -> Result<String, anyhow::Error> {
            let value = match std::env::var(key) {
                Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
                _ => sm.get_setting(key)?.trim().to_string(),
            };
            validate_setting(key, &value).map_err(|e| anyhow::anyhow!("invalid {key}: {e}"))?;
            Ok(value)
        };

        let bot_token = g("BOT_TOKEN")?;
        if bot_token.is_empty() {
            anyhow::bail!(
                "BOT_TOKEN is not configured (set it in {} or the environment)",
                sm.path().display()
            );
        }
        let admin_chat_id = g("CHAT_ID")?;
        if admin_chat_id.is_empty() {
            anyhow::bail!(
                "CHAT_ID is not configured (set it in {} or the environment)",
                sm.path().display()
            );
        }

        let device_name = {
            let name = g("COMPUTER_NAME")?;
            if name.is_empty() {
                crate::system_info::host_name()
            } else {
                name
            }
        };

        let api_base_url = {
            let url = g("API_BASE_URL")?;
            if url.is_empty() {
                telegram_client::api::DEFAULT_API_BASE.to_string()
            } else {
                url
            }
        };

        let subscribers_file = {
            let file = g("SUBSCRIBERS_FILE")?;
            let file = if file.is_empty() {
                PathBuf::from("subscribers.json")
            } else {
                PathBuf::from(file)
            };
            if file.is_absolute() {
                file
            } else {
                data_dir.join(file)
            }
        };

        Ok(Self {
            bot_token,
            admin_chat_id,
            device_name,
            api_base_url,
            poll_timeout_secs: parse_u64(&g("POLL_TIMEOUT_SECS")?, 30),
            poll_backoff_max: Duration::from_secs(parse_u64(&g("POLL_BACKOFF_MAX_SECS")?, 30)),
            tick_interval: Duration::from_millis(parse_u64(&g("TICK_INTERVAL_MS")?, 100)),
            notification_lifetime: Duration::from_millis(parse_u64(
                &g("NOTIFICATION_LIFETIME_MS")?,
                5000,
            )),
            notification_animation: Duration::from_millis(parse_u64(
                &g("NOTIFICATION_ANIMATION_MS")?,
                4000,
            )),
            power_grace: Duration::from_secs(parse_u64(&g("POWER_GRACE_SECS")?, 5)),
            power_dry_run: g("POWER_DRY_RUN")? == "true",
            subscribers_file,
        })
    }
}

fn parse_u64(s: &str, default: u64) -> u64 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_settings(dir: &Path, body: &str) -> SettingsManager {
        let path = dir.join("bot_config.json");
        std::fs::write(&path, body).unwrap();
        SettingsManager::new(path)
    }

    #[test]
    fn loads_file_values_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let sm = write_settings(
            dir.path(),
            r#"{"bot_token":"123456:ABCDEFGHIJKLMNOPQRSTUVWX","chat_id":"42","computer_name":"office"}"#,
        );
        let config = AppConfig::load(&sm, dir.path()).unwrap();
        assert_eq!(config.admin_chat_id, "42");
        assert_eq!(config.device_name, "office");
        assert_eq!(config.tick_interval, Duration::from_millis(100));
        assert_eq!(config.notification_lifetime, Duration::from_secs(5));
        assert_eq!(config.subscribers_file, dir.path().join("subscribers.json"));
        assert!(!format!("{config:?}").contains("ABCDEFGH"));
    }

    #[test]
    fn invalid_value_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let sm = write_settings(
            dir.path(),
            r#"{"bot_token":"123456:ABCDEFGHIJKLMNOPQRSTUVWX","chat_id":"42","tick_interval_ms":"1"}"#,
        );
        assert!(AppConfig::load(&sm, dir.path()).is_err());
    }

    #[test]
    fn falls_back_to_host_name() {
        let dir = tempfile::tempdir().unwrap();
        let sm = write_settings(
            dir.path(),
            r#"{"bot_token":"123456:ABCDEFGHIJKLMNOPQRSTUVWX","chat_id":"42"}"#,
        );
        if std::env::var("COMPUTER_NAME").is_ok() {
            return;
        }
        let config = AppConfig::load(&sm, dir.path()).unwrap();
        assert!(!config.device_name.is_empty());
    }
}
