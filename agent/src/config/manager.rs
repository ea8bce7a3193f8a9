//! SettingsManager: file-backed settings with defaults, migration, and feature status.
//!
//! The settings file is a flat JSON object with lower-case keys, e.g.
//! `{"bot_token": "...", "chat_id": "123", "computer_name": "office"}`.
//! Numbers and booleans are accepted and read back as their string form.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::defaults::DEFAULT_SETTINGS;
use super::validation::validate_setting;
use super::{FeatureStatus, SettingInfo};

const SECRET_MASK: &str = "********";

/// Settings stored in a JSON file, keyed by the upper-case setting name.
pub struct SettingsManager {
    path: PathBuf,
}

impl SettingsManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a setting value. Falls back to default if not in the file.
    pub fn get_setting(&self, key: &str) -> Result<String, anyhow::Error> {
        if let Some(val) = self.read()?.remove(key) {
            return Ok(val);
        }
        if let Some(def) = DEFAULT_SETTINGS.get(key) {
            return Ok(def.default.to_string());
        }
        anyhow::bail!("setting not found: {key}");
    }

    /// All known settings with defaults filled in; secrets are masked.
    pub fn get_all_settings(&self) -> Result<Vec<SettingInfo>, anyhow::Error> {
        let values = self.read()?;
        Ok(DEFAULT_SETTINGS
            .values()
            .map(|def| {
                let value = values
                    .get(def.key)
                    .cloned()
                    .unwrap_or_else(|| def.default.to_string());
                let has_value = !value.is_empty();
                SettingInfo {
                    key: def.key.to_string(),
                    value: if def.secret && has_value {
                        SECRET_MASK.to_string()
                    } else {
                        value
                    },
                    secret: def.secret,
                    required: def.required,
                    description: def.description.to_string(),
                    has_value,
                }
            })
            .collect())
    }

    /// Write every known key that is missing from the file with its default,
    /// so the file doubles as a template for the operator.
    pub fn initialize_defaults(&self) -> Result<(), anyhow::Error> {
        let mut values = self.read()?;
        let mut added = 0u32;
        for (key, def) in DEFAULT_SETTINGS.iter() {
            if values.contains_key(*key) {
                continue;
            }
            values.insert(key.to_string(), def.default.to_string());
            added += 1;
        }
        if added > 0 {
            self.write(&values)?;
            tracing::info!(added, path = %self.path.display(), "Settings file initialized with defaults");
        }
        Ok(())
    }

    /// Copy settings from environment variables into the file (one-time).
    ///
    /// Keys already holding a non-empty value are left alone.
    pub fn migrate_from_env(&self) -> Result<u32, anyhow::Error> {
        let mut values = self.read()?;
        let mut migrated = 0u32;
        for key in DEFAULT_SETTINGS.keys() {
            if values.get(*key).is_some_and(|v| !v.is_empty()) {
                continue;
            }
            if let Ok(env_val) = std::env::var(key) {
                if env_val.is_empty() {
                    continue;
                }
                if let Err(e) = validate_setting(key, &env_val) {
                    tracing::warn!("Not migrating {key} from env: {e}");
                    continue;
                }
                values.insert(key.to_string(), env_val);
                tracing::info!("Migrated setting from env: {key}");
                migrated += 1;
            }
        }
        if migrated > 0 {
            self.write(&values)?;
            tracing::info!("Migration completed: {migrated} settings migrated");
            if has_secret_in_env() {
                tracing::warn!(
                    "SECURITY WARNING: Bot token in env vars. \
                     Remove it from .env after confirming migration."
                );
            }
        }
        Ok(migrated)
    }

    /// Check which required settings are missing.
    pub fn check_feature_status(&self) -> Result<FeatureStatus, anyhow::Error> {
        let mut status = FeatureStatus {
            bot_configured: true,
            ..Default::default()
        };

        for def in DEFAULT_SETTINGS.values().filter(|d| d.required) {
            let val = self.get_setting(def.key).unwrap_or_default();
            let env_set = std::env::var(def.key).is_ok_and(|v| !v.is_empty());
            if val.is_empty() && !env_set {
                status.missing_settings.push(def.key.to_string());
                status.bot_configured = false;
            }
        }

        if self.get_setting("POWER_DRY_RUN").unwrap_or_default() == "true" {
            status
                .warnings
                .push("POWER_DRY_RUN is enabled - shutdown and restart are only logged".into());
        }

        Ok(status)
    }

    fn read(&self) -> Result<BTreeMap<String, String>, anyhow::Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", self.path.display()))?;

        Ok(object
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    serde_json::Value::Null => return None,
                    other => {
                        tracing::warn!("Ignoring non-scalar setting {key}: {other}");
                        return None;
                    }
                };
                Some((key.to_ascii_uppercase(), value))
            })
            .collect())
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<(), anyhow::Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let object: BTreeMap<String, &String> = values
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        let body = serde_json::to_string_pretty(&object)?;
        fs::write(&self.path, body).with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

fn has_secret_in_env() -> bool {
    DEFAULT_SETTINGS
        .values()
        .filter(|d| d.secret)
        .any(|d| std::env::var(d.key).is_ok_and(|v| !v.is_empty()))
}
