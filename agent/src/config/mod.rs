//! Configuration management: defaults, validation, loading from the settings file + environment.

pub mod app_config;
pub mod defaults;
pub mod manager;
pub mod validation;

pub use app_config::AppConfig;
pub use manager::SettingsManager;

use serde::Serialize;

/// A setting as reported in the startup summary. Secret values are masked.
#[derive(Debug, Clone, Serialize)]
pub struct SettingInfo {
    pub key: String,
    pub value: String,
    pub secret: bool,
    pub required: bool,
    pub description: String,
    pub has_value: bool,
}

/// Which required settings are present.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureStatus {
    pub bot_configured: bool,
    pub missing_settings: Vec<String>,
    pub warnings: Vec<String>,
}
