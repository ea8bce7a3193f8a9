use std::path::PathBuf;

use crate::config::{AppConfig, SettingsManager};

const SETTINGS_FILE: &str = "bot_config.json";

/// Foundation init: environment, data directory, settings, runtime config (fatal on error).
pub fn init_foundation() -> Result<(AppConfig, PathBuf), anyhow::Error> {
    load_dotenv();
    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;

    let settings_path = dir.join(SETTINGS_FILE);
    tracing::info!("Using settings file {}", settings_path.display());
    let sm = SettingsManager::new(settings_path);

    if let Err(e) = sm.migrate_from_env() {
        tracing::error!("Failed to migrate from env: {e}");
    }
    sm.initialize_defaults()?;

    if let Ok(status) = sm.check_feature_status() {
        if !status.missing_settings.is_empty() {
            tracing::warn!(
                "Missing settings: {:?}, warnings: {:?}",
                status.missing_settings,
                status.warnings
            );
        } else if !status.warnings.is_empty() {
            tracing::warn!("Settings warnings: {:?}", status.warnings);
        }
    }
    if let Ok(settings) = sm.get_all_settings() {
        for s in settings {
            tracing::debug!(key = %s.key, value = %s.value, "setting");
        }
    }

    let config = AppConfig::load(&sm, &dir)?;
    tracing::info!(
        device = %config.device_name,
        admin = %config.admin_chat_id,
        dry_run = config.power_dry_run,
        "Settings loaded"
    );
    Ok((config, dir))
}

/// Determine the data directory for the application.
fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DESK_RELAY_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".desk-relay")
}

/// Load .env from multiple candidate paths.
fn load_dotenv() {
    let candidates = [".env", "../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}
