//! Application configuration
//!
//! JSON config under the user config directory. A corrupt file falls back
//! to defaults after being backed up for inspection.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Alarm database location
    pub db_path: String,

    /// Snooze interval in minutes
    pub snooze_minutes: u32,

    /// Ringtone URI used for new alarms
    pub default_ringtone: String,

    // Meta
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: dirs::data_dir()
                .unwrap_or_default()
                .join("voxalarm/alarms.db")
                .to_string_lossy()
                .to_string(),
            snooze_minutes: 10,
            default_ringtone: "content://media/internal/audio/alarm".to_string(),
            log_level: "INFO".to_string(),
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let config_path = config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            match serde_json::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    tracing::warn!("config file corrupted or invalid, using defaults: {}", e);
                    // Keep the corrupt file around for debugging
                    let backup_path = config_path.with_extension("json.corrupt");
                    let _ = std::fs::rename(&config_path, &backup_path);
                    Ok(Self::default())
                }
            }
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let config_path = config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voxalarm")
        .join("config.json")
}
