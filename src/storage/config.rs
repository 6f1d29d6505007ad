//! Application configuration loading from TOML.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database file path; defaults to the platform data directory
    pub database_path: Option<PathBuf>,
    /// Location provider binary
    pub provider_binary: PathBuf,
    /// Per-attempt location poll timeout in seconds
    pub poll_timeout_secs: u64,
    /// Target telemetry cycle period in seconds
    pub cycle_period_secs: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            provider_binary: PathBuf::from(
                "/data/data/com.termux/files/usr/bin/termux-location",
            ),
            poll_timeout_secs: 5,
            cycle_period_secs: 1.0,
        }
    }
}

impl AppConfig {
    /// Load the config from the platform config directory, or defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_file() else {
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Loaded configuration");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Resolve the database path, falling back to the platform data dir.
    pub fn resolve_database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }

        directories::ProjectDirs::from("", "", "veloride")
            .map(|dirs| dirs.data_dir().join("cycling.db"))
            .unwrap_or_else(|| PathBuf::from("cycling.db"))
    }

    fn config_file() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "veloride")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
