//! Configuration management for proctor.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, validation, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{DeviceConfig, OutputConfig, SessionConfig},
};

use proctor_core::{SessionSettings, SnapshotSettings};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Environment variable that overrides the config file location.
pub(crate) const CONFIG_PATH_ENV: &str = "PROCTOR_CONFIG";

/// Main configuration struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot timing, audio encoding and duration limit.
    #[serde(default)]
    pub session: SessionConfig,
    /// Camera and microphone request.
    #[serde(default)]
    pub devices: DeviceConfig,
    /// Export location.
    pub output: OutputConfig,
}

impl Config {
    /// Default configuration exporting into `export_dir`.
    pub fn with_export_dir(export_dir: PathBuf) -> Self {
        Self {
            session: SessionConfig::default(),
            devices: DeviceConfig::default(),
            output: OutputConfig {
                export_dir,
                write_snapshots: true,
            },
        }
    }

    /// Load configuration from disk, creating default if not found.
    ///
    /// `PROCTOR_CONFIG` overrides the platform config location.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config found, creating default");
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from an explicit file.
    #[track_caller]
    #[instrument]
    pub fn load_from(config_path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration loaded");

        Ok(config)
    }

    /// Check values the controller cannot work with.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn validate(&self) -> AppResult<()> {
        let session = &self.session;
        let first = session.first_window();
        let second = session.second_window();

        let problem = if first.min >= first.max {
            Some(format!(
                "first snapshot window is empty ({}s..{}s)",
                session.first_snapshot_min_secs, session.first_snapshot_max_secs
            ))
        } else if second.min >= second.max {
            Some(format!(
                "second snapshot window is empty ({}s..{}s)",
                session.second_snapshot_min_secs, session.second_snapshot_max_secs
            ))
        } else if first.max > second.min {
            Some("first snapshot window must end before the second begins".to_string())
        } else if !(1..=100).contains(&session.jpeg_quality) {
            Some(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                session.jpeg_quality
            ))
        } else if session.timeslice_ms == 0 {
            Some("timeslice_ms must be positive".to_string())
        } else if session.max_duration_secs == 0 {
            Some("max_duration_secs must be positive".to_string())
        } else if self.devices.grant_timeout_secs == 0 || self.devices.preview_timeout_secs == 0 {
            Some("device timeouts must be positive".to_string())
        } else if self.devices.frame_rate == 0 || self.devices.sample_rate == 0 {
            Some("frame_rate and sample_rate must be positive".to_string())
        } else {
            None
        };

        match problem {
            Some(reason) => Err(AppError::ConfigError {
                reason,
                location: ErrorLocation::from(Location::caller()),
            }),
            None => Ok(()),
        }
    }

    /// Controller settings derived from this configuration.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            constraints: self.devices.constraints(),
            timeouts: self.devices.timeouts(),
            mime_preferences: self.session.mime_preferences.clone(),
            timeslice: Duration::from_millis(self.session.timeslice_ms),
            snapshots: SnapshotSettings {
                first_window: self.session.first_window(),
                second_window: self.session.second_window(),
                jpeg_quality: self.session.jpeg_quality,
            },
        }
    }

    /// Longest a recording may run before it is stopped automatically.
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.session.max_duration_secs)
    }

    /// Save configuration to disk using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config_dir = config_path.parent().filter(|dir| !dir.as_os_str().is_empty());
        if let Some(config_dir) = config_dir {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir)?;
                debug!(config_dir = ?config_dir, "Created config directory");
            }
        }

        // Atomic write: write to temp file then rename
        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            debug!(config_path = ?path, "Config path overridden by {}", CONFIG_PATH_ENV);
            return Ok(PathBuf::from(path));
        }

        let proj_dirs = Self::project_dirs()?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "proctor", "Proctor").ok_or_else(|| AppError::ConfigError {
            reason: "Failed to get project directories".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    fn create_default(config_path: &Path) -> AppResult<Self> {
        let proj_dirs = Self::project_dirs()?;
        let export_dir = proj_dirs.data_dir().join("recordings");

        let config = Config::with_export_dir(export_dir.clone());
        config.save_to(config_path)?;

        info!(
            config_path = ?config_path,
            export_dir = ?export_dir,
            "Default config created"
        );

        Ok(config)
    }
}
