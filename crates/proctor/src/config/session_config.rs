use crate::config::{default_jpeg_quality, default_max_duration_secs, default_timeslice_ms};

use proctor_core::{DEFAULT_MIME_PREFERENCES, DelayWindow};

use serde::{Deserialize, Serialize};

/// Recording session behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Earliest first snapshot, seconds after start.
    #[serde(default = "default_first_min")]
    pub first_snapshot_min_secs: u64,
    /// Exclusive upper bound of the first snapshot.
    #[serde(default = "default_first_max")]
    pub first_snapshot_max_secs: u64,
    /// Earliest second snapshot, seconds after start.
    #[serde(default = "default_second_min")]
    pub second_snapshot_min_secs: u64,
    /// Exclusive upper bound of the second snapshot.
    #[serde(default = "default_second_max")]
    pub second_snapshot_max_secs: u64,
    /// JPEG quality for snapshots, 1–100.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Audio chunk flush interval in milliseconds.
    #[serde(default = "default_timeslice_ms")]
    pub timeslice_ms: u64,
    /// Audio containers in order of preference.
    #[serde(default = "default_mime_preferences")]
    pub mime_preferences: Vec<String>,
    /// Recordings are stopped automatically after this many seconds.
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
}

impl SessionConfig {
    /// Window of the first snapshot timer.
    pub fn first_window(&self) -> DelayWindow {
        DelayWindow::from_secs(self.first_snapshot_min_secs, self.first_snapshot_max_secs)
    }

    /// Window of the second snapshot timer.
    pub fn second_window(&self) -> DelayWindow {
        DelayWindow::from_secs(self.second_snapshot_min_secs, self.second_snapshot_max_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            first_snapshot_min_secs: default_first_min(),
            first_snapshot_max_secs: default_first_max(),
            second_snapshot_min_secs: default_second_min(),
            second_snapshot_max_secs: default_second_max(),
            jpeg_quality: default_jpeg_quality(),
            timeslice_ms: default_timeslice_ms(),
            mime_preferences: default_mime_preferences(),
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

fn default_first_min() -> u64 {
    DelayWindow::FIRST_SNAPSHOT.min.as_secs()
}

fn default_first_max() -> u64 {
    DelayWindow::FIRST_SNAPSHOT.max.as_secs()
}

fn default_second_min() -> u64 {
    DelayWindow::SECOND_SNAPSHOT.min.as_secs()
}

fn default_second_max() -> u64 {
    DelayWindow::SECOND_SNAPSHOT.max.as_secs()
}

fn default_mime_preferences() -> Vec<String> {
    DEFAULT_MIME_PREFERENCES
        .iter()
        .map(|mime_type| mime_type.to_string())
        .collect()
}
