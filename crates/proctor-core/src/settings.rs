use crate::{
    device::AcquisitionTimeouts, media::MediaConstraints, recorder::DEFAULT_MIME_PREFERENCES,
    snapshot::DelayWindow,
};

use std::time::Duration;

/// Default JPEG quality for verification snapshots.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Default chunk flush interval.
pub const DEFAULT_TIMESLICE: Duration = Duration::from_secs(1);

/// Snapshot timing and encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSettings {
    /// Window of the first timer.
    pub first_window: DelayWindow,
    /// Window of the second timer.
    pub second_window: DelayWindow,
    /// JPEG quality, 1–100.
    pub jpeg_quality: u8,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            first_window: DelayWindow::FIRST_SNAPSHOT,
            second_window: DelayWindow::SECOND_SNAPSHOT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Everything the controller needs to run a session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Hardware request.
    pub constraints: MediaConstraints,
    /// Acquisition bounds.
    pub timeouts: AcquisitionTimeouts,
    /// Audio containers in order of preference.
    pub mime_preferences: Vec<String>,
    /// How often buffered audio is flushed into a chunk.
    pub timeslice: Duration,
    /// Verification snapshot behaviour.
    pub snapshots: SnapshotSettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            constraints: MediaConstraints::default(),
            timeouts: AcquisitionTimeouts {
                grant: Duration::from_secs(30),
                preview: Duration::from_secs(10),
            },
            mime_preferences: DEFAULT_MIME_PREFERENCES
                .iter()
                .map(|mime_type| mime_type.to_string())
                .collect(),
            timeslice: DEFAULT_TIMESLICE,
            snapshots: SnapshotSettings::default(),
        }
    }
}
