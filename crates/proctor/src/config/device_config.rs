use crate::config::{default_grant_timeout_secs, default_preview_timeout_secs, default_true};

use proctor_core::{
    AcquisitionTimeouts, AudioConstraints, FacingMode, MediaConstraints, TestPatternConfig,
    VideoConstraints,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Preferred camera, as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    /// Front-facing camera.
    #[default]
    User,
    /// Rear-facing camera.
    Environment,
}

impl From<CameraFacing> for FacingMode {
    fn from(facing: CameraFacing) -> Self {
        match facing {
            CameraFacing::User => FacingMode::User,
            CameraFacing::Environment => FacingMode::Environment,
        }
    }
}

/// Camera/microphone request and the synthetic backend's geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Preferred camera.
    #[serde(default)]
    pub facing: CameraFacing,
    /// Ideal capture width in pixels.
    #[serde(default = "default_ideal_width")]
    pub ideal_width: u32,
    /// Ideal capture height in pixels.
    #[serde(default = "default_ideal_height")]
    pub ideal_height: u32,
    /// Request echo cancellation.
    #[serde(default = "default_true")]
    pub echo_cancellation: bool,
    /// Request noise suppression.
    #[serde(default = "default_true")]
    pub noise_suppression: bool,
    /// Request automatic gain control.
    #[serde(default = "default_true")]
    pub auto_gain_control: bool,
    /// Seconds to wait for the permission prompt.
    #[serde(default = "default_grant_timeout_secs")]
    pub grant_timeout_secs: u64,
    /// Seconds to wait for the first preview frame.
    #[serde(default = "default_preview_timeout_secs")]
    pub preview_timeout_secs: u64,
    /// Test pattern frame rate.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    /// Test pattern audio sample rate.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Test pattern tone frequency in Hz.
    #[serde(default = "default_tone_hz")]
    pub tone_hz: f32,
}

impl DeviceConfig {
    /// Constraints passed to the media backend.
    pub fn constraints(&self) -> MediaConstraints {
        MediaConstraints {
            audio: AudioConstraints {
                echo_cancellation: self.echo_cancellation,
                noise_suppression: self.noise_suppression,
                auto_gain_control: self.auto_gain_control,
            },
            video: VideoConstraints {
                facing_mode: self.facing.into(),
                ideal_width: self.ideal_width,
                ideal_height: self.ideal_height,
            },
        }
    }

    /// Acquisition bounds.
    pub fn timeouts(&self) -> AcquisitionTimeouts {
        AcquisitionTimeouts {
            grant: Duration::from_secs(self.grant_timeout_secs),
            preview: Duration::from_secs(self.preview_timeout_secs),
        }
    }

    /// Geometry of the synthetic camera and microphone.
    pub fn test_pattern(&self) -> TestPatternConfig {
        TestPatternConfig {
            width: self.ideal_width,
            height: self.ideal_height,
            frame_rate: self.frame_rate,
            sample_rate: self.sample_rate,
            tone_hz: self.tone_hz,
            ..TestPatternConfig::default()
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            facing: CameraFacing::default(),
            ideal_width: default_ideal_width(),
            ideal_height: default_ideal_height(),
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
            grant_timeout_secs: default_grant_timeout_secs(),
            preview_timeout_secs: default_preview_timeout_secs(),
            frame_rate: default_frame_rate(),
            sample_rate: default_sample_rate(),
            tone_hz: default_tone_hz(),
        }
    }
}

fn default_ideal_width() -> u32 {
    MediaConstraints::default().video.ideal_width
}

fn default_ideal_height() -> u32 {
    MediaConstraints::default().video.ideal_height
}

fn default_frame_rate() -> u32 {
    TestPatternConfig::default().frame_rate
}

fn default_sample_rate() -> u32 {
    TestPatternConfig::default().sample_rate
}

fn default_tone_hz() -> f32 {
    TestPatternConfig::default().tone_hz
}
