//! Collaborator traits for the platform media layer.
//!
//! The controller never talks to hardware directly. A shell provides a
//! [`MediaDevices`] implementation that grants a combined audio+video
//! [`MediaStream`]; everything else is derived from that stream.

use crate::CoreResult;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use image::RgbImage;
use tokio::sync::watch;

/// Latest decoded video frame, shared between the preview and snapshot capture.
pub type VideoFrame = Arc<RgbImage>;

/// Receiver side of a stream's decoded-frame feed. `None` until the first frame.
pub type FrameFeed = watch::Receiver<Option<VideoFrame>>;

/// Which camera to prefer when several are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// Front-facing (selfie) camera.
    User,
    /// Rear-facing camera.
    Environment,
}

/// Audio processing requested from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConstraints {
    /// Request acoustic echo cancellation.
    pub echo_cancellation: bool,
    /// Request noise suppression.
    pub noise_suppression: bool,
    /// Request automatic gain control.
    pub auto_gain_control: bool,
}

/// Video geometry requested from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    /// Preferred camera.
    pub facing_mode: FacingMode,
    /// Ideal frame width in pixels. The platform may pick another size.
    pub ideal_width: u32,
    /// Ideal frame height in pixels.
    pub ideal_height: u32,
}

/// Combined constraints passed to [`MediaDevices::get_user_media`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    /// Microphone constraints.
    pub audio: AudioConstraints,
    /// Camera constraints.
    pub video: VideoConstraints,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: AudioConstraints {
                echo_cancellation: true,
                noise_suppression: true,
                auto_gain_control: true,
            },
            video: VideoConstraints {
                facing_mode: FacingMode::User,
                ideal_width: 1280,
                ideal_height: 720,
            },
        }
    }
}

/// PCM layout produced by an [`AudioTrack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Samples per second.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

/// Why the platform refused to grant a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionFailure {
    /// The user or policy denied access.
    PermissionDenied,
    /// The device is held by someone else.
    DeviceBusy,
    /// No matching device exists.
    NotFound,
    /// Anything else the backend wants to report.
    Other(String),
}

impl fmt::Display for AcquisitionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionFailure::PermissionDenied => f.write_str("permission denied"),
            AcquisitionFailure::DeviceBusy => f.write_str("device busy"),
            AcquisitionFailure::NotFound => f.write_str("no device found"),
            AcquisitionFailure::Other(reason) => f.write_str(reason),
        }
    }
}

/// Permission/acquisition entry point of the platform media layer.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Request a live audio+video stream. May wait on a user permission prompt.
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Arc<dyn MediaStream>, AcquisitionFailure>;
}

/// A granted, live audio+video stream.
pub trait MediaStream: Send + Sync {
    /// Backend identifier, used for logging.
    fn id(&self) -> &str;

    /// The microphone track. Shared; reading it does not re-open the device.
    fn audio_track(&self) -> Option<Arc<dyn AudioTrack>>;

    /// Subscribe to decoded camera frames.
    fn video_frames(&self) -> Option<FrameFeed>;

    /// Stop every track. Must be idempotent.
    fn stop(&self);

    /// Whether any track is still running.
    fn is_live(&self) -> bool;
}

/// Microphone track of a [`MediaStream`].
pub trait AudioTrack: Send + Sync {
    /// PCM layout of the samples returned by [`AudioTrack::take_samples`].
    fn format(&self) -> AudioFormat;

    /// Drain every sample captured since the previous call.
    ///
    /// Errors are runtime capture problems; the caller keeps recording.
    fn take_samples(&self) -> CoreResult<Vec<i16>>;
}
