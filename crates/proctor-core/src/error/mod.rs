use std::fmt;

use error_location::ErrorLocation;
use thiserror::Error;

/// Coarse classification reported to [`SessionObserver::on_error`].
///
/// [`SessionObserver::on_error`]: crate::SessionObserver::on_error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Hardware could not be acquired; no session is reachable.
    Acquisition,
    /// A session could not be started (usage error, session-local).
    Start,
    /// The audio pipeline reported a problem while capturing. Non-fatal.
    Recorder,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Acquisition => "acquisition",
            ErrorKind::Start => "start",
            ErrorKind::Recorder => "recorder",
        };
        f.write_str(name)
    }
}

/// Session controller errors with source location tracking.
#[derive(Error, Debug)]
pub enum ProctorError {
    /// The user (or platform policy) refused camera/microphone access.
    #[error(
        "Camera and microphone access was denied. Allow access and retry to continue {location}"
    )]
    PermissionDenied {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Another application holds the camera or microphone.
    #[error(
        "Camera or microphone is in use by another application. Close it and retry {location}"
    )]
    DeviceBusy {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No camera or microphone is connected.
    #[error("No camera or microphone was found. Connect a device and retry {location}")]
    NoDeviceFound {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The permission prompt or device open never resolved.
    #[error("Timed out after {waited_ms}ms waiting for camera and microphone access {location}")]
    AcquisitionTimedOut {
        /// How long acquisition was awaited.
        waited_ms: u128,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The stream was granted but the preview never decoded a frame.
    #[error("Camera preview did not become ready: {reason} {location}")]
    PreviewUnavailable {
        /// Description of why the preview is unavailable.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Any other device failure reported by the media backend.
    #[error("Media device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// `start` was called without a hardware handle.
    #[error("Cannot start recording without an acquired camera and microphone stream {location}")]
    NoStream {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// `start` was called on a session that is not armed.
    #[error("Recording already started for this session (state: {state}) {location}")]
    AlreadyRecording {
        /// Session state observed when `start` was called.
        state: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The chunk flush interval must be non-zero.
    #[error("Audio timeslice must be greater than zero {location}")]
    InvalidTimeslice {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Timers could not be scheduled because no async runtime is running.
    #[error("No async runtime available to schedule session timers {location}")]
    RuntimeUnavailable {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio encoding or finalization failed.
    #[error("Audio encoder error: {reason} {location}")]
    EncoderError {
        /// Description of the encoder error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Frame rasterization or image encoding failed.
    #[error("Snapshot capture failed: {reason} {location}")]
    CaptureFailed {
        /// Description of the capture failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl ProctorError {
    /// Classify this error for observers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProctorError::PermissionDenied { .. }
            | ProctorError::DeviceBusy { .. }
            | ProctorError::NoDeviceFound { .. }
            | ProctorError::AcquisitionTimedOut { .. }
            | ProctorError::PreviewUnavailable { .. }
            | ProctorError::DeviceError { .. } => ErrorKind::Acquisition,
            ProctorError::NoStream { .. }
            | ProctorError::AlreadyRecording { .. }
            | ProctorError::InvalidTimeslice { .. }
            | ProctorError::RuntimeUnavailable { .. } => ErrorKind::Start,
            ProctorError::EncoderError { .. } | ProctorError::CaptureFailed { .. } => {
                ErrorKind::Recorder
            }
        }
    }
}

/// Result type alias using [`ProctorError`].
pub type Result<T> = std::result::Result<T, ProctorError>;
