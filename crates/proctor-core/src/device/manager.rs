use crate::{
    CoreResult, ProctorError,
    device::{HardwareHandle, PreviewSink},
    media::{AcquisitionFailure, MediaConstraints, MediaDevices},
};

use std::{panic::Location, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Two-stage readiness of the acquired hardware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    /// The platform granted the stream.
    pub stream_acquired: bool,
    /// The preview decoded its first frame; capture may begin.
    pub preview_ready: bool,
}

/// Acquisition limits. A pending permission prompt must not hang the session.
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionTimeouts {
    /// Upper bound on waiting for the platform to grant the stream.
    pub grant: Duration,
    /// Upper bound on waiting for the first decoded preview frame.
    pub preview: Duration,
}

/// Sole owner of the hardware stream.
///
/// Acquisition is never retried automatically; callers invoke
/// [`DeviceManager::acquire`] again when the user asks to retry.
pub struct DeviceManager {
    media: Arc<dyn MediaDevices>,
    preview: Arc<PreviewSink>,
    handle: Option<HardwareHandle>,
    readiness: Readiness,
}

impl DeviceManager {
    /// Create a manager that feeds `preview` from streams granted by `media`.
    pub fn new(media: Arc<dyn MediaDevices>, preview: Arc<PreviewSink>) -> Self {
        Self {
            media,
            preview,
            handle: None,
            readiness: Readiness::default(),
        }
    }

    /// Acquire the combined audio+video stream and wait for the preview.
    ///
    /// Holding an already-ready handle returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns an acquisition error if access is refused, the request or the
    /// preview times out, or the stream has no camera feed. Any partially
    /// acquired hardware is released before returning.
    #[instrument(skip(self, constraints))]
    pub async fn acquire(
        &mut self,
        constraints: &MediaConstraints,
        timeouts: AcquisitionTimeouts,
    ) -> CoreResult<&HardwareHandle> {
        let location = Location::caller();

        if self.readiness.preview_ready && self.handle.is_some() {
            debug!("Hardware already acquired");
            return self.handle.as_ref().ok_or(ProctorError::NoStream {
                location: ErrorLocation::from(location),
            });
        }

        self.release();

        let granted = tokio::time::timeout(timeouts.grant, self.media.get_user_media(constraints))
            .await
            .map_err(|_| ProctorError::AcquisitionTimedOut {
                waited_ms: timeouts.grant.as_millis(),
                location: ErrorLocation::from(location),
            })?;

        let stream = granted.map_err(|failure| {
            warn!(%failure, "Media acquisition refused");
            acquisition_error(failure, location)
        })?;

        let handle = HardwareHandle::new(stream);
        self.readiness.stream_acquired = true;
        info!(stream_id = handle.stream_id(), "Stream acquired");

        let Some(feed) = handle.video_frames() else {
            self.readiness = Readiness::default();
            return Err(ProctorError::PreviewUnavailable {
                reason: "stream has no camera track".to_string(),
                location: ErrorLocation::from(location),
            });
        };

        self.preview.attach(feed);
        self.handle = Some(handle);

        let ready = tokio::time::timeout(timeouts.preview, self.preview.ready()).await;
        match ready {
            Ok(true) => {}
            Ok(false) => {
                self.release();
                return Err(ProctorError::PreviewUnavailable {
                    reason: "camera feed ended before the first frame".to_string(),
                    location: ErrorLocation::from(location),
                });
            }
            Err(_) => {
                self.release();
                return Err(ProctorError::PreviewUnavailable {
                    reason: format!(
                        "no frame decoded within {}ms",
                        timeouts.preview.as_millis()
                    ),
                    location: ErrorLocation::from(location),
                });
            }
        }

        self.readiness.preview_ready = true;
        if let Some(dimensions) = self.preview.decoded_dimensions() {
            info!(
                width = dimensions.width,
                height = dimensions.height,
                "Preview ready"
            );
        }

        self.handle.as_ref().ok_or(ProctorError::NoStream {
            location: ErrorLocation::from(location),
        })
    }

    /// Detach the preview and stop every device track. Safe to call repeatedly.
    #[instrument(skip(self))]
    pub fn release(&mut self) {
        self.preview.detach();
        if let Some(handle) = self.handle.take() {
            handle.release();
        }
        self.readiness = Readiness::default();
    }

    /// The held handle, if any.
    pub fn handle(&self) -> Option<&HardwareHandle> {
        self.handle.as_ref()
    }

    /// Current readiness signal.
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// The preview sink fed by this manager.
    pub fn preview(&self) -> &Arc<PreviewSink> {
        &self.preview
    }
}

impl Drop for DeviceManager {
    fn drop(&mut self) {
        self.release();
    }
}

fn acquisition_error(
    failure: AcquisitionFailure,
    location: &'static Location<'static>,
) -> ProctorError {
    let location = ErrorLocation::from(location);
    match failure {
        AcquisitionFailure::PermissionDenied => ProctorError::PermissionDenied { location },
        AcquisitionFailure::DeviceBusy => ProctorError::DeviceBusy { location },
        AcquisitionFailure::NotFound => ProctorError::NoDeviceFound { location },
        AcquisitionFailure::Other(reason) => ProctorError::DeviceError { reason, location },
    }
}
