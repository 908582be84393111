//! Randomized identity-verification captures.
//!
//! Two one-shot timers are armed per session, each with its own delay and its
//! own task, so cancelling one never touches the other. A firing timer pulls
//! whatever frame the preview currently shows. Missing frames and encoder
//! failures are logged and skipped: the verification set is advisory.

use crate::{
    CoreResult, ProctorError,
    device::PreviewSink,
    recorder::SessionShared,
    settings::SnapshotSettings,
    snapshot::{DelayStrategy, SnapshotRecord, SnapshotSlot},
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use image::{RgbImage, codecs::jpeg::JpegEncoder};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Arm both snapshot timers. The caller owns and must cancel the handles.
pub(crate) fn arm(
    shared: &Arc<SessionShared>,
    preview: &Arc<PreviewSink>,
    delays: &dyn DelayStrategy,
    settings: &SnapshotSettings,
) -> [JoinHandle<()>; 2] {
    [
        (SnapshotSlot::First, settings.first_window),
        (SnapshotSlot::Second, settings.second_window),
    ]
    .map(|(slot, window)| {
        let delay = delays.draw_delay(slot, window);
        debug!(
            session_id = %shared.id,
            ?slot,
            delay_ms = delay.as_millis() as u64,
            "Snapshot timer armed"
        );

        let shared = Arc::clone(shared);
        let preview = Arc::clone(preview);
        let quality = settings.jpeg_quality;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            capture_snapshot(&shared, &preview, quality);
        })
    })
}

/// Capture the preview's current frame into the session's verification set.
///
/// Returns `None` without raising when there is no frame, encoding fails, the
/// session is no longer recording, or the set is full.
pub(crate) fn capture_snapshot(
    shared: &SessionShared,
    preview: &PreviewSink,
    quality: u8,
) -> Option<SnapshotRecord> {
    let Some(surface) = preview.rasterize() else {
        debug!(session_id = %shared.id, "No decoded frame, snapshot skipped");
        return None;
    };

    let image_blob = match encode_jpeg(&surface, quality) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(session_id = %shared.id, error = %e, "Snapshot skipped");
            return None;
        }
    };

    let Some(record) = shared.record_snapshot(image_blob) else {
        debug!(session_id = %shared.id, "Session not accepting snapshots");
        return None;
    };

    info!(
        session_id = %record.session_id,
        sequence = record.sequence,
        size = record.image_blob.len(),
        offset_ms = record.session_offset.as_millis() as u64,
        "Snapshot captured"
    );

    shared.observer.on_snapshot_captured(&record);
    Some(record)
}

/// JPEG-encode a rasterized frame. `quality` is clamped to 1–100.
#[track_caller]
pub fn encode_jpeg(surface: &RgbImage, quality: u8) -> CoreResult<Vec<u8>> {
    let mut bytes = Vec::new();

    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .encode_image(surface)
        .map_err(|e| ProctorError::CaptureFailed {
            reason: format!("JPEG encoding failed: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(bytes)
}
