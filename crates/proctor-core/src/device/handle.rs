use crate::media::{AudioTrack, FrameFeed, MediaStream};

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::{debug, info};

/// Exclusive ownership of an acquired audio+video stream.
///
/// Releasing stops every device track exactly once; later calls are no-ops and
/// every accessor returns `None` afterwards. Dropping the handle releases it.
pub struct HardwareHandle {
    stream: Arc<dyn MediaStream>,
    released: AtomicBool,
}

impl HardwareHandle {
    pub(crate) fn new(stream: Arc<dyn MediaStream>) -> Self {
        Self {
            stream,
            released: AtomicBool::new(false),
        }
    }

    /// Backend identifier of the underlying stream.
    pub fn stream_id(&self) -> &str {
        self.stream.id()
    }

    /// Audio-only view of the shared stream. Does not re-open the microphone.
    pub fn audio_only(&self) -> Option<Arc<dyn AudioTrack>> {
        if self.is_released() {
            return None;
        }
        self.stream.audio_track()
    }

    /// Subscribe to decoded camera frames.
    pub fn video_frames(&self) -> Option<FrameFeed> {
        if self.is_released() {
            return None;
        }
        self.stream.video_frames()
    }

    /// Stop all device tracks. Returns `true` only for the call that released.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            debug!(stream_id = self.stream.id(), "Hardware handle already released");
            return false;
        }

        self.stream.stop();
        info!(stream_id = self.stream.id(), "Hardware released");
        true
    }

    /// Whether [`HardwareHandle::release`] has run.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Drop for HardwareHandle {
    fn drop(&mut self) {
        self.release();
    }
}
