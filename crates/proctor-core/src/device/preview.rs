//! Muted local preview of the camera feed.
//!
//! The preview is the only surface that decodes frames. Snapshot capture reads
//! the frame it currently shows, so a detached preview (view unmounted) means
//! there is nothing to capture.

use crate::media::{FrameFeed, VideoFrame};

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use image::{RgbImage, imageops};
use tracing::debug;

/// Decoded frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Preview sink attached to the live stream.
#[derive(Default)]
pub struct PreviewSink {
    feed: Mutex<Option<FrameFeed>>,
    muted: AtomicBool,
}

impl PreviewSink {
    /// Create a detached sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a frame feed. The preview never plays audio back.
    pub fn attach(&self, feed: FrameFeed) {
        self.muted.store(true, Ordering::Release);
        *self.feed.lock().unwrap_or_else(|e| e.into_inner()) = Some(feed);
        debug!("Preview attached");
    }

    /// Drop the frame feed, as when the hosting view goes away.
    pub fn detach(&self) {
        if self
            .feed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some()
        {
            debug!("Preview detached");
        }
    }

    /// Whether a feed is attached.
    pub fn is_attached(&self) -> bool {
        self.feed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Whether audio playback is suppressed.
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    /// Wait until the first frame has been decoded.
    ///
    /// Returns `false` if the sink is detached or the stream ends first.
    pub async fn ready(&self) -> bool {
        let feed = self
            .feed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        match feed {
            Some(mut feed) => feed.wait_for(|frame| frame.is_some()).await.is_ok(),
            None => false,
        }
    }

    /// Size of the currently decoded frame, if any.
    pub fn decoded_dimensions(&self) -> Option<FrameDimensions> {
        self.current_frame().map(|frame| FrameDimensions {
            width: frame.width(),
            height: frame.height(),
        })
    }

    /// Render the current frame onto a fresh off-screen surface of the same size.
    pub fn rasterize(&self) -> Option<RgbImage> {
        let frame = self.current_frame()?;
        let mut surface = RgbImage::new(frame.width(), frame.height());
        imageops::replace(&mut surface, frame.as_ref(), 0, 0);
        Some(surface)
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        let guard = self.feed.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref()?.borrow().clone()
    }
}
