//! Proctor Core Library
//!
//! Proctored recording session controller: acquires camera and microphone,
//! records an audio answer, and captures two identity-verification snapshots
//! at randomized times, releasing every device, timer and object URL on every
//! exit path.
//!
//! # Example
//!
//! ```no_run
//! use proctor_core::{
//!     CoreResult, ProctorController, SessionEvent, SessionSettings, TestPatternConfig,
//!     TestPatternDevices,
//! };
//!
//! use std::{sync::Arc, time::Duration};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> CoreResult<()> {
//!     let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel::<SessionEvent>();
//!     let devices = Arc::new(TestPatternDevices::new(TestPatternConfig::default()));
//!     let mut controller =
//!         ProctorController::new(devices, Arc::new(events_tx), SessionSettings::default());
//!
//!     controller.acquire().await?;
//!     controller.start()?;
//!     tokio::time::sleep(Duration::from_secs(95)).await;
//!
//!     if let Some(artifact) = controller.stop() {
//!         println!("Recorded {} ({})", artifact.elapsed_label, artifact.url);
//!     }
//!
//!     while let Ok(event) = events_rx.try_recv() {
//!         if let SessionEvent::SnapshotCaptured(snapshot) = event {
//!             println!("Snapshot {} at {:?}", snapshot.sequence, snapshot.session_offset);
//!         }
//!     }
//!
//!     controller.teardown();
//!     Ok(())
//! }
//! ```

mod controller;
mod device;
mod error;
mod media;
mod observer;
mod recorder;
mod settings;
mod snapshot;

pub use {
    controller::ProctorController,
    device::{
        AcquisitionTimeouts, DeviceManager, FrameDimensions, HardwareHandle, PreviewSink,
        Readiness,
    },
    error::{ErrorKind, ProctorError, Result as CoreResult},
    media::{
        AcquisitionFailure, AudioConstraints, AudioFormat, AudioTrack, FacingMode, FrameFeed,
        MediaConstraints, MediaDevices, MediaStream, TestPatternConfig, TestPatternDevices,
        TestPatternStream, VideoConstraints, VideoFrame,
    },
    observer::{SessionEvent, SessionObserver},
    recorder::{
        AudioArtifact, AudioEncoderFactory, BlobRegistry, ChunkEncoder, DEFAULT_MIME_PREFERENCES,
        ObjectUrl, SessionState, WavEncoderFactory, extension_for, format_elapsed,
        select_mime_type,
    },
    settings::{DEFAULT_JPEG_QUALITY, DEFAULT_TIMESLICE, SessionSettings, SnapshotSettings},
    snapshot::{
        DelayStrategy, DelayWindow, FixedDelay, MAX_SNAPSHOTS, SnapshotRecord, SnapshotSlot,
        UniformDelay, draw_delay, encode_jpeg,
    },
};

#[cfg(test)]
mod tests;
