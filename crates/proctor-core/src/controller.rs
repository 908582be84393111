//! The proctored recording session controller.
//!
//! One controller lives as long as the hosting view. It owns the device
//! manager, the current recording session, and the memory-backed artifact
//! URL, and funnels every exit path through [`ProctorController::teardown`].

use crate::{
    AudioArtifact, CoreResult, ErrorKind, ProctorError, SessionObserver,
    device::{DeviceManager, PreviewSink, Readiness},
    media::MediaDevices,
    recorder::{
        AudioEncoderFactory, BlobRegistry, FinishedRecording, RecordingSession, SessionState,
        StartRequest, WavEncoderFactory, format_elapsed,
    },
    settings::SessionSettings,
    snapshot::{DelayStrategy, SnapshotRecord, UniformDelay},
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Drives device acquisition, audio capture and snapshot scheduling.
///
/// # Example
///
/// ```no_run
/// use proctor_core::{
///     ProctorController, SessionEvent, SessionSettings, TestPatternConfig, TestPatternDevices,
/// };
///
/// use std::sync::Arc;
///
/// # async fn run() -> proctor_core::CoreResult<()> {
/// let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel::<SessionEvent>();
/// let devices = Arc::new(TestPatternDevices::new(TestPatternConfig::default()));
/// let mut controller =
///     ProctorController::new(devices, Arc::new(events_tx), SessionSettings::default());
///
/// controller.acquire().await?;
/// controller.start()?;
/// tokio::time::sleep(std::time::Duration::from_secs(10)).await;
/// let artifact = controller.stop();
/// controller.teardown();
/// # Ok(())
/// # }
/// ```
pub struct ProctorController {
    devices: DeviceManager,
    blobs: Arc<BlobRegistry>,
    encoders: Arc<dyn AudioEncoderFactory>,
    delays: Arc<dyn DelayStrategy>,
    observer: Arc<dyn SessionObserver>,
    settings: SessionSettings,
    session: RecordingSession,
    artifact: Option<AudioArtifact>,
}

impl ProctorController {
    /// Create a controller with WAV encoding and random snapshot delays.
    pub fn new(
        media: Arc<dyn MediaDevices>,
        observer: Arc<dyn SessionObserver>,
        settings: SessionSettings,
    ) -> Self {
        let preview = Arc::new(PreviewSink::new());

        Self {
            devices: DeviceManager::new(media, preview),
            blobs: Arc::new(BlobRegistry::new()),
            encoders: Arc::new(WavEncoderFactory),
            delays: Arc::new(UniformDelay::new()),
            session: RecordingSession::new(Arc::clone(&observer)),
            observer,
            settings,
            artifact: None,
        }
    }

    /// Replace the audio encoder factory.
    pub fn with_encoders(mut self, encoders: Arc<dyn AudioEncoderFactory>) -> Self {
        self.encoders = encoders;
        self
    }

    /// Replace the snapshot delay source.
    pub fn with_delay_strategy(mut self, delays: Arc<dyn DelayStrategy>) -> Self {
        self.delays = delays;
        self
    }

    /// Acquire camera and microphone and arm a fresh session.
    ///
    /// A stopped session is replaced (its snapshots are discarded); an armed
    /// one is kept. Failures are reported to the observer and returned; there
    /// is no automatic retry.
    ///
    /// # Errors
    ///
    /// `AlreadyRecording` while a session is capturing, otherwise any
    /// acquisition error from [`DeviceManager::acquire`].
    #[instrument(skip(self))]
    pub async fn acquire(&mut self) -> CoreResult<()> {
        match self.session.state() {
            SessionState::Recording => {
                let e = ProctorError::AlreadyRecording {
                    state: SessionState::Recording.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                };
                return Err(self.report(e));
            }
            SessionState::Stopped => {
                self.session.cancel();
                self.session = RecordingSession::new(Arc::clone(&self.observer));
            }
            SessionState::Idle | SessionState::Armed => {}
        }

        let constraints = self.settings.constraints;
        let timeouts = self.settings.timeouts;

        if let Err(e) = self.devices.acquire(&constraints, timeouts).await {
            return Err(self.report(e));
        }

        self.session.arm();
        info!(session_id = %self.session.id(), "Session armed");

        Ok(())
    }

    /// Start capturing audio and arm both snapshot timers.
    ///
    /// # Errors
    ///
    /// `NoStream` before hardware is acquired, `AlreadyRecording` unless the
    /// session is armed, `InvalidTimeslice` for a zero flush interval. Errors
    /// are also reported to the observer.
    pub fn start(&mut self) -> CoreResult<()> {
        let request = StartRequest {
            handle: self.devices.handle(),
            preview: self.devices.preview(),
            encoders: self.encoders.as_ref(),
            delays: self.delays.as_ref(),
            settings: &self.settings,
        };

        match self.session.start(request) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.report(e)),
        }
    }

    /// Stop the session: cancel timers, finalize audio, release hardware.
    ///
    /// The previous artifact URL is revoked before the new one is exposed.
    /// Calling this when not recording does nothing and returns `None`.
    #[instrument(skip(self))]
    pub fn stop(&mut self) -> Option<AudioArtifact> {
        if self.session.state() != SessionState::Recording {
            return None;
        }

        let finished = self.session.stop();
        self.devices.release();

        let finished = match finished {
            Ok(Some(finished)) => finished,
            Ok(None) => return None,
            Err(e) => {
                self.report(e);
                return None;
            }
        };

        if let Some(previous) = self.artifact.take() {
            self.blobs.revoke(&previous.url);
        }

        let artifact = self.expose(finished);
        self.observer.on_artifact_ready(&artifact);
        self.artifact = Some(artifact.clone());

        Some(artifact)
    }

    /// Release everything: timers, capture, hardware, then object URLs.
    ///
    /// Safe to call in any state and more than once. Called on drop.
    #[instrument(skip(self))]
    pub fn teardown(&mut self) {
        self.session.cancel();
        self.devices.release();

        let revoked = self.blobs.revoke_all();
        self.artifact = None;

        info!(
            session_id = %self.session.id(),
            revoked_urls = revoked,
            "Controller torn down"
        );
    }

    /// State of the current session.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Identifier of the current session.
    pub fn session_id(&self) -> Uuid {
        self.session.id()
    }

    /// Whole seconds recorded by the current session.
    pub fn elapsed_seconds(&self) -> u64 {
        self.session.elapsed_seconds()
    }

    /// `MM:SS` form of [`ProctorController::elapsed_seconds`].
    pub fn elapsed_label(&self) -> String {
        format_elapsed(self.elapsed_seconds())
    }

    /// The live artifact of the last completed session.
    pub fn artifact(&self) -> Option<&AudioArtifact> {
        self.artifact.as_ref()
    }

    /// Verification set of the current session, in capture order.
    pub fn snapshots(&self) -> Vec<SnapshotRecord> {
        self.session.snapshots()
    }

    /// Encoded audio buffered by the current session.
    pub fn buffered_audio_bytes(&self) -> usize {
        self.session.buffered_bytes()
    }

    /// Hardware readiness.
    pub fn readiness(&self) -> Readiness {
        self.devices.readiness()
    }

    /// Whether no hardware handle is held.
    pub fn hardware_released(&self) -> bool {
        self.devices.handle().is_none()
    }

    /// Timers still waiting to fire.
    pub fn armed_timer_count(&self) -> usize {
        self.session.armed_timer_count()
    }

    /// Preview sink showing the camera feed.
    pub fn preview(&self) -> &Arc<PreviewSink> {
        self.devices.preview()
    }

    /// Registry resolving artifact URLs to bytes.
    pub fn blobs(&self) -> &Arc<BlobRegistry> {
        &self.blobs
    }

    fn expose(&self, finished: FinishedRecording) -> AudioArtifact {
        let size_bytes = finished.bytes.len();
        let url = self
            .blobs
            .create_object_url(finished.bytes, &finished.mime_type);

        let artifact = AudioArtifact {
            session_id: self.session.id(),
            url,
            mime_type: finished.mime_type,
            size_bytes,
            elapsed_seconds: finished.elapsed_seconds,
            elapsed_label: format_elapsed(finished.elapsed_seconds),
        };

        info!(
            session_id = %artifact.session_id,
            url = %artifact.url,
            size = artifact.size_bytes,
            elapsed = %artifact.elapsed_label,
            "Artifact ready"
        );

        artifact
    }

    fn report(&self, e: ProctorError) -> ProctorError {
        let kind = e.kind();
        match kind {
            ErrorKind::Acquisition => warn!(error = %e, "Hardware acquisition failed"),
            ErrorKind::Start => warn!(error = %e, "Session could not start"),
            ErrorKind::Recorder => warn!(error = %e, "Recorder error"),
        }
        self.observer.on_error(kind, &e.to_string());
        e
    }
}

impl Drop for ProctorController {
    fn drop(&mut self) {
        self.teardown();
    }
}
