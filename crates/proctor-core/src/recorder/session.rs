use crate::{
    CoreResult, ProctorError, SessionObserver,
    device::{HardwareHandle, PreviewSink},
    media::AudioTrack,
    recorder::{AudioEncoderFactory, ChunkEncoder, select_mime_type},
    settings::SessionSettings,
    snapshot::{DelayStrategy, MAX_SNAPSHOTS, SnapshotRecord, scheduler},
};

use std::{
    fmt,
    panic::Location,
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

use chrono::Utc;
use error_location::ErrorLocation;
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

/// Lifecycle of one session instance. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No hardware held.
    Idle,
    /// Hardware acquired and preview ready; capture not started.
    Armed,
    /// Capturing audio; snapshot timers armed.
    Recording,
    /// Finished. A new session needs a fresh instance.
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Armed => "armed",
            SessionState::Recording => "recording",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// State reachable from the session's timer tasks.
pub(crate) struct SessionShared {
    pub(crate) id: Uuid,
    pub(crate) observer: Arc<dyn SessionObserver>,
    state: Mutex<SessionState>,
    started_at: OnceLock<Instant>,
    snapshots: Mutex<Vec<SnapshotRecord>>,
}

impl SessionShared {
    fn new(observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            id: Uuid::new_v4(),
            observer,
            state: Mutex::new(SessionState::Idle),
            started_at: OnceLock::new(),
            snapshots: Mutex::new(Vec::with_capacity(MAX_SNAPSHOTS)),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: SessionState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        trace!(session_id = %self.id, from = %*state, to = %next, "Session state changed");
        *state = next;
    }

    /// Time since capture started, zero before.
    pub(crate) fn offset(&self) -> Duration {
        self.started_at
            .get()
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    /// Append a snapshot if the session is recording and the set is not full.
    ///
    /// The sequence number is the record's position in the set, so it follows
    /// the order in which timers actually fired.
    pub(crate) fn record_snapshot(&self, image_blob: Vec<u8>) -> Option<SnapshotRecord> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != SessionState::Recording {
            return None;
        }

        let mut snapshots = self.snapshots.lock().unwrap_or_else(|e| e.into_inner());
        if snapshots.len() >= MAX_SNAPSHOTS {
            return None;
        }

        let record = SnapshotRecord {
            session_id: self.id,
            sequence: snapshots.len() as u8 + 1,
            captured_at: Utc::now(),
            session_offset: self.offset(),
            image_blob: image_blob.into(),
        };
        snapshots.push(record.clone());

        Some(record)
    }

    fn snapshots(&self) -> Vec<SnapshotRecord> {
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Encoded audio of a stopped session, before it is exposed as an artifact.
pub(crate) struct FinishedRecording {
    pub(crate) bytes: Vec<u8>,
    pub(crate) mime_type: String,
    pub(crate) elapsed_seconds: u64,
}

/// Inputs to [`RecordingSession::start`].
pub(crate) struct StartRequest<'a> {
    pub(crate) handle: Option<&'a HardwareHandle>,
    pub(crate) preview: &'a Arc<PreviewSink>,
    pub(crate) encoders: &'a dyn AudioEncoderFactory,
    pub(crate) delays: &'a dyn DelayStrategy,
    pub(crate) settings: &'a SessionSettings,
}

/// Chunks are appended only by the session's own capture task.
struct ChunkBuffer {
    track: Arc<dyn AudioTrack>,
    encoder: Box<dyn ChunkEncoder>,
    chunks: Vec<Vec<u8>>,
}

impl ChunkBuffer {
    /// Move captured samples into a new chunk. Returns the chunk size.
    fn flush(&mut self) -> CoreResult<usize> {
        let samples = self.track.take_samples()?;
        if samples.is_empty() {
            return Ok(0);
        }

        let chunk = self.encoder.encode_chunk(&samples)?;
        let size = chunk.len();
        self.chunks.push(chunk);
        Ok(size)
    }

    fn buffered_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Assemble all chunks and clear the buffer.
    fn finalize(&mut self) -> CoreResult<Vec<u8>> {
        let chunks = std::mem::take(&mut self.chunks);
        self.encoder.finalize(&chunks)
    }
}

/// The elapsed-time ticker and both snapshot timers.
#[derive(Default)]
struct SessionTimers {
    elapsed: Option<JoinHandle<()>>,
    first_snapshot: Option<JoinHandle<()>>,
    second_snapshot: Option<JoinHandle<()>>,
}

impl SessionTimers {
    fn armed(&self) -> usize {
        [&self.elapsed, &self.first_snapshot, &self.second_snapshot]
            .into_iter()
            .filter(|timer| matches!(timer, Some(handle) if !handle.is_finished()))
            .count()
    }

    fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;
        for handle in [
            self.elapsed.take(),
            self.first_snapshot.take(),
            self.second_snapshot.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
            cancelled += 1;
        }
        cancelled
    }
}

impl Drop for SessionTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// One bounded recording attempt.
///
/// Owns the audio pipeline and all three timers. Every exit path goes through
/// [`RecordingSession::stop`] or [`RecordingSession::cancel`], and dropping the
/// session cancels as well.
pub(crate) struct RecordingSession {
    shared: Arc<SessionShared>,
    timers: SessionTimers,
    capture_task: Option<JoinHandle<()>>,
    buffer: Option<Arc<Mutex<ChunkBuffer>>>,
    stopped_after: Option<Duration>,
}

impl RecordingSession {
    pub(crate) fn new(observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            shared: Arc::new(SessionShared::new(observer)),
            timers: SessionTimers::default(),
            capture_task: None,
            buffer: None,
            stopped_after: None,
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.shared.id
    }

    pub(crate) fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// `Idle → Armed` once hardware and preview are ready.
    pub(crate) fn arm(&mut self) -> bool {
        if self.state() != SessionState::Idle {
            return false;
        }
        self.shared.set_state(SessionState::Armed);
        true
    }

    /// Begin audio capture, the elapsed ticker, and both snapshot timers.
    ///
    /// # Errors
    ///
    /// `NoStream` without a live handle, `AlreadyRecording` unless `Armed`,
    /// `InvalidTimeslice` for a zero flush interval, `RuntimeUnavailable`
    /// outside a tokio runtime, or an encoder error.
    #[track_caller]
    #[instrument(skip_all, fields(session_id = %self.shared.id))]
    pub(crate) fn start(&mut self, request: StartRequest<'_>) -> CoreResult<()> {
        let Some(handle) = request.handle else {
            return Err(ProctorError::NoStream {
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let state = self.state();
        if state != SessionState::Armed {
            return Err(ProctorError::AlreadyRecording {
                state: state.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let track = handle.audio_only().ok_or(ProctorError::NoStream {
            location: ErrorLocation::from(Location::caller()),
        })?;

        let settings = request.settings;
        if settings.timeslice.is_zero() {
            return Err(ProctorError::InvalidTimeslice {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        tokio::runtime::Handle::try_current().map_err(|_| ProctorError::RuntimeUnavailable {
            location: ErrorLocation::from(Location::caller()),
        })?;

        // Samples captured while armed belong to no recording.
        match track.take_samples() {
            Ok(stale) if !stale.is_empty() => {
                trace!(discarded = stale.len(), "Pre-roll samples discarded");
            }
            _ => {}
        }

        let preferred = select_mime_type(request.encoders, &settings.mime_preferences);
        let encoder = request.encoders.create(preferred, track.format())?;
        let mime_type = encoder.mime_type().to_string();

        let buffer = Arc::new(Mutex::new(ChunkBuffer {
            track,
            encoder,
            chunks: Vec::new(),
        }));

        if self.shared.started_at.set(Instant::now()).is_err() {
            warn!("Start time already recorded, keeping the first");
        }
        self.shared.set_state(SessionState::Recording);

        self.capture_task = Some(tokio::spawn(run_capture(
            Arc::clone(&buffer),
            Arc::clone(&self.shared),
            settings.timeslice,
        )));
        self.buffer = Some(buffer);

        self.timers.elapsed = Some(tokio::spawn(run_elapsed_ticker(Arc::clone(&self.shared))));

        let [first, second] = scheduler::arm(
            &self.shared,
            request.preview,
            request.delays,
            &settings.snapshots,
        );
        self.timers.first_snapshot = Some(first);
        self.timers.second_snapshot = Some(second);

        info!(
            stream_id = handle.stream_id(),
            mime_type = %mime_type,
            timeslice_ms = settings.timeslice.as_millis() as u64,
            "Recording started"
        );

        Ok(())
    }

    /// Finish capture and assemble the recording.
    ///
    /// A no-op returning `Ok(None)` unless the session is recording.
    ///
    /// # Errors
    ///
    /// Returns an encoder error if the chunks cannot be assembled. The session
    /// is `Stopped` either way.
    #[instrument(skip_all, fields(session_id = %self.shared.id))]
    pub(crate) fn stop(&mut self) -> CoreResult<Option<FinishedRecording>> {
        if self.state() != SessionState::Recording {
            debug!(state = %self.state(), "Stop ignored");
            return Ok(None);
        }

        let cancelled = self.timers.cancel_all();
        if let Some(task) = self.capture_task.take() {
            task.abort();
        }

        let elapsed = self.shared.offset();
        self.stopped_after = Some(elapsed);
        self.shared.set_state(SessionState::Stopped);

        let Some(buffer) = self.buffer.take() else {
            return Ok(None);
        };
        let mut buffer = buffer.lock().unwrap_or_else(|e| e.into_inner());

        // Samples captured since the last periodic flush.
        if let Err(e) = buffer.flush() {
            warn!(error = %e, "Final audio flush failed");
            self.shared.observer.on_error(e.kind(), &e.to_string());
        }

        let chunk_count = buffer.chunks.len();
        let mime_type = buffer.encoder.mime_type().to_string();
        let bytes = buffer.finalize()?;

        info!(
            cancelled_timers = cancelled,
            chunk_count,
            size = bytes.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Recording stopped"
        );

        Ok(Some(FinishedRecording {
            bytes,
            mime_type,
            elapsed_seconds: elapsed.as_secs(),
        }))
    }

    /// Teardown path: cancel timers, abandon capture, discard buffered audio.
    pub(crate) fn cancel(&mut self) {
        let cancelled = self.timers.cancel_all();
        if let Some(task) = self.capture_task.take() {
            task.abort();
        }

        let discarded = self
            .buffer
            .take()
            .map(|buffer| {
                buffer
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .buffered_bytes()
            })
            .unwrap_or_default();

        match self.state() {
            SessionState::Idle | SessionState::Stopped => {}
            SessionState::Armed => self.shared.set_state(SessionState::Stopped),
            SessionState::Recording => {
                self.stopped_after = Some(self.shared.offset());
                self.shared.set_state(SessionState::Stopped);
            }
        }

        if cancelled > 0 || discarded > 0 {
            debug!(
                session_id = %self.shared.id,
                cancelled_timers = cancelled,
                discarded_bytes = discarded,
                "Session cancelled"
            );
        }
    }

    /// Whole seconds recorded so far, frozen once stopped.
    pub(crate) fn elapsed_seconds(&self) -> u64 {
        self.stopped_after
            .unwrap_or_else(|| self.shared.offset())
            .as_secs()
    }

    pub(crate) fn snapshots(&self) -> Vec<SnapshotRecord> {
        self.shared.snapshots()
    }

    /// Encoded audio flushed so far and not yet finalized.
    pub(crate) fn buffered_bytes(&self) -> usize {
        self.buffer
            .as_ref()
            .map(|buffer| {
                buffer
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .buffered_bytes()
            })
            .unwrap_or_default()
    }

    pub(crate) fn armed_timer_count(&self) -> usize {
        self.timers.armed()
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_capture(
    buffer: Arc<Mutex<ChunkBuffer>>,
    shared: Arc<SessionShared>,
    timeslice: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + timeslice, timeslice);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let flushed = buffer.lock().unwrap_or_else(|e| e.into_inner()).flush();
        match flushed {
            Ok(0) => {}
            Ok(size) => trace!(session_id = %shared.id, size, "Audio chunk buffered"),
            Err(e) => {
                // Capture keeps running; the user decides whether to stop.
                warn!(session_id = %shared.id, error = %e, "Audio capture error");
                shared.observer.on_error(e.kind(), &e.to_string());
            }
        }
    }
}

async fn run_elapsed_ticker(shared: Arc<SessionShared>) {
    let period = Duration::from_secs(1);
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        shared.observer.on_elapsed(shared.offset().as_secs());
    }
}
