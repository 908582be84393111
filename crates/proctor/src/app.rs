use crate::{AppCommand, AppResult, ExportWriter, RecordingState};

use proctor_core::{ProctorController, SessionEvent, SessionState, format_elapsed};

use std::time::Duration;

use tokio::{
    sync::{mpsc, watch},
    time::Instant,
};
use tracing::{debug, error, info, instrument, warn};

/// Main application state.
///
/// Owns the session controller for the lifetime of the process. Every exit
/// from [`App::run`] goes through the controller's teardown.
pub struct App {
    pub(crate) controller: ProctorController,
    pub(crate) exports: ExportWriter,
    pub(crate) write_snapshots: bool,
    pub(crate) max_duration: Duration,
    pub(crate) state: RecordingState,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Proctor starting");

        // Mount: acquire hardware straight away so the preview is live.
        self.acquire().await;

        loop {
            let deadline = match self.state {
                RecordingState::Recording { started_at, .. } => {
                    Some(started_at + self.max_duration)
                }
                RecordingState::Idle => None,
            };

            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AppCommand::StartRecording => self.start_recording(),
                        AppCommand::StopRecording => self.stop_recording(),
                        AppCommand::Retry => self.acquire().await,
                        AppCommand::Shutdown => {
                            info!("Shutdown requested");
                            break;
                        }
                    }
                }

                Some(event) = self.events_rx.recv() => {
                    self.handle_event(event);
                }

                _ = wait_until(deadline) => {
                    warn!(
                        max_duration_secs = self.max_duration.as_secs(),
                        "Maximum recording duration reached, stopping"
                    );
                    self.stop_recording();
                }

                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => info!("Interrupted, shutting down"),
                        Err(e) => error!(error = ?e, "Failed to listen for Ctrl-C"),
                    }
                    break;
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        // Snapshots already captured are still worth keeping.
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }

        self.controller.teardown();
        let _ = self.shutdown_tx.send(true);
        info!("Proctor shut down successfully");

        Ok(())
    }

    /// Acquire camera and microphone for a fresh session.
    #[instrument(skip(self))]
    async fn acquire(&mut self) {
        if let RecordingState::Recording { session_id, .. } = self.state {
            warn!(session_id = %session_id, "Stop the current recording before retrying");
            return;
        }

        match self.controller.acquire().await {
            Ok(()) => info!(
                session_id = %self.controller.session_id(),
                "Camera and microphone ready. Type 'start' to record"
            ),
            Err(e) => warn!(error = %e, "Type 'retry' once the problem is fixed"),
        }
    }

    /// Start recording the armed session.
    #[instrument(skip(self))]
    fn start_recording(&mut self) {
        if self.controller.state() == SessionState::Stopped {
            info!("Session already recorded. Type 'retry' to begin a new one");
            return;
        }

        if let Err(e) = self.controller.start() {
            error!(error = %e, "Failed to start recording");
            return;
        }

        let session_id = self.controller.session_id();
        self.state = RecordingState::Recording {
            started_at: Instant::now(),
            session_id,
        };

        info!(session_id = %session_id, "Recording started. Type 'stop' to finish");
    }

    /// Stop recording and export the audio.
    #[instrument(skip(self))]
    fn stop_recording(&mut self) {
        let RecordingState::Recording { session_id, .. } = self.state else {
            debug!("Not recording, stop ignored");
            return;
        };
        self.state = RecordingState::Idle;

        let Some(artifact) = self.controller.stop() else {
            warn!(session_id = %session_id, "Recording produced no audio");
            return;
        };

        let Some(bytes) = self.controller.blobs().resolve(&artifact.url) else {
            error!(session_id = %session_id, url = %artifact.url, "Artifact URL no longer live");
            return;
        };

        match self.exports.write_artifact(&artifact, &bytes) {
            Ok(path) => info!(
                session_id = %session_id,
                path = ?path,
                elapsed = %artifact.elapsed_label,
                snapshots = self.controller.snapshots().len(),
                "Session complete. Type 'retry' to record again"
            ),
            Err(e) => error!(session_id = %session_id, error = ?e, "Failed to export recording"),
        }
    }

    fn handle_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::SnapshotCaptured(snapshot) => {
                if !self.write_snapshots {
                    return;
                }
                if let Err(e) = self.exports.write_snapshot(&snapshot) {
                    error!(
                        session_id = %snapshot.session_id,
                        sequence = snapshot.sequence,
                        error = ?e,
                        "Failed to export snapshot"
                    );
                }
            }
            SessionEvent::ArtifactReady(artifact) => {
                debug!(url = %artifact.url, size = artifact.size_bytes, "Artifact ready");
            }
            SessionEvent::Error { kind, message } => {
                warn!(%kind, "{}", message);
            }
            SessionEvent::Elapsed(seconds) => {
                if seconds % 10 == 0 {
                    info!(elapsed = %format_elapsed(seconds), "Recording");
                }
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
