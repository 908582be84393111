//! Callbacks the controller fires into the surrounding shell.

use crate::{AudioArtifact, ErrorKind, SnapshotRecord};

use tokio::sync::mpsc;

/// Receiver of session notifications.
///
/// Callbacks run on the runtime thread that drives the session and must not
/// block.
pub trait SessionObserver: Send + Sync {
    /// A session stopped and its audio was finalized. Fired once per session.
    fn on_artifact_ready(&self, artifact: &AudioArtifact);

    /// A verification snapshot was captured. Fired 0–2 times per session.
    fn on_snapshot_captured(&self, snapshot: &SnapshotRecord);

    /// Acquisition, start, or recorder runtime failure.
    fn on_error(&self, kind: ErrorKind, message: &str);

    /// Display tick while recording.
    fn on_elapsed(&self, _seconds: u64) {}
}

/// Owned form of every [`SessionObserver`] callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// See [`SessionObserver::on_artifact_ready`].
    ArtifactReady(AudioArtifact),
    /// See [`SessionObserver::on_snapshot_captured`].
    SnapshotCaptured(SnapshotRecord),
    /// See [`SessionObserver::on_error`].
    Error {
        /// Failure class.
        kind: ErrorKind,
        /// User-facing description.
        message: String,
    },
    /// See [`SessionObserver::on_elapsed`].
    Elapsed(u64),
}

// A closed receiver means the shell is gone; notifications are dropped.
impl SessionObserver for mpsc::UnboundedSender<SessionEvent> {
    fn on_artifact_ready(&self, artifact: &AudioArtifact) {
        let _ = self.send(SessionEvent::ArtifactReady(artifact.clone()));
    }

    fn on_snapshot_captured(&self, snapshot: &SnapshotRecord) {
        let _ = self.send(SessionEvent::SnapshotCaptured(snapshot.clone()));
    }

    fn on_error(&self, kind: ErrorKind, message: &str) {
        let _ = self.send(SessionEvent::Error {
            kind,
            message: message.to_string(),
        });
    }

    fn on_elapsed(&self, seconds: u64) {
        let _ = self.send(SessionEvent::Elapsed(seconds));
    }
}
