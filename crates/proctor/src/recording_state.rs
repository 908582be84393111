use tokio::time::Instant;
use uuid::Uuid;

/// What the shell believes the controller is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// Not currently recording.
    Idle,
    /// Currently recording audio.
    Recording {
        /// When recording started.
        started_at: Instant,
        /// Session ID for log correlation and export paths.
        session_id: Uuid,
    },
}
