use crate::recorder::{ObjectUrl, extension_for};

use std::time::Duration;

use uuid::Uuid;

/// Finalized audio of one completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    /// Session that produced the recording.
    pub session_id: Uuid,
    /// Live reference to the encoded bytes. Revoked when superseded.
    pub url: ObjectUrl,
    /// Container of the encoded bytes.
    pub mime_type: String,
    /// Encoded size in bytes.
    pub size_bytes: usize,
    /// Recording length, whole seconds.
    pub elapsed_seconds: u64,
    /// `MM:SS` label shown to the user and used in export names.
    pub elapsed_label: String,
}

impl AudioArtifact {
    /// Suggested export file name, e.g. `recording-01-35.wav`.
    pub fn file_name(&self) -> String {
        format!(
            "recording-{}.{}",
            self.elapsed_label.replace(':', "-"),
            extension_for(&self.mime_type)
        )
    }

    /// Recording length as a duration.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.elapsed_seconds)
    }
}

/// Format whole seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
