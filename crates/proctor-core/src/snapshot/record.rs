use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Upper bound on snapshots per session, however long it runs.
pub const MAX_SNAPSHOTS: usize = 2;

/// One identity-verification frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    /// Session the frame belongs to.
    pub session_id: Uuid,
    /// 1-based position in the verification set, in capture order.
    pub sequence: u8,
    /// Wall-clock capture time.
    pub captured_at: DateTime<Utc>,
    /// Time since the session started.
    pub session_offset: Duration,
    /// JPEG-encoded frame.
    pub image_blob: Arc<[u8]>,
}

impl SnapshotRecord {
    /// Encoding of [`SnapshotRecord::image_blob`].
    pub fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }

    /// Suggested export file name, e.g. `snapshot-1.jpg`.
    pub fn file_name(&self) -> String {
        format!("snapshot-{}.jpg", self.sequence)
    }
}
