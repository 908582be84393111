//! Writes finished recordings and verification snapshots to disk.
//!
//! Each session gets its own directory under the export root, named after the
//! session ID. Files are written to a temporary name and renamed into place so
//! a crash never leaves a truncated recording behind.

use crate::{AppError, AppResult};

use proctor_core::{AudioArtifact, SnapshotRecord};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Export sink for session output.
pub struct ExportWriter {
    root: PathBuf,
}

impl ExportWriter {
    /// Create a writer rooted at `root`, creating the directory if needed.
    #[track_caller]
    #[instrument]
    pub fn new(root: PathBuf) -> AppResult<Self> {
        fs::create_dir_all(&root).map_err(|e| AppError::ExportFailed {
            reason: format!("Failed to create export directory {:?}: {}", root, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(root = ?root, "ExportWriter initialized");

        Ok(Self { root })
    }

    /// Directory holding every file of one session.
    pub fn session_dir(&self, session_id: Uuid) -> PathBuf {
        self.root.join(session_id.to_string())
    }

    /// Write the finalized audio as `recording-MM-SS.<ext>`.
    #[track_caller]
    #[instrument(skip(self, artifact, bytes), fields(session_id = %artifact.session_id))]
    pub fn write_artifact(&self, artifact: &AudioArtifact, bytes: &[u8]) -> AppResult<PathBuf> {
        let path = self.write_atomic(
            &self.session_dir(artifact.session_id),
            &artifact.file_name(),
            bytes,
        )?;

        info!(
            path = ?path,
            size = bytes.len(),
            elapsed = %artifact.elapsed_label,
            "Recording exported"
        );

        Ok(path)
    }

    /// Write a verification frame as `snapshot-<sequence>.jpg`.
    #[track_caller]
    #[instrument(skip(self, snapshot), fields(session_id = %snapshot.session_id))]
    pub fn write_snapshot(&self, snapshot: &SnapshotRecord) -> AppResult<PathBuf> {
        let path = self.write_atomic(
            &self.session_dir(snapshot.session_id),
            &snapshot.file_name(),
            &snapshot.image_blob,
        )?;

        info!(
            path = ?path,
            sequence = snapshot.sequence,
            captured_at = %snapshot.captured_at.to_rfc3339(),
            "Snapshot exported"
        );

        Ok(path)
    }

    #[track_caller]
    fn write_atomic(&self, dir: &Path, file_name: &str, bytes: &[u8]) -> AppResult<PathBuf> {
        let location = Location::caller();
        let export_error = |action: &str, e: std::io::Error| AppError::ExportFailed {
            reason: format!("Failed to {} {}: {}", action, file_name, e),
            location: ErrorLocation::from(location),
        };

        fs::create_dir_all(dir).map_err(|e| export_error("create directory for", e))?;

        let final_path = dir.join(file_name);
        let temp_path = dir.join(format!("{}.tmp", file_name));

        let mut temp_file =
            fs::File::create(&temp_path).map_err(|e| export_error("create temp file for", e))?;
        temp_file
            .write_all(bytes)
            .map_err(|e| export_error("write", e))?;
        temp_file
            .sync_all()
            .map_err(|e| export_error("sync", e))?;

        fs::rename(&temp_path, &final_path).map_err(|e| export_error("rename", e))?;

        debug!(path = ?final_path, size = bytes.len(), "File written (atomic)");

        Ok(final_path)
    }
}
